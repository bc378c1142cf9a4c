use crate::error::PatternError;
use crate::params::Value;
use crate::pattern::CompiledPattern;

use http::Method;
use log::debug;
use std::collections::HashMap;

/// The identity of a route handler: a controller type identifier plus a
/// method name. The routing core never invokes the handler, it only hands
/// the identity (with bound parameters) to an external invoker.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Target {
    pub controller: String,
    pub method: String,
}

impl Target {
    pub fn new(controller: impl Into<String>, method: impl Into<String>) -> Target {
        Target {
            controller: controller.into(),
            method: method.into(),
        }
    }
}

/// A single declared route parameter: a name and an optional default.
#[derive(Clone, Debug, PartialEq)]
pub struct DeclaredParam {
    pub name: String,
    pub default: Option<Value>,
}

/// The ordered parameter declaration of a route.
///
/// Order is positional: the first declared parameter binds the first path
/// segment after the route's prefix, and so on. A parameter without a
/// default is required; one with a default may be omitted from links and
/// requests.
///
/// ```rust
/// use signpost::DeclaredParams;
///
/// let params = DeclaredParams::new().required("id").with_default("page", 1);
/// assert_eq!(params.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeclaredParams(Vec<DeclaredParam>);

impl DeclaredParams {
    pub fn new() -> DeclaredParams {
        DeclaredParams(Vec::new())
    }

    /// Appends a required parameter (no default value).
    pub fn required(mut self, name: impl Into<String>) -> DeclaredParams {
        self.0.push(DeclaredParam {
            name: name.into(),
            default: None,
        });
        self
    }

    /// Appends an optional parameter with a default value.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> DeclaredParams {
        self.0.push(DeclaredParam {
            name: name.into(),
            default: Some(value.into()),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DeclaredParam> {
        self.0.iter()
    }
}

/// A registered route.
///
/// Created once at registration time and replaced wholesale if the same
/// alias is registered again. The fields are public in the spirit of a
/// plain record; mutate them before registering, not after.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteEntry {
    /// The unique name of the route, used for reverse-URL generation.
    pub alias: String,
    /// The handler identity.
    pub target: Target,
    /// The HTTP methods this route accepts.
    pub methods: Vec<Method>,
    /// The URL pattern. May carry a `?key=value` suffix declaring required
    /// query parameters.
    pub pattern: String,
    /// The ordered parameter declaration.
    pub params: DeclaredParams,
    /// Whether links to this route use the https scheme.
    pub https: bool,
    /// Opaque policy tags evaluated by an external collaborator.
    pub preconditions: Vec<String>,
}

impl RouteEntry {
    pub fn new(
        alias: impl Into<String>,
        methods: &[Method],
        pattern: impl Into<String>,
        target: Target,
    ) -> RouteEntry {
        RouteEntry {
            alias: alias.into(),
            target,
            methods: methods.to_vec(),
            pattern: pattern.into(),
            params: DeclaredParams::new(),
            https: true,
            preconditions: Vec::new(),
        }
    }
}

/// One compiled matcher of a route: a single `"METHOD path"` key with its
/// compiled pattern and any declared query constraints. A route accepting
/// several methods compiles into one of these per method.
#[derive(Clone, Debug)]
pub struct CompiledRoute {
    key: String,
    method: Method,
    compiled: CompiledPattern,
    query: Vec<(String, String)>,
    alias: String,
    // ranking weight: the full registration key length, query suffix
    // included, so a constrained route outranks its plain twin
    priority: usize,
}

impl CompiledRoute {
    /// The full match key, e.g. `GET /test[/:id]`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The HTTP method this key was compiled for.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The compiled pattern.
    pub fn compiled(&self) -> &CompiledPattern {
        &self.compiled
    }

    /// Query parameters the request must carry, with exact values.
    pub fn query_constraints(&self) -> &[(String, String)] {
        &self.query
    }

    /// The alias of the route this key belongs to.
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// A listener invoked once per compiled key whenever a route is registered.
pub type RouteListener = Box<dyn FnMut(&CompiledRoute, &RouteEntry)>;

/// An ordered collection of compiled routes.
///
/// Three indexes are kept consistent for every registration: by alias, by
/// handler target, and by URL prefix (the first path segment) plus HTTP
/// method. Registering an alias a second time replaces the earlier route
/// everywhere; nothing stale remains reachable.
///
/// The compiled list is ordered by descending registration-key length
/// (query suffix included), so that longer and therefore typically more
/// specific patterns are tested first during matching.
#[derive(Default)]
pub struct RouteTable {
    entries: HashMap<String, RouteEntry>,
    compiled: Vec<CompiledRoute>,
    by_target: HashMap<Target, String>,
    by_prefix: HashMap<String, HashMap<Method, String>>,
    listeners: Vec<RouteListener>,
}

impl RouteTable {
    pub fn new() -> RouteTable {
        RouteTable::default()
    }

    /// Registers a route, replacing any earlier route with the same alias.
    pub fn register(&mut self, entry: RouteEntry) -> Result<(), PatternError> {
        let (path, constraints) = split_constraints(&entry.pattern);
        let suffix_len = entry.pattern.len().saturating_sub(path.len());
        let path = normalize_path(&path)?;

        let mut compiled = Vec::with_capacity(entry.methods.len());
        for method in &entry.methods {
            let key = format!("{} {}", method, path);
            let pattern = CompiledPattern::compile(&key)?;
            let priority = key.len() + suffix_len;
            compiled.push(CompiledRoute {
                key,
                method: method.clone(),
                compiled: pattern,
                query: constraints.clone(),
                alias: entry.alias.clone(),
                priority,
            });
        }

        self.unregister(&entry.alias);

        let prefix = url_prefix(&entry.pattern);
        self.by_target
            .insert(entry.target.clone(), entry.alias.clone());
        for method in &entry.methods {
            self.by_prefix
                .entry(prefix.clone())
                .or_default()
                .insert(method.clone(), entry.alias.clone());
        }

        for route in &compiled {
            for listener in &mut self.listeners {
                listener(route, &entry);
            }
        }

        debug!("registered route '{}' for {}", entry.alias, path);
        self.entries.insert(entry.alias.clone(), entry);
        self.compiled.extend(compiled);
        self.compiled.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(())
    }

    /// Removes a route from every index. Returns the removed entry, if any.
    pub fn unregister(&mut self, alias: &str) -> Option<RouteEntry> {
        let entry = self.entries.remove(alias)?;
        self.compiled.retain(|route| route.alias != alias);
        self.by_target.remove(&entry.target);

        let prefix = url_prefix(&entry.pattern);
        if let Some(methods) = self.by_prefix.get_mut(&prefix) {
            methods.retain(|_, a| a.as_str() != alias);
            if methods.is_empty() {
                self.by_prefix.remove(&prefix);
            }
        }
        Some(entry)
    }

    /// Looks up a route by its alias.
    pub fn find_by_alias(&self, alias: &str) -> Option<&RouteEntry> {
        self.entries.get(alias)
    }

    /// Looks up a route by its handler identity.
    pub fn find_by_target(&self, controller: &str, method: &str) -> Option<&RouteEntry> {
        let alias = self
            .by_target
            .get(&Target::new(controller, method))?;
        self.entries.get(alias)
    }

    /// Looks up a route by URL prefix and HTTP method. The prefix is an
    /// exact first-path-segment key, not a pattern.
    pub fn find_by_prefix(&self, prefix: &str, method: &Method) -> Option<&RouteEntry> {
        let alias = self.by_prefix.get(prefix)?.get(method)?;
        self.entries.get(alias)
    }

    /// The HTTP methods registered under a URL prefix, sorted by name.
    pub fn methods_for_prefix(&self, prefix: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = match self.by_prefix.get(prefix) {
            Some(by_method) => by_method.keys().cloned().collect(),
            None => Vec::new(),
        };
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// The HTTP methods whose compiled patterns accept the given path.
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed = Vec::new();
        for route in &self.compiled {
            if allowed.contains(&route.method) {
                continue;
            }
            let probe = format!("{} {}", route.method, path);
            if route.compiled.is_match(&probe) {
                allowed.push(route.method.clone());
            }
        }
        allowed
    }

    /// The registered routes in matcher priority order.
    pub fn entries(&self) -> Vec<&RouteEntry> {
        let mut seen: Vec<&str> = Vec::new();
        let mut entries = Vec::new();
        for route in &self.compiled {
            if seen.contains(&route.alias.as_str()) {
                continue;
            }
            seen.push(&route.alias);
            if let Some(entry) = self.entries.get(&route.alias) {
                entries.push(entry);
            }
        }
        entries
    }

    /// The compiled match keys in priority order (longest first).
    pub fn compiled(&self) -> &[CompiledRoute] {
        &self.compiled
    }

    /// Registers a listener for route registrations. The listener is
    /// replayed over the already-registered routes, then called for every
    /// later registration, once per compiled key.
    pub fn add_listener(&mut self, mut listener: RouteListener) {
        for route in &self.compiled {
            if let Some(entry) = self.entries.get(&route.alias) {
                listener(route, entry);
            }
        }
        self.listeners.push(listener);
    }
}

/// Splits a `?key=value` suffix off a registration pattern.
fn split_constraints(pattern: &str) -> (String, Vec<(String, String)>) {
    match pattern.split_once('?') {
        Some((path, query)) => {
            let constraints = url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            (path.to_string(), constraints)
        }
        None => (pattern.to_string(), Vec::new()),
    }
}

/// Normalizes a pattern path to a single leading slash.
fn normalize_path(path: &str) -> Result<String, PatternError> {
    let trimmed = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(PatternError::Empty);
    }
    Ok(format!("/{}", trimmed))
}

/// The first path segment of a pattern, used as a coarse routing key.
pub(crate) fn url_prefix(pattern: &str) -> String {
    let path = match pattern.split_once('?') {
        Some((path, _)) => path,
        None => pattern,
    };
    path.trim_matches('/')
        .chars()
        .take_while(|&c| c != '/' && c != '[' && c != ':')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_extraction() {
        assert_eq!(url_prefix("test"), "test");
        assert_eq!(url_prefix("/test[/:id]"), "test");
        assert_eq!(url_prefix("/a/:x/:y"), "a");
        assert_eq!(url_prefix("/feed?format=rss"), "feed");
        assert_eq!(url_prefix("/"), "");
    }

    #[test]
    fn reregistration_replaces_all_indexes() {
        let mut table = RouteTable::new();
        let mut entry = RouteEntry::new(
            "pages",
            &[Method::GET],
            "/pages/:id",
            Target::new("PagesController", "show"),
        );
        table.register(entry.clone()).unwrap();

        entry.pattern = "/articles/:id".to_string();
        entry.target = Target::new("ArticlesController", "show");
        table.register(entry).unwrap();

        assert!(table.find_by_prefix("pages", &Method::GET).is_none());
        assert!(table.find_by_target("PagesController", "show").is_none());
        assert!(table.find_by_prefix("articles", &Method::GET).is_some());
        assert_eq!(table.compiled().len(), 1);
    }

    #[test]
    fn listener_replays_existing_routes() {
        let mut table = RouteTable::new();
        table
            .register(RouteEntry::new(
                "a",
                &[Method::GET],
                "/a",
                Target::new("C", "a"),
            ))
            .unwrap();

        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        table.add_listener(Box::new(move |route, _| {
            sink.borrow_mut().push(route.key().to_string());
        }));

        table
            .register(RouteEntry::new(
                "b",
                &[Method::GET, Method::POST],
                "/b",
                Target::new("C", "b"),
            ))
            .unwrap();

        assert_eq!(&*seen.borrow(), &["GET /a", "GET /b", "POST /b"]);
    }
}
