//! The `Router` ties the route table, the matcher and the context stack
//! together behind the registration and reverse-routing API.
//!
//! Routes are registered up front ("configure, then freeze, then serve");
//! every later operation takes `&self`. Reverse routing builds URLs from
//! route metadata by positional parameter substitution:
//!
//! ```rust
//! use http::Method;
//! use signpost::{DeclaredParams, LinkArgs, Router, Target};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new("/", "example.org", false);
//! router.get(
//!     "user-profile",
//!     "user",
//!     Target::new("UserController", "profile"),
//!     DeclaredParams::new().required("id").with_default("tab", "posts"),
//!     Router::SECURE,
//! )?;
//!
//! let url = router.link_to(&LinkArgs::new().alias("user-profile").with("id", 17))?;
//! assert_eq!(url, "https://example.org/user/17/posts");
//!
//! let resolved = router.resolve(&Method::GET, "/user/17/posts")?;
//! assert_eq!(resolved.alias, "user-profile");
//! # Ok(())
//! # }
//! ```

use crate::context::{ContextStack, Frame};
use crate::error::{DispatchError, LinkError, PatternError};
use crate::matcher::Matcher;
use crate::params::{Params, Value};
use crate::table::{DeclaredParams, RouteEntry, RouteTable, Target};

use http::Method;
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

/// Arguments for reverse routing: the identity of the route to link to
/// (an alias, or a controller/method pair) plus parameter values.
///
/// Values that match the route's declared parameters become path segments;
/// everything left over is appended as a query string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkArgs {
    pub(crate) alias: Option<String>,
    pub(crate) controller: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) values: Params,
}

impl LinkArgs {
    pub fn new() -> LinkArgs {
        LinkArgs::default()
    }

    /// Links by route alias.
    pub fn alias(mut self, alias: impl Into<String>) -> LinkArgs {
        self.alias = Some(alias.into());
        self
    }

    /// Links by handler identity.
    pub fn target(mut self, controller: impl Into<String>, method: impl Into<String>) -> LinkArgs {
        self.controller = Some(controller.into());
        self.method = Some(method.into());
        self
    }

    /// Sets the controller half of the handler identity. The missing half
    /// can be inherited from an enclosing context.
    pub fn controller(mut self, controller: impl Into<String>) -> LinkArgs {
        self.controller = Some(controller.into());
        self
    }

    /// Sets the method half of the handler identity.
    pub fn method(mut self, method: impl Into<String>) -> LinkArgs {
        self.method = Some(method.into());
        self
    }

    /// Adds a parameter value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> LinkArgs {
        self.values.set(name, value);
        self
    }
}

/// Hooks into URL assembly, for observers that need to rewrite the final
/// query-parameter set or the hostname+scheme prefix (environment-specific
/// hostname construction, tracking parameters and the like).
///
/// The default implementations change nothing.
pub trait RouterHooks {
    /// Rewrites the query parameters of a link before serialization.
    fn build_query(&self, _params: &mut Params) {}

    /// Overrides the scheme+host prefix of a link. `built` is the default
    /// constructed from the router's environment.
    fn build_host(&self, _host: &str, _is_https: bool, built: String) -> String {
        built
    }
}

struct NoHooks;

impl RouterHooks for NoHooks {}

/// A route resolved for an incoming request: the handler identity plus
/// the bound parameters. Invoking the handler, and everything after it,
/// is the caller's business.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRoute {
    pub alias: String,
    pub target: Target,
    pub params: Params,
    pub preconditions: Vec<String>,
}

/// The URL-routing core: registration, forward resolution and reverse
/// routing over one route table.
pub struct Router {
    table: RouteTable,
    stack: ContextStack,
    web_root: String,
    http_host: String,
    is_https: bool,
    default_alias: Option<String>,
    hooks: Box<dyn RouterHooks>,
}

impl Router {
    /// Marks a route as requiring https links.
    pub const SECURE: bool = true;
    /// Marks a route as served over plain http.
    pub const INSECURE: bool = false;

    /// Creates a router for the given environment.
    ///
    /// `web_root` is the path prefix the application is mounted under
    /// (usually `/`), `http_host` the host links are built against (an
    /// empty host yields host-relative links), and `is_https` whether the
    /// current request arrived over https.
    pub fn new(web_root: impl Into<String>, http_host: impl Into<String>, is_https: bool) -> Router {
        Router {
            table: RouteTable::new(),
            stack: ContextStack::new(),
            web_root: web_root.into(),
            http_host: http_host.into(),
            is_https,
            default_alias: None,
            hooks: Box::new(NoHooks),
        }
    }

    /// Replaces the URL-assembly hooks.
    pub fn set_hooks(&mut self, hooks: Box<dyn RouterHooks>) {
        self.hooks = hooks;
    }

    /// The route prefix used when a request path is empty.
    pub fn default_alias(&self) -> Option<&str> {
        self.default_alias.as_deref()
    }

    pub fn set_default_alias(&mut self, alias: impl Into<String>) -> &mut Router {
        self.default_alias = Some(alias.into());
        self
    }

    /// The underlying route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut RouteTable {
        &mut self.table
    }

    /// The context stack used by nested link generation.
    pub fn context(&self) -> &ContextStack {
        &self.stack
    }

    /// A matcher over this router's compiled patterns.
    pub fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.table)
    }

    /// Registers a route.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        alias: impl Into<String>,
        methods: &[Method],
        pattern: impl Into<String>,
        target: Target,
        params: DeclaredParams,
        https: bool,
        preconditions: Vec<String>,
    ) -> Result<&mut Router, PatternError> {
        let mut entry = RouteEntry::new(alias, methods, pattern, target);
        entry.params = params;
        entry.https = https;
        entry.preconditions = preconditions;
        self.table.register(entry)?;
        Ok(self)
    }

    /// Registers a route for GET and POST.
    pub fn all(
        &mut self,
        alias: impl Into<String>,
        pattern: impl Into<String>,
        target: Target,
        params: DeclaredParams,
        https: bool,
    ) -> Result<&mut Router, PatternError> {
        self.add(
            alias,
            &[Method::GET, Method::POST],
            pattern,
            target,
            params,
            https,
            Vec::new(),
        )
    }

    /// Registers a route for GET.
    pub fn get(
        &mut self,
        alias: impl Into<String>,
        pattern: impl Into<String>,
        target: Target,
        params: DeclaredParams,
        https: bool,
    ) -> Result<&mut Router, PatternError> {
        self.add(alias, &[Method::GET], pattern, target, params, https, Vec::new())
    }

    /// Registers a route for POST.
    pub fn post(
        &mut self,
        alias: impl Into<String>,
        pattern: impl Into<String>,
        target: Target,
        params: DeclaredParams,
        https: bool,
    ) -> Result<&mut Router, PatternError> {
        self.add(alias, &[Method::POST], pattern, target, params, https, Vec::new())
    }

    /// Registers a route for PUT.
    pub fn put(
        &mut self,
        alias: impl Into<String>,
        pattern: impl Into<String>,
        target: Target,
        params: DeclaredParams,
        https: bool,
    ) -> Result<&mut Router, PatternError> {
        self.add(alias, &[Method::PUT], pattern, target, params, https, Vec::new())
    }

    /// Registers a route for DELETE.
    pub fn delete(
        &mut self,
        alias: impl Into<String>,
        pattern: impl Into<String>,
        target: Target,
        params: DeclaredParams,
        https: bool,
    ) -> Result<&mut Router, PatternError> {
        self.add(alias, &[Method::DELETE], pattern, target, params, https, Vec::new())
    }

    /// Builds a URL for a route, without adding parameters from the
    /// enclosing context.
    ///
    /// If a context frame is active, its controller/method identity fills
    /// in whichever half the arguments leave open, but an alias is never
    /// inherited here. Declared parameters are substituted positionally;
    /// whatever remains becomes the query string.
    pub fn link_to(&self, args: &LinkArgs) -> Result<String, LinkError> {
        let mut args = args.clone();
        if let Some(top) = self.stack.top() {
            if args.controller.is_none() {
                args.controller = top.controller;
            }
            if args.method.is_none() {
                args.method = top.method;
            }
        }
        self.resolve_link(args)
    }

    /// Builds a URL for the current route, merging in the parameters of
    /// the enclosing context so that "link back to here with overrides"
    /// works from nested code.
    pub fn link_to_self(&self, args: &LinkArgs) -> Result<String, LinkError> {
        let mut args = args.clone();
        match self.stack.top() {
            Some(prev) => {
                let has_target = args.controller.is_some() || args.method.is_some();
                if args.alias.is_none() && !has_target {
                    args.alias = prev.alias.clone();
                } else if has_target {
                    // an explicit target drops the inherited alias so the
                    // correct different route is hit
                    if args.controller.is_none() {
                        args.controller = prev.controller.clone();
                    }
                    if args.method.is_none() {
                        args.method = prev.method.clone();
                    }
                }
                let mut values = prev.values.clone();
                values.merge(&args.values);
                args.values = values;
                self.link_to(&args)
            }
            None if args.alias.is_none() => Err(LinkError::MissingIdentity),
            None => self.link_to(&args),
        }
    }

    /// Pushes a context frame for the duration of `body`.
    ///
    /// The frame's missing identity is cross-referenced through the route
    /// table (an alias fills in its controller/method and vice versa), the
    /// result is merged over the current top frame, pushed, and popped
    /// again no matter how `body` exits.
    pub fn enter_context<T>(
        &self,
        args: &LinkArgs,
        body: impl FnOnce() -> T,
    ) -> Result<T, LinkError> {
        let mut frame = Frame {
            alias: args.alias.clone(),
            controller: args.controller.clone(),
            method: args.method.clone(),
            values: args.values.clone(),
        };

        if let Some(alias) = &frame.alias {
            let entry = match self.table.find_by_alias(alias) {
                Some(entry) => entry,
                None => {
                    return Err(LinkError::AliasNotFound {
                        alias: alias.clone(),
                    })
                }
            };
            if frame.controller.is_none() {
                frame.controller = Some(entry.target.controller.clone());
            }
            if frame.method.is_none() {
                frame.method = Some(entry.target.method.clone());
            }
        } else if let (Some(controller), Some(method)) = (&frame.controller, &frame.method) {
            let entry = match self.table.find_by_target(controller, method) {
                Some(entry) => entry,
                None => {
                    return Err(LinkError::TargetNotFound {
                        controller: controller.clone(),
                        method: method.clone(),
                    })
                }
            };
            frame.alias = Some(entry.alias.clone());
        }

        if let Some(prev) = self.stack.top() {
            frame = prev.merged_with(frame);
        }
        Ok(self.stack.scoped(frame, body))
    }

    /// Resolves an incoming request by URL prefix.
    ///
    /// The first path segment selects the route (an empty path falls back
    /// to the default alias); the remaining segments bind the declared
    /// parameters positionally, with `_` or an empty segment standing for
    /// "use the declared default". Query parameters are merged between the
    /// defaults and the path-bound values.
    pub fn resolve(
        &self,
        method: &Method,
        request_uri: &str,
    ) -> Result<ResolvedRoute, DispatchError> {
        let uri = request_uri.trim_matches('/');
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (uri, Params::new()),
        };

        let mut parts = path.split('/');
        let first = parts.next().unwrap_or("");
        let prefix = if first.is_empty() {
            match &self.default_alias {
                Some(alias) => alias.clone(),
                None => {
                    return Err(DispatchError::NotFound {
                        method: method.clone(),
                        uri: request_uri.to_string(),
                    })
                }
            }
        } else {
            first.to_string()
        };

        let entry = match self.table.find_by_prefix(&prefix, method) {
            Some(entry) => entry,
            None => {
                let allowed = self.table.methods_for_prefix(&prefix);
                if allowed.is_empty() {
                    return Err(DispatchError::NotFound {
                        method: method.clone(),
                        uri: request_uri.to_string(),
                    });
                }
                return Err(DispatchError::MethodNotAllowed {
                    method: method.clone(),
                    uri: request_uri.to_string(),
                    allowed,
                });
            }
        };

        let mut defaults = Params::new();
        let mut args = Params::new();
        for param in entry.params.iter() {
            let part = parts.next().unwrap_or("_");
            if part.is_empty() || part == "_" {
                defaults.set(
                    param.name.clone(),
                    param.default.clone().unwrap_or(Value::Null),
                );
            } else {
                args.set(param.name.clone(), Value::Str(urldecode(part)));
            }
        }

        let mut params = defaults;
        params.merge(&query);
        params.merge(&args);

        Ok(ResolvedRoute {
            alias: entry.alias.clone(),
            target: entry.target.clone(),
            params,
            preconditions: entry.preconditions.clone(),
        })
    }

    fn resolve_link(&self, args: LinkArgs) -> Result<String, LinkError> {
        let LinkArgs {
            alias,
            controller,
            method,
            values,
        } = args;

        if let Some(alias) = alias {
            let entry = match self.table.find_by_alias(&alias) {
                Some(entry) => entry,
                None => return Err(LinkError::AliasNotFound { alias }),
            };
            return Ok(self.build_link(entry, values));
        }

        if let (Some(controller), Some(method)) = (controller, method) {
            let entry = match self.table.find_by_target(&controller, &method) {
                Some(entry) => entry,
                None => return Err(LinkError::TargetNotFound { controller, method }),
            };
            return Ok(self.build_link(entry, values));
        }

        Err(LinkError::MissingIdentity)
    }

    fn build_link(&self, entry: &RouteEntry, mut values: Params) -> String {
        let mut path: Vec<String> = static_lead(&entry.pattern)
            .into_iter()
            .map(|segment| urlencode(&segment))
            .collect();

        for param in entry.params.iter() {
            let segment = match values.remove(&param.name) {
                Some(value) => value.as_segment(),
                None => param.default.as_ref().and_then(Value::as_segment),
            };
            path.push(match segment {
                Some(value) => urlencode(&value),
                None => "_".to_string(),
            });
        }

        // placeholders collapse from the end only, never from the middle
        while matches!(path.last().map(String::as_str), Some("" | "_" | "0")) {
            path.pop();
        }

        let mut query = values;
        self.hooks.build_query(&mut query);
        let query = build_query_string(&query);

        let mut uri = path.join("/");
        if !query.is_empty() {
            uri.push('?');
            uri.push_str(&query);
        }

        let built = self.build_hostname(entry.https);
        let host = self.hooks.build_host(&self.http_host, self.is_https, built);

        format!(
            "{}{}/{}",
            host,
            self.web_root.trim_end_matches('/'),
            uri.trim_start_matches('/')
        )
    }

    fn build_hostname(&self, route_https: bool) -> String {
        if self.http_host.is_empty() {
            return String::new();
        }
        let scheme = if route_https || self.is_https {
            "https"
        } else {
            "http"
        };
        format!("{}://{}", scheme, self.http_host)
    }
}

/// The static lead of a pattern: the literal segments before the first
/// parameter or optional group. These become the first segments of every
/// generated link.
fn static_lead(pattern: &str) -> Vec<String> {
    let path = match pattern.split_once('?') {
        Some((path, _)) => path,
        None => pattern,
    };

    let mut lead = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' | ':' => break,
            '\\' => {
                if let Some(escaped) = chars.next() {
                    lead.push(escaped);
                }
            }
            _ => lead.push(c),
        }
    }

    lead.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Percent-encodes a path segment or query component the
/// `application/x-www-form-urlencoded` way (space becomes `+`).
fn urlencode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn urldecode(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

/// Parses a query string into parameters. Keys of the shape `name[...]`
/// collect into a list under `name`, in order of appearance.
pub(crate) fn parse_query(query: &str) -> Params {
    let mut params = Params::new();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = Value::Str(value.into_owned());
        match key.split_once('[') {
            Some((base, _)) if key.ends_with(']') && !base.is_empty() => {
                match params.get_mut(base) {
                    Some(Value::List(items)) => items.push(value),
                    Some(slot) => *slot = Value::List(vec![value]),
                    None => {
                        params.set(base.to_string(), Value::List(vec![value]));
                    }
                }
            }
            _ => params.set(key.into_owned(), value),
        }
    }
    params
}

fn build_query_string(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params.iter() {
        append_query_value(&mut serializer, name, value);
    }
    serializer.finish()
}

fn append_query_value(
    serializer: &mut form_urlencoded::Serializer<'_, String>,
    name: &str,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::Int(i) => {
            serializer.append_pair(name, &i.to_string());
        }
        Value::Str(s) => {
            serializer.append_pair(name, s);
        }
        Value::List(items) => {
            for (i, item) in items.iter().enumerate() {
                append_query_value(serializer, &format!("{}[{}]", name, i), item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_lead_of_patterns() {
        assert_eq!(static_lead("test"), ["test"]);
        assert_eq!(static_lead("/test[/:id]"), ["test"]);
        assert_eq!(static_lead("/a/:x/:y"), ["a"]);
        assert_eq!(static_lead("/products/gtin/:number"), ["products", "gtin"]);
        assert!(static_lead("/").is_empty());
    }

    #[test]
    fn query_string_shapes() {
        let mut params = Params::new();
        params.set("a", 1);
        params.set("b", "\"test&\"");
        params.set(
            "c",
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        );
        params.set("skip", Value::Null);

        assert_eq!(
            build_query_string(&params),
            "a=1&b=%22test%26%22&c%5B0%5D=1&c%5B1%5D=2&c%5B2%5D=3"
        );
    }

    #[test]
    fn query_parsing_groups_lists() {
        let params = parse_query("a=1&c%5B0%5D=1&c%5B1%5D=2&b=x+y");
        assert_eq!(params.get("a"), Some(&Value::Str("1".to_string())));
        assert_eq!(params.get("b"), Some(&Value::Str("x y".to_string())));
        assert_eq!(
            params.get("c"),
            Some(&Value::List(vec![
                Value::Str("1".to_string()),
                Value::Str("2".to_string()),
            ]))
        );
    }

    #[test]
    fn encode_round_trip() {
        assert_eq!(urlencode("\"test&\""), "%22test%26%22");
        assert_eq!(urldecode("%22test%26%22"), "\"test&\"");
        assert_eq!(urldecode("x+y"), "x y");
    }
}
