use crate::error::DispatchError;
use crate::params::Params;
use crate::router::{ResolvedRoute, Router};

use http::Method;

/// An immutable request value for the dispatch layer.
///
/// Constructing one of these from the ambient environment (a server
/// request, CGI variables, a test harness) is the embedding application's
/// job; the routing core only ever sees this explicit value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RouteRequest {
    pub method: Method,
    pub uri: String,
}

impl RouteRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> RouteRequest {
        RouteRequest {
            method,
            uri: uri.into(),
        }
    }
}

/// Turns the core's null-returning lookups into dispatchable results.
///
/// Where `Matcher::lookup` reports "no match" as an empty result, the
/// dispatcher distinguishes a path nobody serves (`NotFound`) from a path
/// served under different HTTP methods (`MethodNotAllowed`, with the
/// allowed set), so a caller can map the two to distinct status codes.
/// The dispatcher never invokes a handler; it returns the handler's
/// identity and bound parameters.
pub struct Dispatcher {
    router: Router,
}

impl Dispatcher {
    pub fn new(router: Router) -> Dispatcher {
        Dispatcher { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Resolves a request by URL prefix (the router's primary strategy).
    pub fn dispatch(&self, request: &RouteRequest) -> Result<ResolvedRoute, DispatchError> {
        self.router.resolve(&request.method, &request.uri)
    }

    /// Resolves a request against the compiled patterns instead of the
    /// prefix index, for routes whose parameters live in the pattern
    /// itself.
    pub fn match_request(&self, request: &RouteRequest) -> Result<ResolvedRoute, DispatchError> {
        let (path, query) = split_request_uri(&request.uri);

        let result = self
            .router
            .matcher()
            .lookup(&request.method, &path, &query);
        if let Some(entry) = result.data {
            return Ok(ResolvedRoute {
                alias: entry.alias.clone(),
                target: entry.target.clone(),
                params: result.params,
                preconditions: entry.preconditions.clone(),
            });
        }

        let allowed = self.router.table().allowed_methods(&path);
        if allowed.is_empty() {
            Err(DispatchError::NotFound {
                method: request.method.clone(),
                uri: request.uri.clone(),
            })
        } else {
            Err(DispatchError::MethodNotAllowed {
                method: request.method.clone(),
                uri: request.uri.clone(),
                allowed,
            })
        }
    }
}

fn split_request_uri(uri: &str) -> (String, Params) {
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, crate::router::parse_query(query)),
        None => (uri, Params::new()),
    };
    (format!("/{}", path.trim_start_matches('/')), query)
}
