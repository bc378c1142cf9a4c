use http::Method;

use std::fmt;

/// Represents errors that can occur when compiling a route pattern.
///
/// All of these are configuration errors: they are raised when a route is
/// registered, never while a request is being matched.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PatternError {
    /// Route patterns must not be empty.
    Empty,
    /// An optional group was opened with `[` but never closed.
    UnbalancedOptional,
    /// A `]` was found without a matching `[`.
    UnexpectedClose,
    /// The pattern ends in the middle of a backslash escape.
    DanglingEscape,
    /// Parameters must be registered with a name.
    UnnamedParam,
    /// The same parameter name appears more than once.
    DuplicateParam {
        /// The offending parameter name.
        name: String,
    },
    /// The generated regular expression was rejected.
    Regex {
        /// The reason reported by the regex engine.
        reason: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "route patterns must not be empty"),
            Self::UnbalancedOptional => {
                write!(f, "an optional group was opened with '[' but never closed")
            }
            Self::UnexpectedClose => write!(f, "found ']' without a matching '['"),
            Self::DanglingEscape => write!(f, "the pattern ends with an unfinished escape"),
            Self::UnnamedParam => write!(f, "parameters must be registered with a name"),
            Self::DuplicateParam { name } => {
                write!(f, "the parameter '{}' appears more than once", name)
            }
            Self::Regex { reason } => {
                write!(f, "the compiled pattern was rejected: {}", reason)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// A failed attempt to build a URL from route metadata.
///
/// ```
/// use signpost::{LinkArgs, LinkError, Router};
///
/// let router = Router::new("/", "example.org", false);
///
/// // nothing registered, nothing on the context stack
/// let err = router.link_to(&LinkArgs::new().alias("start")).unwrap_err();
/// assert!(matches!(err, LinkError::AliasNotFound { .. }));
/// ```
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LinkError {
    /// No route is registered under the requested alias.
    AliasNotFound {
        /// The alias that was looked up.
        alias: String,
    },
    /// No route is registered for the requested controller/method pair.
    TargetNotFound {
        /// The controller identifier that was looked up.
        controller: String,
        /// The method name that was looked up.
        method: String,
    },
    /// Neither an alias nor a controller/method pair could be determined,
    /// either from the arguments or from an enclosing context.
    MissingIdentity,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AliasNotFound { alias } => write!(f, "alias not found: {}", alias),
            Self::TargetNotFound { controller, method } => {
                write!(
                    f,
                    "controller/method pair not found: {}::{}",
                    controller, method
                )
            }
            Self::MissingIdentity => {
                write!(f, "neither an alias nor a controller/method pair was given")
            }
        }
    }
}

impl std::error::Error for LinkError {}

/// A request that could not be dispatched.
///
/// The lookup primitives themselves report "no match" as an empty result;
/// this error is produced by the dispatch wrapper, which turns an empty
/// result into something a caller can map to an HTTP status code.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DispatchError {
    /// No route matches the request path.
    NotFound {
        /// The requested HTTP method.
        method: Method,
        /// The requested URI.
        uri: String,
    },
    /// A route matches the request path, but not for this HTTP method.
    MethodNotAllowed {
        /// The requested HTTP method.
        method: Method,
        /// The requested URI.
        uri: String,
        /// The methods the matched path does accept.
        allowed: Vec<Method>,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { method, uri } => {
                write!(f, "no route found for {} {}", method, uri)
            }
            Self::MethodNotAllowed {
                method,
                uri,
                allowed,
            } => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                write!(
                    f,
                    "method {} not allowed for {} (allowed: {})",
                    method,
                    uri,
                    allowed.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for DispatchError {}
