#![deny(clippy::all)]
#![forbid(unsafe_code)]

//! `signpost` is a URL-routing and request-dispatch core.
//!
//! Route patterns mix literal segments, named parameters and nestable
//! optional groups (`/test[/:id[/:offset]]`). Patterns compile to matchers
//! at registration time; requests resolve against the compiled set with
//! deterministic precedence (longest pattern first). The same route
//! metadata also drives reverse routing: URLs are reconstructed from an
//! alias or a handler identity, with positional parameter substitution and
//! a context stack for "link back to the current route" semantics.
//!
//! ```rust
//! use http::Method;
//! use signpost::{DeclaredParams, LinkArgs, Params, Router, Target};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new("/", "example.org", true);
//! router.get(
//!     "article",
//!     "/articles[/:id]",
//!     Target::new("ArticleController", "show"),
//!     DeclaredParams::new().required("id"),
//!     Router::SECURE,
//! )?;
//!
//! // forward: match a request path against the compiled patterns
//! let result = router.matcher().lookup(&Method::GET, "/articles/17", &Params::new());
//! assert_eq!(result.data.unwrap().alias, "article");
//!
//! // reverse: rebuild the URL from the route's metadata
//! let url = router.link_to(&LinkArgs::new().alias("article").with("id", 17))?;
//! assert_eq!(url, "https://example.org/articles/17");
//! # Ok(())
//! # }
//! ```
//!
//! Invoking handlers, serializing responses and speaking HTTP are out of
//! scope: lookups return the handler's identity plus bound parameters and
//! leave the rest to the embedding application.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod load;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod router;
pub mod table;

pub use crate::context::{ContextStack, Frame};
pub use crate::dispatch::{Dispatcher, RouteRequest};
pub use crate::error::{DispatchError, LinkError, PatternError};
pub use crate::load::Definitions;
pub use crate::matcher::{MatchResult, Matcher};
pub use crate::params::{Params, ParamsIter, Value};
pub use crate::pattern::CompiledPattern;
pub use crate::router::{LinkArgs, ResolvedRoute, Router, RouterHooks};
pub use crate::table::{
    CompiledRoute, DeclaredParam, DeclaredParams, RouteEntry, RouteListener, RouteTable, Target,
};
