use crate::params::{Params, Value};
use crate::table::{RouteEntry, RouteTable};

use http::Method;

/// The outcome of a lookup: the matched route's data and the extracted
/// parameters, or an empty result. "No match" is not an error here: the
/// caller decides whether that means 404, a fallback route, or something
/// else entirely.
#[derive(Debug)]
pub struct MatchResult<'t> {
    /// The matched route, or `None`.
    pub data: Option<&'t RouteEntry>,
    /// The named parameters extracted from the path (and, for
    /// query-constrained routes, the constrained query pairs).
    pub params: Params,
}

impl<'t> MatchResult<'t> {
    pub(crate) fn none() -> MatchResult<'t> {
        MatchResult {
            data: None,
            params: Params::new(),
        }
    }

    /// Returns `true` if a route was matched.
    pub fn is_match(&self) -> bool {
        self.data.is_some()
    }
}

/// Walks a route table's compiled patterns to find the first match for a
/// request.
///
/// Candidates are tested in descending pattern-length order, so the longer
/// (typically more specific) of two overlapping patterns wins: with both
/// `/test` and `/test/:id` registered, a request for `/test` matches the
/// literal route.
///
/// ```rust
/// use http::Method;
/// use signpost::{Matcher, Params, RouteEntry, RouteTable, Target};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut table = RouteTable::new();
/// table.register(RouteEntry::new(
///     "user",
///     &[Method::GET],
///     "/users/:id",
///     Target::new("UserController", "show"),
/// ))?;
///
/// let matcher = Matcher::new(&table);
/// let result = matcher.lookup(&Method::GET, "/users/17", &Params::new());
/// assert!(result.is_match());
/// assert_eq!(result.params.get("id").unwrap().to_string(), "17");
/// # Ok(())
/// # }
/// ```
pub struct Matcher<'t> {
    table: &'t RouteTable,
}

impl<'t> Matcher<'t> {
    pub fn new(table: &'t RouteTable) -> Matcher<'t> {
        Matcher { table }
    }

    /// Finds the first route whose compiled pattern accepts
    /// `"{METHOD} {path}"`.
    ///
    /// A candidate that declares query constraints is skipped as a whole
    /// unless every constrained key is present in `query` with an exactly
    /// equal value; there is no partial fallthrough. Only named captures
    /// survive into the result parameters.
    pub fn lookup(&self, method: &Method, path: &str, query: &Params) -> MatchResult<'t> {
        let probe = format!("{} {}", method, path);

        'candidates: for route in self.table.compiled() {
            let mut params = match route.compiled().captures(&probe) {
                Some(params) => params,
                None => continue,
            };

            for (key, expected) in route.query_constraints() {
                if !query_matches(query, key, expected) {
                    continue 'candidates;
                }
            }
            for (key, expected) in route.query_constraints() {
                params.set(key.clone(), Value::Str(expected.clone()));
            }

            return MatchResult {
                data: self.table.find_by_alias(route.alias()),
                params,
            };
        }

        MatchResult::none()
    }
}

fn query_matches(query: &Params, key: &str, expected: &str) -> bool {
    match query.get(key) {
        Some(Value::Str(actual)) => actual == expected,
        Some(Value::Int(actual)) => actual.to_string() == expected,
        _ => false,
    }
}
