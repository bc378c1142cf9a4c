use crate::error::PatternError;
use crate::params::{Params, Value};

use regex::Regex;

/// A route pattern compiled into an anchored regular expression.
///
/// The pattern grammar knows three token kinds: literal text, named
/// parameters introduced by `:name`, and optional groups wrapped in
/// `[` and `]` which may nest arbitrarily deep but must close in source
/// order. A backslash escapes the next character, so `\[`, `\]` and `\:`
/// match literally.
///
/// Named parameters capture one or more word characters (`\w+`). The
/// strict policy is deliberate: a permissive `.*?` capture would accept an
/// empty value for a skipped optional segment, so a path could populate a
/// later optional group while leaving an earlier one blank.
///
/// ```rust
/// use signpost::CompiledPattern;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let pattern = CompiledPattern::compile("/test[/:id[/:offset]]")?;
///
/// let params = pattern.captures("/test/123/10").unwrap();
/// assert_eq!(params.get("id").unwrap().to_string(), "123");
/// assert_eq!(params.get("offset").unwrap().to_string(), "10");
///
/// assert!(pattern.captures("/test").unwrap().is_empty());
/// assert!(pattern.captures("/other").is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    regex: Regex,
    names: Vec<String>,
}

impl CompiledPattern {
    /// Compiles a route pattern.
    ///
    /// Unbalanced optional-group brackets, an empty pattern, or an invalid
    /// parameter token are configuration errors reported here, not at
    /// match time.
    pub fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut source = String::from("^");
        let mut names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut depth = 0usize;

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(escaped) => literal.push(escaped),
                    None => return Err(PatternError::DanglingEscape),
                },
                '[' => {
                    flush_literal(&mut source, &mut literal);
                    source.push_str("(?:");
                    depth += 1;
                }
                ']' => {
                    if depth == 0 {
                        return Err(PatternError::UnexpectedClose);
                    }
                    flush_literal(&mut source, &mut literal);
                    source.push_str(")?");
                    depth -= 1;
                }
                ':' => {
                    flush_literal(&mut source, &mut literal);
                    let name = take_name(&mut chars)?;
                    if names.contains(&name) {
                        return Err(PatternError::DuplicateParam { name });
                    }
                    source.push_str(&format!("(?P<{}>\\w+)", name));
                    names.push(name);
                }
                _ => literal.push(c),
            }
        }

        if depth > 0 {
            return Err(PatternError::UnbalancedOptional);
        }
        flush_literal(&mut source, &mut literal);
        source.push('$');

        let regex = Regex::new(&source).map_err(|err| PatternError::Regex {
            reason: err.to_string(),
        })?;

        Ok(CompiledPattern {
            pattern: pattern.to_string(),
            regex,
            names,
        })
    }

    /// The original pattern text, for diagnostics.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The source of the compiled regular expression.
    pub fn regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// The named parameters of the pattern, in source order.
    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Tests a candidate string against the pattern.
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Tests a candidate string and returns the named captures, or `None`
    /// if the candidate does not match. Captures introduced by the group
    /// mechanics never appear in the result, only named parameters do.
    pub fn captures(&self, candidate: &str) -> Option<Params> {
        let caps = self.regex.captures(candidate)?;
        let mut params = Params::new();
        for name in &self.names {
            if let Some(m) = caps.name(name) {
                params.set(name.clone(), Value::Str(m.as_str().to_string()));
            }
        }
        Some(params)
    }
}

fn flush_literal(source: &mut String, literal: &mut String) {
    if !literal.is_empty() {
        source.push_str(&regex::escape(literal));
        literal.clear();
    }
}

fn take_name(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<String, PatternError> {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(PatternError::UnnamedParam);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple() {
        let pattern = CompiledPattern::compile("/test").unwrap();
        assert_eq!(pattern.regex_str(), "^/test$");
        assert!(pattern.is_match("/test"));
        assert!(!pattern.is_match("/test/10"));
    }

    #[test]
    fn nested_optionals() {
        let pattern = CompiledPattern::compile("/test[/:id[/:offset]]").unwrap();
        assert_eq!(
            pattern.regex_str(),
            "^/test(?:/(?P<id>\\w+)(?:/(?P<offset>\\w+))?)?$"
        );
        assert_eq!(pattern.param_names(), ["id", "offset"]);
    }

    #[test]
    fn optional_segments_fill_in_order() {
        let pattern = CompiledPattern::compile("/docs[/:a[/:b[/:c]]]").unwrap();
        assert!(pattern.is_match("/docs"));
        assert!(pattern.is_match("/docs/1"));
        assert!(pattern.is_match("/docs/1/2"));
        assert!(pattern.is_match("/docs/1/2/3"));

        // a later optional segment must not skip an earlier one
        assert!(!pattern.is_match("/docs//2"));
        assert!(!pattern.is_match("/docs//2/3"));
        assert!(!pattern.is_match("/docs/1/2/3/4"));
    }

    #[test]
    fn escaped_brackets_are_literals() {
        let pattern = CompiledPattern::compile("/test\\[aa\\]").unwrap();
        assert!(pattern.is_match("/test[aa]"));
        assert!(!pattern.is_match("/test"));
        assert!(pattern.param_names().is_empty());
    }

    #[test]
    fn escaped_colon_is_literal() {
        let pattern = CompiledPattern::compile("/at\\:noon").unwrap();
        assert!(pattern.is_match("/at:noon"));
        assert!(pattern.param_names().is_empty());
    }

    #[test]
    fn compile_errors() {
        assert_eq!(
            CompiledPattern::compile("").unwrap_err(),
            PatternError::Empty
        );
        assert_eq!(
            CompiledPattern::compile("/test[/:id").unwrap_err(),
            PatternError::UnbalancedOptional
        );
        assert_eq!(
            CompiledPattern::compile("/test]").unwrap_err(),
            PatternError::UnexpectedClose
        );
        assert_eq!(
            CompiledPattern::compile("/test\\").unwrap_err(),
            PatternError::DanglingEscape
        );
        assert_eq!(
            CompiledPattern::compile("/test/:").unwrap_err(),
            PatternError::UnnamedParam
        );
        assert_eq!(
            CompiledPattern::compile("/:x/:x").unwrap_err(),
            PatternError::DuplicateParam {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn captures_are_named_only() {
        let pattern = CompiledPattern::compile("/blog[/:category]/:post").unwrap();
        let params = pattern.captures("/blog/rust/routers").unwrap();
        let keys: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(keys, ["category", "post"]);
    }
}
