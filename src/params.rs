use std::fmt;
use std::slice;

/// A parameter value: a scalar, a list, or the explicit absence of a value.
///
/// Route defaults, link arguments and query parameters all share this value
/// space. `Null` marks a declared-but-unset parameter and renders as the `_`
/// placeholder segment in generated URLs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Renders the value as a single path segment, or `None` for values
    /// that have no segment form.
    pub fn as_segment(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Int(i) => Some(i.to_string()),
            Value::Str(s) => Some(s.clone()),
            Value::List(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => f.write_str(s),
            Value::List(_) => Ok(()),
        }
    }
}

/// An ordered list of named parameters.
///
/// Insertion order is preserved, and overwriting an existing name keeps its
/// original position. Lookups scan the list; parameter sets are small enough
/// that this beats a hash map in practice.
///
/// ```rust
/// use signpost::{Params, Value};
///
/// let mut params = Params::new();
/// params.set("id", "42");
/// params.set("page", 3);
///
/// assert_eq!(params.get("id"), Some(&Value::Str("42".into())));
/// assert_eq!(params.iter().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Vec<(String, Value)>);

impl Params {
    pub fn new() -> Self {
        Params(Vec::new())
    }

    /// Returns the number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no parameters in the list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value registered under the given name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.0
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns `true` if a value is registered under the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a value. An existing name is overwritten in place, a new name
    /// is appended to the end.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.0.push((name, value)),
        }
    }

    /// Removes and returns the value registered under the given name.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let i = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(i).1)
    }

    /// Merges another list into this one. Existing names are overwritten in
    /// place, new names are appended in the other list's order.
    pub fn merge(&mut self, other: &Params) {
        for (name, value) in other.iter() {
            self.set(name, value.clone());
        }
    }

    /// Returns an iterator over the names and values in the list.
    pub fn iter(&self) -> ParamsIter<'_> {
        ParamsIter(self.0.iter())
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.set(name, value);
        }
        params
    }
}

/// An iterator over the names and values of a parameter list.
pub struct ParamsIter<'p>(slice::Iter<'p, (String, Value)>);

impl<'p> Iterator for ParamsIter<'p> {
    type Item = (&'p str, &'p Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(name, value)| (name.as_str(), value))
    }
}

impl ExactSizeIterator for ParamsIter<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_position() {
        let mut params = Params::new();
        params.set("a", 1);
        params.set("b", 2);
        params.set("a", 9);

        let order: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(params.get("a"), Some(&Value::Int(9)));
    }

    #[test]
    fn merge_appends_new_names() {
        let mut base: Params = [("a", 1), ("b", 2)].into_iter().collect();
        let over: Params = [("b", 7), ("c", 3)].into_iter().collect();
        base.merge(&over);

        let items: Vec<(&str, &Value)> = base.iter().collect();
        assert_eq!(
            items,
            vec![
                ("a", &Value::Int(1)),
                ("b", &Value::Int(7)),
                ("c", &Value::Int(3)),
            ]
        );
    }

    #[test]
    fn remove_shifts_order() {
        let mut params: Params = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        assert_eq!(params.remove("b"), Some(Value::Int(2)));
        assert_eq!(params.remove("b"), None);

        let order: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["a", "c"]);
    }

    #[test]
    fn segment_rendering() {
        assert_eq!(Value::Null.as_segment(), None);
        assert_eq!(Value::Int(0).as_segment(), Some("0".to_string()));
        assert_eq!(Value::from("x").as_segment(), Some("x".to_string()));
        assert_eq!(Value::List(vec![]).as_segment(), None);
    }
}
