//! Bulk route loading.
//!
//! An offline generator (an annotation scanner, typically) produces an
//! ordered sequence of route records; this module feeds them into a
//! `Router`. Malformed records are skipped with a warning rather than
//! failing the whole load, so one broken annotation cannot take the
//! application down.

use crate::params::Value;
use crate::router::Router;
use crate::table::{DeclaredParams, Target};

use http::Method;
use log::warn;
use serde::Deserialize;

/// A bulk-load document: an ordered list of route records.
///
/// Records are kept as raw JSON values so that one malformed record does
/// not fail deserialization of the document.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Definitions {
    #[serde(default)]
    pub routes: Vec<serde_json::Value>,
}

impl Definitions {
    /// Parses a definitions document from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Definitions> {
        serde_json::from_str(json)
    }
}

struct Record {
    name: String,
    methods: Vec<Method>,
    path: String,
    target: Target,
    params: DeclaredParams,
}

impl Router {
    /// Registers every well-formed record of a definitions document.
    ///
    /// A record needs at least a name, a path and a `[controller, method]`
    /// target; anything else is skipped. Missing or empty methods default
    /// to GET. Returns the number of routes registered.
    pub fn load_definitions(&mut self, definitions: &Definitions) -> usize {
        let mut loaded = 0;
        for raw in &definitions.routes {
            let record = match parse_record(raw) {
                Some(record) => record,
                None => {
                    warn!("skipping malformed route record: {}", raw);
                    continue;
                }
            };
            let result = self.add(
                record.name.clone(),
                &record.methods,
                record.path,
                record.target,
                record.params,
                Router::SECURE,
                Vec::new(),
            );
            match result {
                Ok(_) => loaded += 1,
                Err(err) => warn!("skipping route record '{}': {}", record.name, err),
            }
        }
        loaded
    }
}

fn parse_record(raw: &serde_json::Value) -> Option<Record> {
    let name = raw.get("name")?.as_str()?.to_string();
    let path = raw.get("path")?.as_str()?.to_string();

    let target = raw.get("target")?.as_array()?;
    let controller = target.first()?.as_str()?;
    let method = target.get(1)?.as_str()?;
    let target = Target::new(controller, method);

    let methods = parse_methods(raw.get("method").or_else(|| raw.get("methods")));
    let params = parse_params(raw.get("params"));

    Some(Record {
        name,
        methods,
        path,
        target,
        params,
    })
}

fn parse_methods(raw: Option<&serde_json::Value>) -> Vec<Method> {
    let mut methods = Vec::new();
    match raw {
        Some(serde_json::Value::String(name)) => {
            if let Ok(method) = Method::from_bytes(name.as_bytes()) {
                methods.push(method);
            }
        }
        Some(serde_json::Value::Array(names)) => {
            for name in names {
                let name = match name.as_str() {
                    Some(name) if !name.is_empty() => name,
                    _ => continue,
                };
                if let Ok(method) = Method::from_bytes(name.as_bytes()) {
                    methods.push(method);
                }
            }
        }
        _ => {}
    }
    if methods.is_empty() {
        methods.push(Method::GET);
    }
    methods
}

/// Declared parameters come in two JSON shapes: an array of names (all
/// required), or an object of name→default where `null` means required.
fn parse_params(raw: Option<&serde_json::Value>) -> DeclaredParams {
    let mut params = DeclaredParams::new();
    match raw {
        Some(serde_json::Value::Array(names)) => {
            for name in names {
                if let Some(name) = name.as_str() {
                    params = params.required(name);
                }
            }
        }
        Some(serde_json::Value::Object(map)) => {
            for (name, default) in map {
                match json_value(default) {
                    Some(Value::Null) => params = params.required(name.as_str()),
                    Some(value) => params = params.with_default(name.as_str(), value),
                    // nested metadata objects are not path parameters
                    None => {}
                }
            }
        }
        _ => {}
    }
    params
}

fn json_value(raw: &serde_json::Value) -> Option<Value> {
    match raw {
        serde_json::Value::Null => Some(Value::Null),
        serde_json::Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Int(i)),
            None => Some(Value::Str(n.to_string())),
        },
        serde_json::Value::String(s) => Some(Value::Str(s.clone())),
        serde_json::Value::Array(items) => {
            let values: Vec<Value> = items.iter().filter_map(json_value).collect();
            Some(Value::List(values))
        }
        serde_json::Value::Object(_) => None,
    }
}
