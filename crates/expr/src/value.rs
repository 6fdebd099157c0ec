//! Runtime values the expression engine operates on (§4.11).
//!
//! `Missing` is distinct from `Null`: a literal `null` in a context document
//! is `Null`, while a property path that doesn't resolve (an absent key, an
//! out-of-range index) evaluates to `Missing`. Both compare `false` in any
//! comparison, per the spec's "missing properties evaluate to a well-defined
//! null/missing value" rule — the caller's `else`/default branch is expected
//! to handle them, not a thrown error.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Not serializable as JSON on its own; only ever produced at eval time.
    #[serde(skip)]
    Missing,
}

impl Value {
    pub fn from_json(json: &Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => {
                Value::Map(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect())
            }
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Truthiness used by `if`/`&&`/`||`: missing and null are falsy, empty
    /// strings/lists are falsy, zero is falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null | Value::Missing => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    pub fn get_property(&self, name: &str) -> Value {
        match self {
            Value::Map(map) => map.get(name).cloned().unwrap_or(Value::Missing),
            _ => Value::Missing,
        }
    }

    pub fn get_index(&self, index: &Value) -> Value {
        match (self, index) {
            (Value::List(items), Value::Number(n)) => {
                if *n < 0.0 {
                    return Value::Missing;
                }
                items.get(*n as usize).cloned().unwrap_or(Value::Missing)
            }
            (Value::Map(map), Value::String(key)) => {
                map.get(key).cloned().unwrap_or(Value::Missing)
            }
            (Value::String(s), Value::Number(n)) => {
                if *n < 0.0 {
                    return Value::Missing;
                }
                s.chars().nth(*n as usize).map(|c| Value::String(c.to_string())).unwrap_or(Value::Missing)
            }
            _ => Value::Missing,
        }
    }

    pub fn len(&self) -> Value {
        match self {
            Value::String(s) => Value::Number(s.chars().count() as f64),
            Value::List(items) => Value::Number(items.len() as f64),
            Value::Map(map) => Value::Number(map.len() as f64),
            _ => Value::Missing,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Missing => write!(f, "missing"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(_) | Value::Map(_) => {
                write!(f, "{}", serde_json::to_string(self).unwrap_or_default())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_falsy() {
        assert!(!Value::Missing.is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn property_lookup_misses_cleanly() {
        let v = Value::Map(BTreeMap::new());
        assert!(v.get_property("x").is_missing());
    }
}
