//! Script values seen by the engine
//!
//! Captured variables and call arguments both travel as [`Value`]. The model
//! follows the host language: scalars, an ordered keyed `array` that doubles
//! as list and map, objects, and opaque handles (closures, resources) that
//! have no stable representation.
//!
//! Bare JSON converts without annotation:
//! - Integers → `Int`, other numbers → `Float`
//! - Strings → `Str`
//! - Arrays → list-shaped `Array`
//! - Objects → string-keyed `Array`

pub mod literal;

pub use literal::to_literal;

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{}", i),
            ArrayKey::Str(s) => write!(f, "{}", s),
        }
    }
}

/// An object instance, reduced to the state the engine can see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectValue {
    pub class: String,
    pub properties: Vec<(String, Value)>,
    /// Whether the class can rebuild an instance from exported state
    pub restorable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(serialize_with = "serialize_finite")] f64),
    Str(String),
    Array(Vec<(ArrayKey, Value)>),
    Object(ObjectValue),
    /// Closure, resource or other handle; carries a description only
    Opaque(#[serde(serialize_with = "refuse_opaque")] String),
}

fn serialize_finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(serde::ser::Error::custom(format!(
            "non-finite float {} has no canonical encoding",
            value
        )))
    }
}

fn refuse_opaque<S: Serializer>(description: &String, _serializer: S) -> Result<S::Ok, S::Error> {
    Err(serde::ser::Error::custom(format!(
        "{} cannot be serialized",
        description
    )))
}

impl Value {
    /// Build a list-shaped array with keys `0..n`
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ArrayKey::Int(i as i64), v.into()))
                .collect(),
        )
    }

    /// Build a string-keyed array, preserving the given order
    pub fn assoc<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Array(
            entries
                .into_iter()
                .map(|(k, v)| (ArrayKey::Str(k.into()), v.into()))
                .collect(),
        )
    }

    /// Build an object that exports and restores its state
    pub fn object<I, K, V>(class: &str, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(ObjectValue {
            class: class.trim_start_matches('\\').to_string(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            restorable: true,
        })
    }

    /// Build a closure or resource handle
    pub fn opaque(description: &str) -> Self {
        Value::Opaque(description.to_string())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(o) => &o.class,
            Value::Opaque(_) => "opaque",
        }
    }

    /// Convert a JSON fixture value
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => Value::list(items.iter().map(Value::from_json)),
            serde_json::Value::Object(map) => {
                Value::assoc(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}
