use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dependency::Dependency;
use crate::runtime::RuntimeError;

/// Dynamically-typed binding value.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Invalid JSON value: {0}")]
    InvalidJson(String),
}

pub type ValueResult<T> = Result<T, ValueError>;

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    fn mismatch<T>(&self, expected: &'static str) -> ValueResult<T> {
        Err(ValueError::TypeMismatch {
            expected,
            found: self.type_name(),
        })
    }

    pub fn as_bool(&self) -> ValueResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => self.mismatch("boolean"),
        }
    }

    pub fn as_str(&self) -> ValueResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => self.mismatch("string"),
        }
    }

    pub fn as_f64(&self) -> ValueResult<f64> {
        match self {
            Value::Integer(i) => Ok(*i as f64),
            Value::Float(f) => Ok(*f),
            _ => self.mismatch("number"),
        }
    }

    pub fn as_list(&self) -> ValueResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            _ => self.mismatch("list"),
        }
    }

    pub fn as_map(&self) -> ValueResult<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Ok(map),
            _ => self.mismatch("map"),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coercion used for boolean slots and logical operators.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    pub fn from_json(json: serde_json::Value) -> ValueResult<Self> {
        serde_json::from_value(json).map_err(|e| ValueError::InvalidJson(e.to_string()))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            _ => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::String).collect())
    }
}

/// Binding store of one evaluation session: `Dependency -> Value`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings(BTreeMap<Dependency, Value>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dependency: &Dependency) -> Option<&Value> {
        self.0.get(dependency)
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.0.contains_key(dependency)
    }

    pub fn insert(&mut self, dependency: Dependency, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(dependency, value.into())
    }

    pub fn remove(&mut self, dependency: &Dependency) -> Option<Value> {
        self.0.remove(dependency)
    }

    /// Merge a delta produced by a later stage; delta entries win.
    pub fn merge(&mut self, delta: Bindings) {
        self.0.extend(delta.0);
    }

    pub fn require(&self, dependency: &Dependency) -> Result<&Value, RuntimeError> {
        self.0
            .get(dependency)
            .ok_or_else(|| RuntimeError::MissingBinding(dependency.clone()))
    }

    pub fn require_bool(&self, dependency: &Dependency) -> Result<bool, RuntimeError> {
        self.require(dependency)?
            .as_bool()
            .map_err(|source| RuntimeError::InvalidBinding {
                dependency: dependency.clone(),
                source,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dependency, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(dep, value)| (dep.to_string(), value.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(Dependency, Value)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (Dependency, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Bindings {
    type Item = (Dependency, Value);
    type IntoIter = std::collections::btree_map::IntoIter<Dependency, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
