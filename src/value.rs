//! Untyped nested data model
//!
//! Input and output of every cast is a [`Hash`]: an insertion-ordered map whose
//! keys are either symbols or strings. The distinction matters because the
//! caster reads and writes keys in a configurable representation
//! (see [`KeyMode`]).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered mapping used for both input and output
pub type Hash = IndexMap<Key, Value>;

/// A mapping key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// Symbol-like identifier (`:name`)
    Symbol(String),
    /// Plain string (`"name"`)
    String(String),
}

impl Key {
    /// Create a symbol key
    pub fn symbol(name: impl Into<String>) -> Self {
        Key::Symbol(name.into())
    }

    /// Create a string key
    pub fn string(name: impl Into<String>) -> Self {
        Key::String(name.into())
    }

    /// The textual name, regardless of representation
    pub fn as_str(&self) -> &str {
        match self {
            Key::Symbol(s) | Key::String(s) => s,
        }
    }

    /// The representation of this key
    pub fn mode(&self) -> KeyMode {
        match self {
            Key::Symbol(_) => KeyMode::Symbol,
            Key::String(_) => KeyMode::String,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key representation used when reading input or writing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    #[default]
    Symbol,
    String,
}

impl KeyMode {
    /// Build a key for `name` in this representation
    pub fn key(&self, name: &str) -> Key {
        match self {
            KeyMode::Symbol => Key::Symbol(name.to_string()),
            KeyMode::String => Key::String(name.to_string()),
        }
    }

    /// Parse a mode from an untyped value (`:symbol`, `"string"`, ...)
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Symbol(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl FromStr for KeyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix(':').unwrap_or(s) {
            "symbol" => Ok(KeyMode::Symbol),
            "string" => Ok(KeyMode::String),
            other => Err(format!("unknown key mode '{}'", other)),
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMode::Symbol => f.write_str("symbol"),
            KeyMode::String => f.write_str("string"),
        }
    }
}

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    /// Wall-clock timestamp without zone information
    Time(NaiveDateTime),
    Array(Vec<Value>),
    Hash(Hash),
}

impl Value {
    /// Create a symbol value
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Name of the observed type, as reported in casting errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Symbol(_) => "Symbol",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::Time(_) => "Time",
            Value::Array(_) => "Array",
            Value::Hash(_) => "Hash",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_hash(&self) -> Option<&Hash> {
        match self {
            Value::Hash(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// String or symbol contents
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Render as JSON. Symbols become strings, temporal values ISO-8601.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Integer(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) | Value::Symbol(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Json::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Time(t) => Json::String(t.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Hash(hash) => hash_to_json(hash),
        }
    }
}

/// Render a hash as a JSON object (both key representations become strings)
pub fn hash_to_json(hash: &Hash) -> serde_json::Value {
    serde_json::Value::Object(
        hash.iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_json()))
            .collect(),
    )
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Hash(
                map.into_iter()
                    .map(|(k, v)| (Key::String(k), Value::from(v)))
                    .collect(),
            ),
        }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Hash> for Value {
    fn from(hash: Hash) -> Self {
        Value::Hash(hash)
    }
}

impl<V: Into<Value>> FromIterator<(Key, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (Key, V)>>(iter: I) -> Self {
        Value::Hash(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
