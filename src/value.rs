//! Format-neutral configuration values.
//!
//! [`Value`] is `serde_json::Value` with insertion-ordered objects. Bulk
//! documents are parsed into it and record leaves are read from and written
//! through it. YAML and TOML trees are converted here so every format ends up
//! in the same shape.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ParseError;

pub use serde_json::Value;

/// Insertion-ordered string-keyed mapping.
pub type Mapping = serde_json::Map<String, Value>;

/// A value a leaf could not be serialized to or deserialized from.
pub type ValueError = serde_json::Error;

pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, ValueError> {
    serde_json::to_value(value)
}

pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, ValueError> {
    serde_json::from_value(value)
}

/// Convert a parsed YAML document.
///
/// Scalar mapping keys (`1:`, `true:`) are stringified. Tags are dropped in
/// favour of the tagged value.
pub(crate) fn from_yaml(yaml: serde_yaml::Value) -> Result<Value, ParseError> {
    Ok(match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => yaml_number(&n)?,
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => Value::Array(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<_, _>>()?,
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, value) in map {
                out.insert(yaml_key(key)?, from_yaml(value)?);
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Value, ParseError> {
    if let Some(u) = n.as_u64() {
        return Ok(Value::from(u));
    }
    if let Some(i) = n.as_i64() {
        return Ok(Value::from(i));
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ParseError::Other(format!("non-finite number {n} is not supported")))
}

fn yaml_key(key: serde_yaml::Value) -> Result<String, ParseError> {
    match key {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Tagged(tagged) => yaml_key(tagged.value),
        other => Err(ParseError::Other(format!(
            "mapping key must be a scalar, found {other:?}"
        ))),
    }
}

/// Convert a parsed TOML table. Datetimes become their RFC 3339 string.
pub(crate) fn from_toml(toml: toml::Value) -> Result<Value, ParseError> {
    Ok(match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| ParseError::Other(format!("non-finite number {f} is not supported")))?,
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(from_toml)
                .collect::<Result<_, _>>()?,
        ),
        toml::Value::Table(table) => {
            let mut out = Mapping::new();
            for (key, value) in table {
                out.insert(key, from_toml(value)?);
            }
            Value::Object(out)
        }
    })
}
