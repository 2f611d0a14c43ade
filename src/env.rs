use std::collections::HashMap;

use serde_json::Number;
use tracing::trace;

use crate::error::Error;
use crate::mapper::{KeyReducer, NameTransform};
use crate::shape::Leaf;
use crate::source::KvSource;
use crate::value::Value;

/// Environment variables as a key-value source.
///
/// Keys are field names uppercased and joined with `_`
/// (`database.pool_size` → `DATABASE_POOL_SIZE`), overridable per field with
/// the `env` tag. With a prefix set, every key is looked up as
/// `{PREFIX}_{KEY}`. Empty variables count as unset.
///
/// Values are parsed heuristically (bool, integer, float, string). If the
/// field rejects the parsed value the raw string is tried, then a list split
/// on the list delimiter (typed items first, then raw string items).
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: Option<String>,
    tag: String,
    list_delimiter: Option<String>,
    vars: Option<HashMap<String, String>>,
}

impl Default for EnvSource {
    fn default() -> Self {
        Self {
            prefix: None,
            tag: "env".to_string(),
            list_delimiter: Some(",".to_string()),
            vars: None,
        }
    }
}

impl EnvSource {
    /// Read from the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a fixed set of variables instead of the process environment.
    ///
    /// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: Some(vars.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Tag consulted for per-field name overrides. Defaults to `env`.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Delimiter for list values. `None` disables list parsing.
    pub fn list_delimiter(mut self, delimiter: Option<&str>) -> Self {
        self.list_delimiter = delimiter.map(str::to_string);
        self
    }

    /// Variable name for a canonical key.
    pub fn var_name(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}_{key}"),
            _ => key.to_string(),
        }
    }

    /// Non-empty value of the variable backing `key`.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let name = self.var_name(key);
        let value = match &self.vars {
            Some(vars) => vars.get(&name).cloned(),
            None => std::env::var(&name).ok(),
        };
        match value {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                trace!(var = %name, "environment variable not set");
                None
            }
        }
    }

    fn coerce(&self, name: &str, raw: &str, slot: &mut dyn Leaf) -> Result<(), Error> {
        let first = match slot.set_value(parse_env_value(raw)) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        if slot.set_value(Value::String(raw.to_string())).is_ok() {
            return Ok(());
        }
        if let Some(delimiter) = &self.list_delimiter {
            let items: Vec<&str> = raw.split(delimiter.as_str()).map(str::trim).collect();
            let typed = items.iter().map(|item| parse_env_value(item)).collect();
            if slot.set_value(Value::Array(typed)).is_ok() {
                return Ok(());
            }
            let strings = items
                .iter()
                .map(|item| Value::String(item.to_string()))
                .collect();
            if slot.set_value(Value::Array(strings)).is_ok() {
                return Ok(());
            }
        }
        Err(Error::KeyDecode {
            key: name.to_string(),
            reason: first.to_string(),
        })
    }
}

impl KvSource for EnvSource {
    fn decode_key(&self, key: &str, slot: &mut dyn Leaf) -> Result<(), Error> {
        match self.lookup(key) {
            Some(raw) => self.coerce(&self.var_name(key), &raw, slot),
            None => Ok(()),
        }
    }

    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn name_transform(&self) -> Option<NameTransform> {
        Some(NameTransform::Upper)
    }

    fn reducer(&self) -> Option<KeyReducer> {
        Some(KeyReducer::delimited("_"))
    }
}

/// Parse an env var value into a typed value.
/// Tries: bool → integer → float → string.
fn parse_env_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(u) = s.parse::<u64>() {
        return Value::from(u);
    }
    // "NaN" / "inf" stay strings.
    if let Some(n) = s.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}
