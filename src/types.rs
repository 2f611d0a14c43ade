use std::path::Path;

use crate::error::ParseError;
use crate::unmarshal::Unmarshaller;
use crate::value::{self, Value};

/// Structured document formats understood out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Detect the format from a file extension (`.json`, `.yaml`/`.yml`, `.toml`).
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
            Format::Yaml => "YAML",
            Format::Toml => "TOML",
        }
    }
}

impl Unmarshaller for Format {
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, ParseError> {
        match self {
            Format::Json => Ok(serde_json::from_slice(bytes)?),
            Format::Yaml => {
                // An empty YAML document means "nothing to set".
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Value::Null);
                }
                value::from_yaml(serde_yaml::from_slice(bytes)?)
            }
            Format::Toml => {
                let text = std::str::from_utf8(bytes)?;
                let table: toml::Table = toml::from_str(text)?;
                value::from_toml(toml::Value::Table(table))
            }
        }
    }
}
