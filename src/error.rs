use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Cyclic record shape: {type_name} reaches itself through field '{field}'")]
    CyclicShape {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("Invalid value for '{key}': {reason}")]
    KeyDecode { key: String, reason: String },

    #[error("Failed to parse {origin}: {source}")]
    Parse { origin: String, source: ParseError },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unknown config format for {} (expected .json, .yaml, .yml or .toml)", path.display())]
    UnknownFormat { path: PathBuf },

    #[error("Value conversion failed: {0}")]
    Value(#[from] ValueError),

    #[error("{0}")]
    Custom(String),

    #[error("{} decoding steps failed", .0.len())]
    Many(Vec<Error>),
}

impl Error {
    /// Build an error for a decoder-specific failure.
    pub fn custom(msg: impl Into<String>) -> Self {
        Error::Custom(msg.into())
    }
}

/// Malformed structured content, by format.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Other(String),
}
