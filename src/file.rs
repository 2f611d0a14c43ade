//! File and in-memory document steps.
//!
//! [`FileDecoder`] reads one file and lays its content over the destination
//! (see [`unmarshal`](crate::unmarshal)). The format is either given up front
//! or detected from the extension when the step runs. A missing file is an
//! error unless the decoder is marked [`optional`](FileDecoder::optional), in
//! which case it is silently skipped. Other I/O errors (permissions, etc.) are
//! always propagated.
//!
//! [`BytesDecoder`] does the same for content already in memory.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::decoder::Decoder;
use crate::error::Error;
use crate::types::Format;
use crate::unmarshal::{self, Unmarshaller};
use crate::value::Value;

/// Reads and parses one configuration file.
pub struct FileDecoder {
    path: PathBuf,
    unmarshaller: Option<Box<dyn Unmarshaller>>,
    optional: bool,
}

impl FileDecoder {
    /// Parse `path` with an explicit unmarshaller.
    pub fn new(path: impl Into<PathBuf>, unmarshaller: impl Unmarshaller + 'static) -> Self {
        Self {
            path: path.into(),
            unmarshaller: Some(Box::new(unmarshaller)),
            optional: false,
        }
    }

    /// Pick the [`Format`] from the file extension when the step runs.
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            unmarshaller: None,
            optional: false,
        }
    }

    /// Skip the step when the file does not exist.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    fn parse(&self, bytes: &[u8]) -> Result<Value, Error> {
        let parsed = match &self.unmarshaller {
            Some(unmarshaller) => unmarshaller.unmarshal(bytes),
            None => {
                let format = Format::from_path(&self.path).ok_or_else(|| Error::UnknownFormat {
                    path: self.path.clone(),
                })?;
                format.unmarshal(bytes)
            }
        };
        parsed.map_err(|source| Error::Parse {
            origin: self.path.display().to_string(),
            source,
        })
    }
}

impl fmt::Debug for FileDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDecoder")
            .field("path", &self.path)
            .field("detect", &self.unmarshaller.is_none())
            .field("optional", &self.optional)
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> Decoder<T> for FileDecoder {
    fn decode(&self, config: &mut T) -> Result<(), Error> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound && self.optional => {
                debug!(path = %self.path.display(), "optional config file not found, skipping");
                return Ok(());
            }
            Err(e) => {
                return Err(Error::Io {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        debug!(path = %self.path.display(), bytes = bytes.len(), "read config file");
        let overlay = self.parse(&bytes)?;
        unmarshal::merge_into(overlay, config)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Parses a document held in memory.
pub struct BytesDecoder {
    label: String,
    bytes: Vec<u8>,
    unmarshaller: Box<dyn Unmarshaller>,
}

impl BytesDecoder {
    /// `label` names the content in error messages.
    pub fn new(
        label: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        unmarshaller: impl Unmarshaller + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            bytes: bytes.into(),
            unmarshaller: Box::new(unmarshaller),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for BytesDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BytesDecoder")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned> Decoder<T> for BytesDecoder {
    fn decode(&self, config: &mut T) -> Result<(), Error> {
        let overlay = self
            .unmarshaller
            .unmarshal(&self.bytes)
            .map_err(|source| Error::Parse {
                origin: self.label.clone(),
                source,
            })?;
        unmarshal::merge_into(overlay, config)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{AppConfig, Cfg};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn yaml_file_detected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "app.yaml", "host: 0.0.0.0\ndatabase:\n  pool_size: 12\n");
        let mut config = AppConfig::default();
        FileDecoder::detect(&path).decode(&mut config).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.pool_size, 12);
    }

    #[test]
    fn json_and_toml_files_detected() {
        let dir = TempDir::new().unwrap();
        let json = write(&dir, "app.json", r#"{"port": 9000}"#);
        let toml = write(&dir, "app.toml", "debug = true\n");
        let mut config = AppConfig::default();
        FileDecoder::detect(&json).decode(&mut config).unwrap();
        FileDecoder::detect(&toml).decode(&mut config).unwrap();
        assert_eq!(config.port, 9000);
        assert!(config.debug);
    }

    #[test]
    fn explicit_format_ignores_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "settings.conf", "str1: from-yaml\n");
        let mut cfg = Cfg::defaults();
        FileDecoder::new(&path, Format::Yaml).decode(&mut cfg).unwrap();
        assert_eq!(cfg.str1, "from-yaml");
    }

    #[test]
    fn unknown_extension_is_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "settings.ini", "a = 1\n");
        let mut cfg = Cfg::defaults();
        let err = FileDecoder::detect(&path).decode(&mut cfg).unwrap_err();
        assert!(matches!(err, Error::UnknownFormat { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.yaml");
        let mut cfg = Cfg::defaults();
        let err = FileDecoder::detect(&path).decode(&mut cfg).unwrap_err();
        match err {
            Error::Io { path: p, source } => {
                assert_eq!(p, path);
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_missing_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let decoder = FileDecoder::detect(dir.path().join("absent.yaml")).optional();
        assert!(decoder.is_optional());
        let mut cfg = Cfg::defaults();
        decoder.decode(&mut cfg).unwrap();
        assert_eq!(cfg, Cfg::defaults());
    }

    #[test]
    fn optional_does_not_hide_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.json", "{ not json");
        let mut cfg = Cfg::defaults();
        let err = FileDecoder::detect(&path)
            .optional()
            .decode(&mut cfg)
            .unwrap_err();
        match err {
            Error::Parse { origin, .. } => assert!(origin.ends_with("bad.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn directory_is_io_error_even_when_optional() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Cfg::defaults();
        let err = FileDecoder::new(dir.path(), Format::Yaml)
            .optional()
            .decode(&mut cfg)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn bytes_decoder() {
        let decoder = BytesDecoder::new("inline", "number: 99\nflag: false\n", Format::Yaml);
        let mut cfg = Cfg::defaults();
        decoder.decode(&mut cfg).unwrap();
        assert_eq!(cfg.number, 99);
        assert!(!cfg.flag);
        assert_eq!(Decoder::<Cfg>::describe(&decoder), "inline");
    }

    #[test]
    fn bytes_decoder_labels_parse_errors() {
        let decoder = BytesDecoder::new("inline", "{", Format::Json);
        let mut cfg = Cfg::defaults();
        let err = decoder.decode(&mut cfg).unwrap_err();
        assert!(err.to_string().contains("inline"));
    }
}
