use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::decoder::Decoder;
use crate::env::EnvSource;
use crate::error::Error;
use crate::file::{BytesDecoder, FileDecoder};
use crate::flow::Flow;
use crate::mapper::FieldMapCache;
use crate::shape::Record;
use crate::source::{KvDecoder, KvSource};
use crate::structs::StructSource;
use crate::types::Format;

/// Builder for assembling a [`Flow`] step by step.
///
/// Steps run in the order they are added, each overriding the ones before:
///
/// ```ignore
/// let config = Flow::builder(AppConfig::default())
///     .optional_file("/etc/myapp/config.yaml")
///     .optional_file("myapp.toml")
///     .env_prefix("MYAPP")
///     .load()?;
/// ```
///
/// Key-value steps added through the builder share one [`FieldMapCache`].
pub struct FlowBuilder<T> {
    defaults: T,
    steps: Vec<Box<dyn Decoder<T>>>,
    fail_fast: bool,
    cache: Arc<FieldMapCache>,
}

impl<T> FlowBuilder<T> {
    pub fn new(defaults: T) -> Self {
        Self {
            defaults,
            steps: Vec::new(),
            fail_fast: true,
            cache: Arc::new(FieldMapCache::new()),
        }
    }

    /// Add any decoder, including closures.
    pub fn step(mut self, step: impl Decoder<T> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Use `cache` for key-value steps added after this call.
    pub fn cache(mut self, cache: Arc<FieldMapCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Stop at the first failing step (default: `true`).
    /// When `false`, [`load`](Self::load) runs every step and reports all failures.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn build(self) -> Flow<T> {
        Flow::with_steps(self.defaults, self.steps)
    }

    /// Run the flow and return the final configuration.
    ///
    /// Fail-fast reports the first error; otherwise all errors come back
    /// together as [`Error::Many`].
    pub fn load(self) -> Result<T, Error> {
        let fail_fast = self.fail_fast;
        let mut flow = self.build();
        let mut errors = flow.run(fail_fast);
        if errors.is_empty() {
            return Ok(flow.into_config());
        }
        if fail_fast {
            return Err(errors.remove(0));
        }
        Err(Error::Many(errors))
    }
}

impl<T: Record> FlowBuilder<T> {
    /// Add a key-value source step.
    pub fn kv_source<S: KvSource + 'static>(self, source: S) -> Self {
        let step = KvDecoder::with_cache(source, Arc::clone(&self.cache));
        self.step(step)
    }

    /// Read unprefixed process environment variables.
    pub fn env(self) -> Self {
        self.env_source(EnvSource::new())
    }

    /// Read process environment variables named `{prefix}_{KEY}`.
    pub fn env_prefix(self, prefix: &str) -> Self {
        self.env_source(EnvSource::new().prefix(prefix))
    }

    pub fn env_source(self, source: EnvSource) -> Self {
        self.kv_source(source)
    }

    /// Copy values from another record, translating `src_tag` names to `dst_tag` names.
    ///
    /// `src` is read now, not when the flow runs.
    pub fn record<S: Record>(self, src: &S, src_tag: &str, dst_tag: &str) -> Result<Self, Error> {
        let source = StructSource::new(src, src_tag, dst_tag)?;
        Ok(self.kv_source(source))
    }
}

impl<T: Serialize + DeserializeOwned> FlowBuilder<T> {
    /// A file whose format is detected from its extension.
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.step(FileDecoder::detect(path))
    }

    /// Like [`file`](Self::file), skipped when the file does not exist.
    pub fn optional_file(self, path: impl Into<PathBuf>) -> Self {
        self.step(FileDecoder::detect(path).optional())
    }

    pub fn json_file(self, path: impl Into<PathBuf>) -> Self {
        self.step(FileDecoder::new(path, Format::Json))
    }

    pub fn yaml_file(self, path: impl Into<PathBuf>) -> Self {
        self.step(FileDecoder::new(path, Format::Yaml))
    }

    pub fn toml_file(self, path: impl Into<PathBuf>) -> Self {
        self.step(FileDecoder::new(path, Format::Toml))
    }

    /// An in-memory document, e.g. one embedded with `include_str!`.
    pub fn bytes(self, label: &str, bytes: impl Into<Vec<u8>>, format: Format) -> Self {
        self.step(BytesDecoder::new(label, bytes, format))
    }
}
