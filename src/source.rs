//! Key-value sources: stores that answer one canonical key at a time.
//!
//! A [`KvSource`] declares its naming policy (tag, transform, reducer) and
//! decodes a single key into a single leaf slot. [`KvDecoder`] turns any
//! source into a flow step by walking the destination's key map.

use std::any::type_name;
use std::sync::Arc;

use tracing::trace;

use crate::decoder::Decoder;
use crate::error::Error;
use crate::mapper::{FieldMapCache, KeyReducer, Mapper, MapperOptions, NameTransform};
use crate::shape::{self, Leaf, Record};
use crate::value::Value;

/// A store addressed by canonical keys.
pub trait KvSource {
    /// Write the value stored under `key` into `slot`.
    ///
    /// An absent key leaves `slot` untouched and is not an error.
    fn decode_key(&self, key: &str, slot: &mut dyn Leaf) -> Result<(), Error>;

    /// Tag consulted for name overrides. Empty means none.
    fn tag_name(&self) -> &str {
        ""
    }

    fn name_transform(&self) -> Option<NameTransform> {
        None
    }

    fn reducer(&self) -> Option<KeyReducer> {
        None
    }

    fn mapper_options(&self) -> MapperOptions {
        MapperOptions {
            tag: self.tag_name().to_string(),
            transform: self.name_transform(),
            reducer: self.reducer(),
        }
    }
}

/// Store `value` in `slot`, reporting a rejected value against `key`.
pub(crate) fn assign(key: &str, slot: &mut dyn Leaf, value: Value) -> Result<(), Error> {
    slot.set_value(value).map_err(|e| Error::KeyDecode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// Adapts a [`KvSource`] into a [`Decoder`] for any record type.
///
/// Keys are decoded in key-map order. The first failing key aborts the step;
/// fields decoded before it keep their new values.
#[derive(Debug, Clone)]
pub struct KvDecoder<S> {
    source: S,
    mapper: Mapper,
}

impl<S: KvSource> KvDecoder<S> {
    pub fn new(source: S) -> Self {
        Self::with_cache(source, Arc::new(FieldMapCache::new()))
    }

    /// Share key maps with other decoders through `cache`.
    pub fn with_cache(source: S, cache: Arc<FieldMapCache>) -> Self {
        let mapper = Mapper::with_cache(source.mapper_options(), cache);
        Self { source, mapper }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }
}

impl<T: Record, S: KvSource> Decoder<T> for KvDecoder<S> {
    fn decode(&self, config: &mut T) -> Result<(), Error> {
        let map = self.mapper.type_map::<T>()?;
        for (key, field) in map.iter() {
            let Some(slot) = shape::leaf_at_mut(&mut *config, &field.path) else {
                trace!(key, "no addressable slot");
                continue;
            };
            self.source.decode_key(key, slot)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("key-value source {}", type_name::<S>())
    }
}
