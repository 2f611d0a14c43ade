use indexmap::IndexMap;

use crate::error::Error;
use crate::mapper::{KeyReducer, Mapper, MapperOptions};
use crate::shape::{Leaf, Record};
use crate::source::{self, KvSource};
use crate::value::Value;

const DELIMITER: &str = ".";

/// Another record as a key-value source.
///
/// The source record is read once, at construction, under
/// `{tag: src_tag, reducer: "."}`. Destinations are mapped under `dst_tag`
/// with the same reducer, so a field tagged `e.N` on the destination picks up
/// `N` of the source sub-record keyed `e`.
#[derive(Debug, Clone)]
pub struct StructSource {
    dst_tag: String,
    values: IndexMap<String, Value>,
}

impl StructSource {
    pub fn new<S: Record>(src: &S, src_tag: &str, dst_tag: &str) -> Result<Self, Error> {
        let mapper = Mapper::new(
            MapperOptions::new(src_tag).reducer(KeyReducer::delimited(DELIMITER)),
        );
        Ok(Self {
            dst_tag: dst_tag.to_string(),
            values: mapper.value_map(src)?,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl KvSource for StructSource {
    fn decode_key(&self, key: &str, slot: &mut dyn Leaf) -> Result<(), Error> {
        match self.values.get(key) {
            Some(value) => source::assign(key, slot, value.clone()),
            None => Ok(()),
        }
    }

    fn tag_name(&self) -> &str {
        &self.dst_tag
    }

    fn reducer(&self) -> Option<KeyReducer> {
        Some(KeyReducer::delimited(DELIMITER))
    }
}
