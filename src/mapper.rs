//! The field mapper: canonical key → field location tables.
//!
//! [`map_shape`] walks a [`RecordShape`] breadth-first, root first, visiting
//! each record's fields in declared order, and assigns every reachable leaf a
//! canonical key:
//!
//! - **Base name.** The field's tag under [`MapperOptions::tag`] (the part
//!   before any `,`) if present; otherwise the declared name run through the
//!   [`NameTransform`]. A tag of `-` drops the field and everything below it.
//! - **Composition.** A named sub-record prefixes its descendants with its own
//!   base name through the [`KeyReducer`]. An embedded sub-record passes its
//!   parent's prefix straight through, so its fields appear as if declared on
//!   the parent. Without a reducer no composition happens at all and every
//!   leaf keeps its own base name.
//! - **Shadowing.** When two leaves produce the same key, the one declared on
//!   the shallower record keeps it. Between leaves at the same depth the one
//!   visited later wins.
//!
//! A composite field whose type already appears on the path from the root is
//! a cycle and fails the whole mapping with [`Error::CyclicShape`].
//!
//! Shape-level maps are pure functions of `(type, options)`, so [`Mapper`]
//! caches them in a [`FieldMapCache`]. Resolving a map entry to an actual
//! field happens per instance through the stored [`FieldPath`].

use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::error::Error;
use crate::shape::{self, FieldPath, FieldShape, Leaf, Record, RecordShape};
use crate::value::Value;

/// Tag value that excludes a field from every map.
pub const EXCLUDE_TAG: &str = "-";

/// Transform applied to declared field names that carry no tag override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameTransform {
    Upper,
    Lower,
    Custom(fn(&str) -> String),
}

impl NameTransform {
    pub fn apply(&self, name: &str) -> String {
        match self {
            NameTransform::Upper => name.to_uppercase(),
            NameTransform::Lower => name.to_lowercase(),
            NameTransform::Custom(f) => f(name),
        }
    }
}

/// Combines a parent key with a child's base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyReducer {
    /// `parent` + `child`
    Concat,
    /// `parent` + delimiter + `child`
    Delimited(String),
    /// Like `Delimited`, with the result uppercased.
    UpperDelimited(String),
    Custom(fn(&str, &str) -> String),
}

impl KeyReducer {
    pub fn delimited(delimiter: impl Into<String>) -> Self {
        KeyReducer::Delimited(delimiter.into())
    }

    pub fn reduce(&self, parent: &str, child: &str) -> String {
        match self {
            KeyReducer::Concat => format!("{parent}{child}"),
            KeyReducer::Delimited(d) => format!("{parent}{d}{child}"),
            KeyReducer::UpperDelimited(d) => format!("{parent}{d}{child}").to_uppercase(),
            KeyReducer::Custom(f) => f(parent, child),
        }
    }
}

/// Naming policy for one mapping. Doubles as the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MapperOptions {
    /// Tag consulted for name overrides. Empty disables tag lookup.
    pub tag: String,
    pub transform: Option<NameTransform>,
    pub reducer: Option<KeyReducer>,
}

impl MapperOptions {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn transform(mut self, transform: NameTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn reducer(mut self, reducer: KeyReducer) -> Self {
        self.reducer = Some(reducer);
        self
    }

    /// `None` when the field is excluded.
    fn base_name(&self, field: &FieldShape) -> Option<String> {
        let tagged = field
            .tag_value(&self.tag)
            .map(|raw| raw.split(',').next().unwrap_or_default());
        match tagged {
            Some(EXCLUDE_TAG) => None,
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => Some(match &self.transform {
                Some(transform) => transform.apply(field.name()),
                None => field.name().to_string(),
            }),
        }
    }

    fn compose(&self, prefix: &str, base: &str) -> String {
        match &self.reducer {
            Some(reducer) if !prefix.is_empty() => reducer.reduce(prefix, base),
            _ => base.to_string(),
        }
    }
}

/// Where a key lives: the index path and the depth of the declaring record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedField {
    pub path: FieldPath,
    pub depth: usize,
}

/// Canonical key → field location, in first-registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMap {
    fields: IndexMap<String, MappedField>,
}

impl TypeMap {
    pub fn get(&self, key: &str) -> Option<&MappedField> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MappedField)> {
        self.fields.iter().map(|(key, field)| (key.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn register(&mut self, key: String, path: FieldPath, depth: usize) {
        if let Some(existing) = self.fields.get_mut(&key) {
            if existing.depth < depth {
                trace!(key = %key, ?path, "key shadowed by shallower field");
                return;
            }
            trace!(key = %key, ?path, "key reassigned to later field");
            *existing = MappedField { path, depth };
            return;
        }
        self.fields.insert(key, MappedField { path, depth });
    }
}

struct Pending {
    shape: RecordShape,
    path: FieldPath,
    prefix: String,
    depth: usize,
    ancestors: Vec<TypeId>,
}

/// Compute the key map for `shape` under `options`. No caching.
pub fn map_shape(shape: &RecordShape, options: &MapperOptions) -> Result<TypeMap, Error> {
    let mut map = TypeMap::default();
    let mut queue = VecDeque::new();
    queue.push_back(Pending {
        shape: shape.clone(),
        path: Vec::new(),
        prefix: String::new(),
        depth: 0,
        ancestors: vec![shape.type_id()],
    });

    while let Some(current) = queue.pop_front() {
        for (index, field) in current.shape.fields().iter().enumerate() {
            if !field.is_exported() {
                continue;
            }
            let Some(base) = options.base_name(field) else {
                continue;
            };

            let mut path = current.path.clone();
            path.push(index);

            match field.nested_shape() {
                Some(nested) => {
                    if current.ancestors.contains(&nested.type_id()) {
                        return Err(Error::CyclicShape {
                            type_name: nested.type_name(),
                            field: field.name(),
                        });
                    }
                    let prefix = if field.is_embedded() {
                        current.prefix.clone()
                    } else {
                        options.compose(&current.prefix, &base)
                    };
                    let mut ancestors = current.ancestors.clone();
                    ancestors.push(nested.type_id());
                    queue.push_back(Pending {
                        shape: nested,
                        path,
                        prefix,
                        depth: current.depth + 1,
                        ancestors,
                    });
                }
                None => {
                    let key = options.compose(&current.prefix, &base);
                    map.register(key, path, current.depth);
                }
            }
        }
    }

    Ok(map)
}

/// Shared, lazily filled store of shape-level maps keyed by type and options.
///
/// Create one per process (or per test) and hand it to every [`Mapper`] that
/// should share work. The first request for a given key builds the map while
/// holding the write lock, so concurrent first use builds it once.
#[derive(Debug, Default)]
pub struct FieldMapCache {
    maps: RwLock<HashMap<(TypeId, MapperOptions), Arc<TypeMap>>>,
}

impl FieldMapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build<T: Record>(&self, options: &MapperOptions) -> Result<Arc<TypeMap>, Error> {
        let key = (TypeId::of::<T>(), options.clone());
        if let Some(map) = self
            .maps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(map));
        }

        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = maps.get(&key) {
            return Ok(Arc::clone(map));
        }
        let shape = T::shape();
        let map = Arc::new(map_shape(&shape, options)?);
        debug!(record = shape.type_name(), keys = map.len(), "built field map");
        maps.insert(key, Arc::clone(&map));
        Ok(map)
    }

    pub fn clear(&self) {
        self.maps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Maps records under one [`MapperOptions`] policy.
#[derive(Debug, Clone)]
pub struct Mapper {
    options: MapperOptions,
    cache: Arc<FieldMapCache>,
}

impl Mapper {
    /// A mapper with its own private cache.
    pub fn new(options: MapperOptions) -> Self {
        Self::with_cache(options, Arc::new(FieldMapCache::new()))
    }

    pub fn with_cache(options: MapperOptions, cache: Arc<FieldMapCache>) -> Self {
        Self { options, cache }
    }

    pub fn options(&self) -> &MapperOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<FieldMapCache> {
        &self.cache
    }

    /// The key map of `T`, built once per cache.
    pub fn type_map<T: Record>(&self) -> Result<Arc<TypeMap>, Error> {
        self.cache.get_or_build::<T>(&self.options)
    }

    /// The key map of an explicit shape, bypassing the cache.
    pub fn map_shape(&self, shape: &RecordShape) -> Result<TypeMap, Error> {
        map_shape(shape, &self.options)
    }

    /// Read every mapped leaf of `record` as a [`Value`].
    pub fn value_map<T: Record>(&self, record: &T) -> Result<IndexMap<String, Value>, Error> {
        let map = self.type_map::<T>()?;
        let mut values = IndexMap::with_capacity(map.len());
        for (key, field) in map.iter() {
            if let Some(leaf) = shape::leaf_at(record, &field.path) {
                values.insert(key.to_string(), leaf.to_value()?);
            }
        }
        Ok(values)
    }

    pub fn field_by_name<'a, T: Record>(
        &self,
        record: &'a T,
        key: &str,
    ) -> Result<Option<&'a dyn Leaf>, Error> {
        let map = self.type_map::<T>()?;
        Ok(map
            .get(key)
            .and_then(|field| shape::leaf_at(record, &field.path)))
    }

    pub fn field_by_name_mut<'a, T: Record>(
        &self,
        record: &'a mut T,
        key: &str,
    ) -> Result<Option<&'a mut dyn Leaf>, Error> {
        let map = self.type_map::<T>()?;
        Ok(match map.get(key) {
            Some(field) => shape::leaf_at_mut(record, &field.path),
            None => None,
        })
    }
}
