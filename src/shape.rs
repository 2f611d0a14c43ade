//! Record shapes: the descriptors the field mapper walks.
//!
//! Rust has no runtime struct reflection, so every destination type describes
//! itself by implementing [`Record`]:
//!
//! - [`Record::shape`] returns the ordered field list with declared names,
//!   tags, and the embedded flag. Composite fields point at the nested type's
//!   shape through a function, so a type graph that loops back on itself can
//!   be described and then rejected by the mapper instead of recursing forever.
//! - [`Record::field`] / [`Record::field_mut`] hand out a single field by its
//!   declared index, either as a terminal [`Leaf`] slot or as a nested record.
//!
//! A field location is the sequence of indices from the root to a leaf
//! ([`FieldPath`]); [`leaf_at`] and [`leaf_at_mut`] resolve it on a live
//! instance. The [`record!`](crate::record) macro writes the impl for plain
//! structs.

use std::any::{TypeId, type_name};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::value::{self, Value, ValueError};

/// Indices from the root record down to one field.
pub type FieldPath = Vec<usize>;

/// Produces the shape of a nested record type.
pub type ShapeFn = fn() -> RecordShape;

/// Ordered field layout of one record type.
#[derive(Debug, Clone)]
pub struct RecordShape {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldShape>,
}

impl RecordShape {
    pub fn new<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Field indices follow the order of `field` calls.
    pub fn field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }
}

/// One declared field of a record.
#[derive(Debug, Clone)]
pub struct FieldShape {
    name: &'static str,
    tags: Vec<(&'static str, &'static str)>,
    embedded: bool,
    exported: bool,
    nested: Option<ShapeFn>,
}

impl FieldShape {
    /// A terminal field holding a single value.
    pub fn leaf(name: &'static str) -> Self {
        Self {
            name,
            tags: Vec::new(),
            embedded: false,
            exported: true,
            nested: None,
        }
    }

    /// A named sub-record; its keys are composed under this field's name.
    pub fn nested<T: Record>(name: &'static str) -> Self {
        Self {
            nested: Some(T::shape),
            ..Self::leaf(name)
        }
    }

    /// An embedded sub-record; its fields join the parent's key space.
    pub fn embedded<T: Record>(name: &'static str) -> Self {
        Self {
            embedded: true,
            ..Self::nested::<T>(name)
        }
    }

    /// A field with no addressable storage. It never produces a key.
    pub fn private(name: &'static str) -> Self {
        Self {
            exported: false,
            ..Self::leaf(name)
        }
    }

    /// Attach a tag, e.g. `.tag("env", "DATABASE_URL")`.
    pub fn tag(mut self, tag: &'static str, value: &'static str) -> Self {
        self.tags.push((tag, value));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_embedded(&self) -> bool {
        self.embedded
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    pub fn nested_shape(&self) -> Option<RecordShape> {
        self.nested.map(|shape| shape())
    }

    /// Raw value of tag `tag`. An empty tag name never matches.
    pub fn tag_value(&self, tag: &str) -> Option<&'static str> {
        if tag.is_empty() {
            return None;
        }
        self.tags
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|(_, value)| *value)
    }
}

/// A record whose fields can be addressed by declared index.
pub trait Record: 'static {
    fn shape() -> RecordShape
    where
        Self: Sized;

    fn field(&self, index: usize) -> Option<FieldRef<'_>>;

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

impl<T: Record> Record for Box<T> {
    fn shape() -> RecordShape {
        T::shape()
    }

    fn field(&self, index: usize) -> Option<FieldRef<'_>> {
        (**self).field(index)
    }

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
        (**self).field_mut(index)
    }
}

pub enum FieldRef<'a> {
    Leaf(&'a dyn Leaf),
    Record(&'a dyn Record),
}

pub enum FieldMut<'a> {
    Leaf(&'a mut dyn Leaf),
    Record(&'a mut dyn Record),
}

/// A terminal field slot: read as a [`Value`], overwritten from one.
///
/// Implemented for every `Serialize + DeserializeOwned` type. A failed
/// `set_value` leaves the slot unchanged.
pub trait Leaf {
    fn to_value(&self) -> Result<Value, ValueError>;

    fn set_value(&mut self, value: Value) -> Result<(), ValueError>;
}

impl<T: Serialize + DeserializeOwned> Leaf for T {
    fn to_value(&self) -> Result<Value, ValueError> {
        value::to_value(self)
    }

    fn set_value(&mut self, value: Value) -> Result<(), ValueError> {
        *self = value::from_value(value)?;
        Ok(())
    }
}

/// Resolve `path` to a leaf for reading.
pub fn leaf_at<'a>(record: &'a dyn Record, path: &[usize]) -> Option<&'a dyn Leaf> {
    let (&index, rest) = path.split_first()?;
    match record.field(index)? {
        FieldRef::Leaf(leaf) if rest.is_empty() => Some(leaf),
        FieldRef::Record(inner) => leaf_at(inner, rest),
        FieldRef::Leaf(_) => None,
    }
}

/// Resolve `path` to a leaf for writing.
pub fn leaf_at_mut<'a>(record: &'a mut dyn Record, path: &[usize]) -> Option<&'a mut dyn Leaf> {
    let (&index, rest) = path.split_first()?;
    match record.field_mut(index)? {
        FieldMut::Leaf(leaf) if rest.is_empty() => Some(leaf),
        FieldMut::Record(inner) => leaf_at_mut(inner, rest),
        FieldMut::Leaf(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{B, D};

    #[test]
    fn shape_lists_fields_in_declared_order() {
        let shape = D::shape();
        let names: Vec<&str> = shape.fields().iter().map(FieldShape::name).collect();
        assert_eq!(names, vec!["B", "N", "Nested", "Embedded"]);
        assert!(shape.fields()[0].is_embedded());
        assert!(!shape.fields()[2].is_embedded());
        assert!(shape.fields()[1].nested_shape().is_none());
        assert_eq!(shape.type_id(), TypeId::of::<D>());
    }

    #[test]
    fn tag_lookup() {
        let field = FieldShape::leaf("Port").tag("env", "PORT").tag("json", "port");
        assert_eq!(field.tag_value("json"), Some("port"));
        assert_eq!(field.tag_value("yaml"), None);
        assert_eq!(field.tag_value(""), None);
    }

    #[test]
    fn private_field_is_not_exported() {
        assert!(!FieldShape::private("secret").is_exported());
        assert!(FieldShape::leaf("open").is_exported());
    }

    #[test]
    fn resolve_nested_path() {
        let mut d = D::default();
        d.b.n = 7;
        let leaf = leaf_at(&d, &[0, 0]).unwrap();
        assert_eq!(leaf.to_value().unwrap(), Value::from(7));

        let slot = leaf_at_mut(&mut d, &[2, 1]).unwrap();
        slot.set_value(Value::from(30)).unwrap();
        assert_eq!(d.nested.n, 30);
    }

    #[test]
    fn path_into_leaf_or_past_end_is_none() {
        let d = D::default();
        assert!(leaf_at(&d, &[1, 0]).is_none());
        assert!(leaf_at(&d, &[9]).is_none());
        assert!(leaf_at(&d, &[]).is_none());
        // A path that stops at a composite field is not a leaf.
        assert!(leaf_at(&d, &[0]).is_none());
    }

    #[test]
    fn failed_set_leaves_slot_untouched() {
        let mut b = B { n: 5 };
        let slot = leaf_at_mut(&mut b, &[0]).unwrap();
        assert!(slot.set_value(Value::String("five".into())).is_err());
        assert_eq!(b.n, 5);
    }
}
