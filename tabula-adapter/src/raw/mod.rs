//! The physical payload behind tables and records.
//!
//! Containers ([`RawArray`], [`RawObject`]) are shared handles: cloning a [`RawValue`] clones the
//! handle, not the contents. A record view over a table row therefore writes through to the
//! table, and two views can be checked for referring to the very same data with
//! [`RawValue::ptr_eq`]. Use [`RawValue::deep_clone`] to obtain an independent copy.

mod array;
mod json;
mod object;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub use array::*;
pub use object::*;

use crate::aliases::hash_map::HashMap;
use crate::collection::{RowCollectionRef, RowEntityRef};

/// A dynamically typed value of a raw payload.
#[derive(Clone, Default)]
pub enum RawValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Arc<str>),
    Array(RawArray),
    Object(RawObject),
    /// An already materialized row entity
    Entity(RowEntityRef),
    /// An already materialized collection of row entities
    Collection(RowCollectionRef),
}

impl RawValue {
    /// A short name of the value's kind, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Bool(_) => "bool",
            RawValue::Int(_) => "int",
            RawValue::Float(_) => "float",
            RawValue::String(_) => "string",
            RawValue::Array(_) => "array",
            RawValue::Object(_) => "object",
            RawValue::Entity(_) => "entity",
            RawValue::Collection(_) => "collection",
        }
    }

    /// Returns `true` for [`RawValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Whether the value can hold nested values addressable by a path segment.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            RawValue::Array(_) | RawValue::Object(_) | RawValue::Entity(_)
        )
    }

    /// The boolean, if the value is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if the value is one. Floats are not truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as a float. Integers are widened, with a possible loss of precision.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            RawValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The string, if the value is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The array handle, if the value is an array. The handle shares the value's contents.
    pub fn as_array(&self) -> Option<&RawArray> {
        match self {
            RawValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The object handle, if the value is an object. The handle shares the value's contents.
    pub fn as_object(&self) -> Option<&RawObject> {
        match self {
            RawValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The row entity, if the value is one.
    pub fn as_entity(&self) -> Option<&RowEntityRef> {
        match self {
            RawValue::Entity(e) => Some(e),
            _ => None,
        }
    }

    /// The row collection, if the value is one.
    pub fn as_collection(&self) -> Option<&RowCollectionRef> {
        match self {
            RawValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same container (or entity), or equal scalars.
    pub fn ptr_eq(&self, other: &RawValue) -> bool {
        match (self, other) {
            (RawValue::Array(a), RawValue::Array(b)) => a.ptr_eq(b),
            (RawValue::Object(a), RawValue::Object(b)) => a.ptr_eq(b),
            (RawValue::Entity(a), RawValue::Entity(b)) => Arc::ptr_eq(a, b),
            (RawValue::Collection(a), RawValue::Collection(b)) => Arc::ptr_eq(a, b),
            (a, b) if !a.is_container() && !b.is_container() => a == b,
            _ => false,
        }
    }

    /// Copy the value and every array and object reachable from it.
    ///
    /// Sharing inside the value is preserved: a container reachable along two paths is copied
    /// once and the copy is reachable along both paths, which also makes cyclic values safe to
    /// copy. Entities and collections are opaque and copied by handle.
    pub fn deep_clone(&self) -> RawValue {
        let mut copies = HashMap::new();
        self.deep_clone_with(&mut copies)
    }

    pub(crate) fn deep_clone_with(&self, copies: &mut HashMap<usize, RawValue>) -> RawValue {
        match self {
            RawValue::Array(array) => RawValue::Array(array.deep_clone_with(copies)),
            RawValue::Object(object) => RawValue::Object(object.deep_clone_with(copies)),
            other => other.clone(),
        }
    }
}

/// Structural equality. Entities and collections compare by identity.
///
/// Comparing values containing cycles does not terminate.
impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RawValue::Null, RawValue::Null) => true,
            (RawValue::Bool(a), RawValue::Bool(b)) => a == b,
            (RawValue::Int(a), RawValue::Int(b)) => a == b,
            (RawValue::Float(a), RawValue::Float(b)) => a == b,
            (RawValue::String(a), RawValue::String(b)) => a == b,
            (RawValue::Array(a), RawValue::Array(b)) => a == b,
            (RawValue::Object(a), RawValue::Object(b)) => a == b,
            (RawValue::Entity(a), RawValue::Entity(b)) => Arc::ptr_eq(a, b),
            (RawValue::Collection(a), RawValue::Collection(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Debug for RawValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Null => f.write_str("null"),
            RawValue::Bool(b) => Debug::fmt(b, f),
            RawValue::Int(i) => Debug::fmt(i, f),
            RawValue::Float(v) => Debug::fmt(v, f),
            RawValue::String(s) => Debug::fmt(s, f),
            RawValue::Array(a) => Debug::fmt(a, f),
            RawValue::Object(o) => Debug::fmt(o, f),
            RawValue::Entity(e) => Debug::fmt(e, f),
            RawValue::Collection(c) => Debug::fmt(c, f),
        }
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.into())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value.into())
    }
}

impl From<RawArray> for RawValue {
    fn from(value: RawArray) -> Self {
        RawValue::Array(value)
    }
}

impl From<RawObject> for RawValue {
    fn from(value: RawObject) -> Self {
        RawValue::Object(value)
    }
}

impl From<RowEntityRef> for RawValue {
    fn from(value: RowEntityRef) -> Self {
        RawValue::Entity(value)
    }
}

impl From<RowCollectionRef> for RawValue {
    fn from(value: RowCollectionRef) -> Self {
        RawValue::Collection(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn clone_shares_containers() {
        let value = RawValue::from(json!({"a": [1, 2]}));
        let alias = value.clone();
        alias
            .as_object()
            .unwrap()
            .insert("b", RawValue::from(true));
        assert!(value.ptr_eq(&alias));
        assert_eq!(value.to_json(), json!({"a": [1, 2], "b": true}));
    }

    #[test]
    fn deep_clone_is_independent() {
        let value = RawValue::from(json!({"a": [1, 2]}));
        let copy = value.deep_clone();
        assert_eq!(copy, value);
        assert!(!copy.ptr_eq(&value));

        copy.as_object()
            .unwrap()
            .get("a")
            .unwrap()
            .as_array()
            .unwrap()
            .push(RawValue::from(3));
        assert_eq!(value.to_json(), json!({"a": [1, 2]}));
        assert_eq!(copy.to_json(), json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn deep_clone_preserves_sharing_and_cycles() {
        let shared = RawArray::from_iter([RawValue::from(1)]);
        let root = RawObject::new();
        root.insert("left", shared.clone().into());
        root.insert("right", shared.into());
        root.insert("me", root.clone().into());

        let RawValue::Object(copy) = RawValue::Object(root.clone()).deep_clone() else {
            unreachable!()
        };
        assert!(!copy.ptr_eq(&root));
        let left = copy.get("left").unwrap();
        let right = copy.get("right").unwrap();
        assert!(left.ptr_eq(&right));
        assert!(copy.get("me").unwrap().as_object().unwrap().ptr_eq(&copy));

        // Break the cycles so both graphs can be dropped.
        root.remove("me");
        copy.remove("me");
    }

    #[test]
    fn scalars_compare_by_value() {
        assert!(RawValue::from("a").ptr_eq(&RawValue::from("a")));
        assert!(!RawValue::from(1).ptr_eq(&RawValue::from(1.0)));
        assert!(!RawValue::from(json!([])).ptr_eq(&RawValue::from(json!([]))));
    }
}
