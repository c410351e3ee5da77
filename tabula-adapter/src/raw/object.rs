use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tabula_error::{TabulaResult, tabula_bail};
use tabula_format::FieldName;

use crate::aliases::hash_map::HashMap;
use crate::columnar::FormatMark;
use crate::raw::RawValue;

/// A shared, mutable map of raw values which keeps its keys in insertion order.
#[derive(Clone, Default)]
pub struct RawObject(Arc<ObjectInner>);

#[derive(Default)]
struct ObjectInner {
    entries: RwLock<Vec<(FieldName, RawValue)>>,
    // Set once the format graph engine has visited the node.
    mark: Mutex<Option<FormatMark>>,
}

impl RawObject {
    /// A new empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new object holding `entries` in order. A repeated key keeps its first position and
    /// its last value.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<FieldName>,
        I: IntoIterator<Item = (K, RawValue)>,
    {
        let object = RawObject::new();
        for (key, value) in entries {
            object.insert(key, value);
        }
        object
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.0.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.entries.read().is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.entries.read().iter().any(|(k, _)| k.as_ref() == key)
    }

    /// The value of `key`. Containers are returned by handle.
    pub fn get(&self, key: &str) -> Option<RawValue> {
        self.0
            .entries
            .read()
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.clone())
    }

    /// The position of a key in insertion order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.0
            .entries
            .read()
            .iter()
            .position(|(k, _)| k.as_ref() == key)
    }

    /// Set the value of a key. An existing key keeps its position, a new key is appended.
    pub fn insert<K: Into<FieldName>>(&self, key: K, value: RawValue) -> Option<RawValue> {
        let key = key.into();
        let mut entries = self.0.entries.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                entries.push((key, value));
                None
            }
        }
    }

    /// Insert a new key at position `index`, which must lie within `[0, len]`.
    pub fn insert_at<K: Into<FieldName>>(
        &self,
        index: usize,
        key: K,
        value: RawValue,
    ) -> TabulaResult<()> {
        let key = key.into();
        let mut entries = self.0.entries.write();
        if entries.iter().any(|(k, _)| *k == key) {
            tabula_bail!(DuplicateField: "{}", key);
        }
        if index > entries.len() {
            tabula_bail!(IndexOutOfRange: index, 0, entries.len() + 1);
        }
        entries.insert(index, (key, value));
        Ok(())
    }

    /// Remove `key`, returning its value. Later keys move up one position.
    pub fn remove(&self, key: &str) -> Option<RawValue> {
        let mut entries = self.0.entries.write();
        let index = entries.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(entries.remove(index).1)
    }

    /// The keys in insertion order.
    pub fn keys(&self) -> Vec<FieldName> {
        self.0.entries.read().iter().map(|(k, _)| k.clone()).collect()
    }

    /// A snapshot of the entries. Containers in the snapshot are still shared.
    pub fn entries(&self) -> Vec<(FieldName, RawValue)> {
        self.0.entries.read().clone()
    }

    /// The key and value at position `index` in insertion order.
    pub fn entry_at(&self, index: usize) -> Option<(FieldName, RawValue)> {
        self.0.entries.read().get(index).cloned()
    }

    pub fn clear(&self) {
        self.0.entries.write().clear();
    }

    /// Returns `true` if both handles refer to the same object.
    pub fn ptr_eq(&self, other: &RawObject) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy the object and everything reachable from it, see [`RawValue::deep_clone`].
    ///
    /// The copy carries no format graph marks.
    pub fn deep_clone(&self) -> RawObject {
        let mut copies = HashMap::new();
        self.deep_clone_with(&mut copies)
    }

    pub(crate) fn deep_clone_with(&self, copies: &mut HashMap<usize, RawValue>) -> RawObject {
        if let Some(RawValue::Object(done)) = copies.get(&self.addr()) {
            return done.clone();
        }
        let copy = RawObject::new();
        copies.insert(self.addr(), RawValue::Object(copy.clone()));
        let entries = self
            .entries()
            .into_iter()
            .map(|(key, value)| (key, value.deep_clone_with(copies)))
            .collect::<Vec<_>>();
        *copy.0.entries.write() = entries;
        copy
    }

    /// An identifier of the object that is stable while any handle to it is alive.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn mark(&self) -> Option<FormatMark> {
        self.0.mark.lock().clone()
    }

    pub(crate) fn set_mark(&self, mark: FormatMark) {
        *self.0.mark.lock() = Some(mark);
    }
}

/// Objects are equal when they hold the same keys with equal values, regardless of key order.
impl PartialEq for RawObject {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let lhs = self.entries();
        let rhs = other.entries();
        lhs.len() == rhs.len()
            && lhs.iter().all(|(key, value)| {
                rhs.iter()
                    .find(|(k, _)| k == key)
                    .is_some_and(|(_, v)| v == value)
            })
    }
}

impl Debug for RawObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.0.entries.read().iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_kept() {
        let object = RawObject::from_entries([("b", RawValue::from(1)), ("a", RawValue::from(2))]);
        object.insert("b", RawValue::from(3));
        object.insert_at(0, "c", RawValue::Null).unwrap();
        assert_eq!(
            object.keys().iter().map(|k| k.as_ref()).collect::<Vec<_>>(),
            vec!["c", "b", "a"]
        );
        assert_eq!(object.get("b"), Some(RawValue::from(3)));
        assert_eq!(object.position("a"), Some(2));
    }

    #[test]
    fn insert_at_rejects_existing_key() {
        let object = RawObject::from_entries([("a", RawValue::Null)]);
        assert!(object.insert_at(0, "a", RawValue::Null).is_err());
        assert!(object.insert_at(3, "b", RawValue::Null).is_err());
    }

    #[test]
    fn equality_ignores_key_order() {
        let lhs = RawObject::from_entries([("a", RawValue::from(1)), ("b", RawValue::from(2))]);
        let rhs = RawObject::from_entries([("b", RawValue::from(2)), ("a", RawValue::from(1))]);
        assert_eq!(lhs, rhs);
        rhs.remove("a");
        assert_ne!(lhs, rhs);
    }
}
