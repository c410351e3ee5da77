use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;
use tabula_error::{TabulaResult, tabula_bail};

use crate::aliases::hash_map::HashMap;
use crate::field_index::FieldIndexSlot;
use crate::raw::RawValue;

/// A shared, mutable array of raw values.
#[derive(Clone, Default)]
pub struct RawArray(Arc<ArrayInner>);

#[derive(Default)]
struct ArrayInner {
    items: RwLock<Vec<RawValue>>,
    // Only populated when the array is used as a columnar descriptor list.
    field_index: FieldIndexSlot,
}

impl RawArray {
    /// The largest number of nulls [`RawArray::set_padded`] inserts to reach an index.
    pub const MAX_PADDING: usize = 1 << 16;

    /// A new empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// A new array holding `items`.
    pub fn from_vec(items: Vec<RawValue>) -> Self {
        Self(Arc::new(ArrayInner {
            items: RwLock::new(items),
            field_index: FieldIndexSlot::default(),
        }))
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.0.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.items.read().is_empty()
    }

    /// The item at `index`, `None` if out of range. Containers are returned by handle.
    pub fn get(&self, index: usize) -> Option<RawValue> {
        self.0.items.read().get(index).cloned()
    }

    /// Replace the item at `index`, which must lie within `[0, len)`.
    pub fn set(&self, index: usize, value: RawValue) -> TabulaResult<()> {
        let mut items = self.0.items.write();
        let len = items.len();
        match items.get_mut(index) {
            Some(item) => *item = value,
            None => tabula_bail!(IndexOutOfRange: index, 0, len),
        }
        Ok(())
    }

    /// Replace the item at `index`, growing the array with nulls if it is too short.
    ///
    /// At most [`RawArray::MAX_PADDING`] nulls are added, an index further out of range fails
    /// with `IndexOutOfRange` and leaves the array as it was.
    pub fn set_padded(&self, index: usize, value: RawValue) -> TabulaResult<()> {
        let mut items = self.0.items.write();
        let len = items.len();
        if index.saturating_sub(len) > Self::MAX_PADDING {
            tabula_bail!(IndexOutOfRange: index, 0, len + Self::MAX_PADDING + 1);
        }
        if len <= index {
            items.resize(index + 1, RawValue::Null);
        }
        items[index] = value;
        Ok(())
    }

    /// Append an item.
    pub fn push(&self, value: RawValue) {
        self.0.items.write().push(value);
    }

    /// Insert an item at `index`, which must lie within `[0, len]`.
    pub fn insert(&self, index: usize, value: RawValue) -> TabulaResult<()> {
        let mut items = self.0.items.write();
        if index > items.len() {
            tabula_bail!(IndexOutOfRange: index, 0, items.len() + 1);
        }
        items.insert(index, value);
        Ok(())
    }

    /// Remove the item at `index`, which must lie within `[0, len)`.
    pub fn remove(&self, index: usize) -> TabulaResult<RawValue> {
        let mut items = self.0.items.write();
        if index >= items.len() {
            tabula_bail!(IndexOutOfRange: index, 0, items.len());
        }
        Ok(items.remove(index))
    }

    /// Remove every item.
    pub fn clear(&self) {
        self.0.items.write().clear();
    }

    /// A snapshot of the items. Containers in the snapshot are still shared.
    pub fn to_vec(&self) -> Vec<RawValue> {
        self.0.items.read().clone()
    }

    /// Mutate the items in place while holding the write lock.
    ///
    /// The closure must not access this array through another handle.
    pub fn update<R, F: FnOnce(&mut Vec<RawValue>) -> R>(&self, f: F) -> R {
        f(&mut self.0.items.write())
    }

    /// Returns `true` if both handles refer to the same array.
    pub fn ptr_eq(&self, other: &RawArray) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy the array and everything reachable from it, see [`RawValue::deep_clone`].
    pub fn deep_clone(&self) -> RawArray {
        let mut copies = HashMap::new();
        self.deep_clone_with(&mut copies)
    }

    pub(crate) fn deep_clone_with(&self, copies: &mut HashMap<usize, RawValue>) -> RawArray {
        if let Some(RawValue::Array(done)) = copies.get(&self.addr()) {
            return done.clone();
        }
        let copy = RawArray::new();
        copies.insert(self.addr(), RawValue::Array(copy.clone()));
        let items = self
            .to_vec()
            .iter()
            .map(|item| item.deep_clone_with(copies))
            .collect::<Vec<_>>();
        copy.update(|copied| *copied = items);
        copy
    }

    /// An identifier of the array that is stable while any handle to it is alive.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub(crate) fn field_index(&self) -> &FieldIndexSlot {
        &self.0.field_index
    }
}

impl FromIterator<RawValue> for RawArray {
    fn from_iter<T: IntoIterator<Item = RawValue>>(iter: T) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl PartialEq for RawArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.items.read() == *other.0.items.read()
    }
}

impl Debug for RawArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.items.read().iter()).finish()
    }
}
