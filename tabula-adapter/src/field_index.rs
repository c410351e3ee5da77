//! Field name to position lookups over columnar descriptor lists.
//!
//! The index lives inside the descriptor list handle it was built from, so views sharing one
//! list share one index and a view that swaps in a new list starts from an empty one. An index
//! whose recorded length differs from the live list is rebuilt on the next lookup, which covers
//! mutations made through other handles to the same list.

use parking_lot::Mutex;
use tabula_error::{TabulaResult, tabula_err};
use tabula_format::FieldName;

use crate::aliases::hash_map::HashMap;
use crate::raw::{RawArray, RawValue};

/// Positional access to named fields.
pub trait FieldIndexed {
    /// The names of all fields in positional order.
    fn field_names(&self) -> Vec<FieldName>;

    /// The position of the named field, if present.
    fn field_position(&self, name: &str) -> Option<usize>;

    /// The position of the named field, failing with `FieldNotFound` if it is absent.
    fn require_position(&self, name: &str) -> TabulaResult<usize> {
        self.field_position(name)
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))
    }
}

#[derive(Debug)]
struct FieldIndex {
    len: usize,
    positions: HashMap<FieldName, usize>,
}

/// The lazily built index slot carried by every [`RawArray`].
#[derive(Debug, Default)]
pub(crate) struct FieldIndexSlot(Mutex<Option<FieldIndex>>);

impl FieldIndexSlot {
    fn position(&self, descriptors: &RawArray, name: &str) -> Option<usize> {
        let live_len = descriptors.len();
        let mut slot = self.0.lock();
        if slot.as_ref().is_none_or(|index| index.len != live_len) {
            log::trace!("building field index over {live_len} descriptors");
            let positions = descriptors
                .to_vec()
                .iter()
                .enumerate()
                .filter_map(|(position, descriptor)| {
                    descriptor_name(descriptor).map(|name| (name, position))
                })
                .rev()
                .collect();
            *slot = Some(FieldIndex {
                len: live_len,
                positions,
            });
        }
        slot.as_ref()
            .and_then(|index| index.positions.get(name).copied())
    }

    /// Drop the index so the next lookup rebuilds it.
    pub(crate) fn invalidate(&self) {
        *self.0.lock() = None;
    }

    #[cfg(test)]
    pub(crate) fn is_built(&self) -> bool {
        self.0.lock().is_some()
    }
}

/// The `n` member of a raw descriptor.
pub(crate) fn descriptor_name(descriptor: &RawValue) -> Option<FieldName> {
    descriptor
        .as_object()?
        .get("n")?
        .as_str()
        .map(FieldName::from)
}

impl FieldIndexed for RawArray {
    fn field_names(&self) -> Vec<FieldName> {
        self.to_vec().iter().filter_map(descriptor_name).collect()
    }

    fn field_position(&self, name: &str) -> Option<usize> {
        self.field_index().position(self, name)
    }
}
