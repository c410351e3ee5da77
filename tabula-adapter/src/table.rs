use std::fmt::Debug;

use tabula_error::{TabulaResult, tabula_bail};
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::AdapterKind;
use crate::raw::RawValue;

/// Where [`Table::move_row`] places the moved row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Move the row to the front. Used when there is no row yet to place it before.
    Front,
    /// Insert the row at this position, counted after the row has been taken out.
    Position(usize),
}

/// A view of a table over raw data of a specific physical representation.
pub trait Table: Debug + Send + Sync {
    /// The kind of adapter which created the view.
    fn kind(&self) -> AdapterKind;

    /// The raw data backing the view. Containers are returned by handle, not copied.
    fn data(&self) -> RawValue;

    /// The names of the table's fields.
    fn fields(&self) -> TabulaResult<Vec<FieldName>>;

    /// The number of rows.
    fn count(&self) -> TabulaResult<usize>;

    /// The raw record at `index`, suitable for [`crate::Adapter::for_record`].
    fn at(&self, index: usize) -> TabulaResult<RawValue>;

    /// Insert a raw record at `at`, or append it when `at` is `None`.
    fn add(&mut self, record: RawValue, at: Option<usize>) -> TabulaResult<()>;

    fn remove(&mut self, index: usize) -> TabulaResult<()>;

    fn replace(&mut self, record: RawValue, index: usize) -> TabulaResult<()>;

    /// Move the row at `source` to `target`. Moving a row onto itself does nothing.
    fn move_row(&mut self, source: usize, target: MoveTarget) -> TabulaResult<()>;

    /// Overwrite the fields of the `acceptor` row with those of the `donor` row, except for
    /// `key_field` which keeps the acceptor's value, then remove the donor row.
    fn merge(&mut self, acceptor: usize, donor: usize, key_field: &str) -> TabulaResult<()>;

    /// Insert an independent copy of the row at `index` right after it and return the copy.
    fn copy(&mut self, index: usize) -> TabulaResult<RawValue>;

    /// Remove all rows.
    fn clear(&mut self) -> TabulaResult<()>;

    /// Add a field to the table and to every row, at position `at` or last.
    fn add_field(&mut self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()>;

    fn remove_field(&mut self, name: &str) -> TabulaResult<()>;

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()>;

    /// The format of the named field.
    fn format(&self, name: &str) -> TabulaResult<FieldFormat>;

    /// The format of the named field written into the view's reusable scratch record.
    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField>;

    /// An independent copy of the view, if the view knows how to copy itself.
    fn try_clone(&self) -> Option<TabulaResult<Box<dyn Table>>> {
        None
    }
}

/// Move an item within `items`, with the position rules of [`Table::move_row`].
pub(crate) fn move_within<T>(
    items: &mut Vec<T>,
    source: usize,
    target: MoveTarget,
) -> TabulaResult<()> {
    if source >= items.len() {
        tabula_bail!(IndexOutOfRange: source, 0, items.len());
    }
    let target = match target {
        MoveTarget::Front => 0,
        MoveTarget::Position(target) => {
            if target >= items.len() {
                tabula_bail!(IndexOutOfRange: target, 0, items.len());
            }
            target
        }
    };
    if source == target {
        return Ok(());
    }
    let item = items.remove(source);
    items.insert(target, item);
    Ok(())
}

/// Check that `acceptor` and `donor` name two distinct rows out of `count`.
pub(crate) fn check_merge(acceptor: usize, donor: usize, count: usize) -> TabulaResult<()> {
    if acceptor >= count {
        tabula_bail!(IndexOutOfRange: acceptor, 0, count);
    }
    if donor >= count {
        tabula_bail!(IndexOutOfRange: donor, 0, count);
    }
    if acceptor == donor {
        tabula_bail!("cannot merge row {} into itself", acceptor);
    }
    Ok(())
}
