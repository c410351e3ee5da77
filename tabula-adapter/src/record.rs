use std::fmt::Debug;

use tabula_error::TabulaResult;
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::AdapterKind;
use crate::raw::RawValue;

/// A view of a single record over raw data of a specific physical representation.
pub trait Record: Debug + Send + Sync {
    /// The kind of adapter which created the view.
    fn kind(&self) -> AdapterKind;

    /// The raw data backing the view. Containers are returned by handle, not copied.
    fn data(&self) -> RawValue;

    fn fields(&self) -> TabulaResult<Vec<FieldName>>;

    fn has(&self, name: &str) -> TabulaResult<bool> {
        Ok(self.fields()?.iter().any(|field| field.as_ref() == name))
    }

    /// The value of the named field, or `None` if the record has no such field.
    fn get(&self, name: &str) -> TabulaResult<Option<RawValue>>;

    fn set(&mut self, name: &str, value: RawValue) -> TabulaResult<()>;

    /// Remove every field the view can set.
    fn clear(&mut self) -> TabulaResult<()>;

    /// Add a field at position `at` or last, holding `value` or the format's default value.
    fn add_field(
        &mut self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()>;

    fn remove_field(&mut self, name: &str) -> TabulaResult<()>;

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()>;

    /// The format of the named field.
    fn format(&self, name: &str) -> TabulaResult<FieldFormat>;

    /// The format of the named field written into the view's reusable scratch record.
    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField>;

    /// An independent copy of the view, if the view knows how to copy itself.
    fn try_clone(&self) -> Option<TabulaResult<Box<dyn Record>>> {
        None
    }
}
