use tabula_format::{FieldFormat, UniversalField};

/// The reusable scratch record behind `shared_format` queries.
///
/// Every view owns one and overwrites it on each query instead of allocating a new record.
#[derive(Debug, Default)]
pub(crate) struct GenericFormat {
    scratch: UniversalField,
}

impl GenericFormat {
    pub(crate) fn share(&mut self, format: &FieldFormat) -> &UniversalField {
        self.scratch.assign(format);
        &self.scratch
    }
}
