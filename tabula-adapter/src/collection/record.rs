use tabula_error::TabulaResult;
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::collection::RowEntityRef;
use crate::generic::GenericFormat;
use crate::raw::RawValue;
use crate::{AdapterKind, Record};

/// A record view over a [`crate::collection::RowEntity`].
#[derive(Debug)]
pub struct CollectionRecord {
    row: RowEntityRef,
    generic: GenericFormat,
}

impl CollectionRecord {
    pub fn new(row: RowEntityRef) -> Self {
        Self {
            row,
            generic: GenericFormat::default(),
        }
    }
}

impl Record for CollectionRecord {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Collection
    }

    fn data(&self) -> RawValue {
        RawValue::Entity(self.row.clone())
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        Ok(self.row.fields())
    }

    fn has(&self, name: &str) -> TabulaResult<bool> {
        Ok(self.row.has(name))
    }

    fn get(&self, name: &str) -> TabulaResult<Option<RawValue>> {
        Ok(self.row.get(name))
    }

    fn set(&mut self, name: &str, value: RawValue) -> TabulaResult<()> {
        self.row.set(name, value)
    }

    /// Removes the fields of the row's declared format. Values the row holds outside of its
    /// format are left alone.
    fn clear(&mut self) -> TabulaResult<()> {
        for name in self.row.fields() {
            self.row.remove_field(&name)?;
        }
        Ok(())
    }

    fn add_field(
        &mut self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()> {
        self.row.add_field(format, at, value)
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        self.row.remove_field(name)
    }

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()> {
        self.row.remove_field_at(index)
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        self.row.format(name)
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        let format = self.row.format(name)?;
        Ok(self.generic.share(&format))
    }

    fn try_clone(&self) -> Option<TabulaResult<Box<dyn Record>>> {
        Some(Ok(Box::new(CollectionRecord::new(self.row.duplicate()))))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabula_format::FieldType;

    use super::*;
    use crate::collection::MemoryRow;

    #[test]
    fn clear_keeps_undeclared_values() {
        let row = MemoryRow::new(vec![FieldFormat::new("id", FieldType::Integer)])
            .with_value("extra", RawValue::from("kept"));
        let mut record = CollectionRecord::new(Arc::new(row));

        record.clear().unwrap();
        assert!(record.fields().unwrap().is_empty());
        assert_eq!(record.get("extra").unwrap(), Some(RawValue::from("kept")));

        record.clear().unwrap();
        assert!(record.fields().unwrap().is_empty());
        assert!(record.has("extra").unwrap());
    }

    #[test]
    fn writes_reach_the_row() {
        let row: RowEntityRef = Arc::new(MemoryRow::new(vec![]));
        let mut record = CollectionRecord::new(row.clone());
        record.set("name", RawValue::from("a")).unwrap();
        record
            .add_field(&FieldFormat::new("id", FieldType::Integer), Some(0), Some(RawValue::from(7)))
            .unwrap();
        assert_eq!(row.get("id"), Some(RawValue::from(7)));
        assert_eq!(record.fields().unwrap()[0].as_ref(), "id");
        assert!(record.remove_field_at(2).is_err());
    }
}
