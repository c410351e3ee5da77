use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::collection::{RowCollectionRef, RowEntityRef};
use crate::generic::GenericFormat;
use crate::raw::RawValue;
use crate::table::{MoveTarget, check_merge};
use crate::{AdapterKind, Table};

/// A table view over a [`crate::collection::RowCollection`].
#[derive(Debug)]
pub struct CollectionTable {
    rows: RowCollectionRef,
    generic: GenericFormat,
}

impl CollectionTable {
    pub fn new(rows: RowCollectionRef) -> Self {
        Self {
            rows,
            generic: GenericFormat::default(),
        }
    }

    fn row(&self, index: usize) -> TabulaResult<RowEntityRef> {
        self.rows
            .at(index)
            .ok_or_else(|| tabula_err!(IndexOutOfRange: index, 0, self.rows.count()))
    }
}

fn entity(record: RawValue) -> TabulaResult<RowEntityRef> {
    match record {
        RawValue::Entity(row) => Ok(row),
        other => tabula_bail!(
            InvalidPayloadShape: "expected a row entity, got {}",
            other.type_name()
        ),
    }
}

impl Table for CollectionTable {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Collection
    }

    fn data(&self) -> RawValue {
        RawValue::Collection(self.rows.clone())
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        Ok(self.rows.fields())
    }

    fn count(&self) -> TabulaResult<usize> {
        Ok(self.rows.count())
    }

    fn at(&self, index: usize) -> TabulaResult<RawValue> {
        self.row(index).map(RawValue::Entity)
    }

    fn add(&mut self, record: RawValue, at: Option<usize>) -> TabulaResult<()> {
        self.rows.add(entity(record)?, at)
    }

    fn remove(&mut self, index: usize) -> TabulaResult<()> {
        self.rows.remove_at(index).map(|_| ())
    }

    fn replace(&mut self, record: RawValue, index: usize) -> TabulaResult<()> {
        self.rows.replace(entity(record)?, index)
    }

    fn move_row(&mut self, source: usize, target: MoveTarget) -> TabulaResult<()> {
        self.rows.move_row(source, target)
    }

    fn merge(&mut self, acceptor: usize, donor: usize, key_field: &str) -> TabulaResult<()> {
        check_merge(acceptor, donor, self.rows.count())?;
        let acceptor = self.row(acceptor)?;
        let donor_row = self.row(donor)?;
        for name in donor_row.fields() {
            if name.as_ref() != key_field {
                acceptor.set(&name, donor_row.get(&name).unwrap_or_default())?;
            }
        }
        self.rows.remove_at(donor).map(|_| ())
    }

    fn copy(&mut self, index: usize) -> TabulaResult<RawValue> {
        let copy = self.row(index)?.duplicate();
        self.rows.add(copy.clone(), Some(index + 1))?;
        Ok(RawValue::Entity(copy))
    }

    fn clear(&mut self) -> TabulaResult<()> {
        self.rows.clear();
        Ok(())
    }

    fn add_field(&mut self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()> {
        self.rows.add_field(format, at)
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        self.rows.remove_field(name)
    }

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()> {
        self.rows.remove_field_at(index)
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        self.rows.format(name)
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        let format = self.rows.format(name)?;
        Ok(self.generic.share(&format))
    }

    fn try_clone(&self) -> Option<TabulaResult<Box<dyn Table>>> {
        Some(Ok(Box::new(CollectionTable::new(self.rows.duplicate()))))
    }
}
