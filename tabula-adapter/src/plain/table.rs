use itertools::Itertools;
use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::generic::GenericFormat;
use crate::plain::{DeclaredFormats, infer_format};
use crate::raw::{RawArray, RawObject, RawValue};
use crate::table::{MoveTarget, check_merge, move_within};
use crate::{AdapterKind, Table};

/// A table view over an array of objects.
#[derive(Debug)]
pub struct PlainTable {
    rows: RawArray,
    declared: DeclaredFormats,
    generic: GenericFormat,
}

impl PlainTable {
    pub fn new(rows: RawArray) -> Self {
        Self {
            rows,
            declared: DeclaredFormats::default(),
            generic: GenericFormat::default(),
        }
    }

    fn row(&self, index: usize) -> TabulaResult<RawObject> {
        match self.rows.get(index) {
            Some(RawValue::Object(row)) => Ok(row),
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "row {} is {}, not an object",
                index,
                other.type_name()
            ),
            None => tabula_bail!(IndexOutOfRange: index, 0, self.rows.len()),
        }
    }

    fn all_rows(&self) -> TabulaResult<Vec<RawObject>> {
        (0..self.rows.len()).map(|index| self.row(index)).collect()
    }
}

fn object(record: RawValue) -> TabulaResult<RawValue> {
    match record {
        RawValue::Object(_) => Ok(record),
        other => tabula_bail!(
            InvalidPayloadShape: "expected an object, got {}",
            other.type_name()
        ),
    }
}

impl Table for PlainTable {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Plain
    }

    fn data(&self) -> RawValue {
        RawValue::Array(self.rows.clone())
    }

    /// The keys of all rows in order of first appearance, then declared fields no row holds.
    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        let rows = self.all_rows()?;
        Ok(rows
            .iter()
            .flat_map(RawObject::keys)
            .chain(self.declared.names().cloned())
            .unique()
            .collect())
    }

    fn count(&self) -> TabulaResult<usize> {
        Ok(self.rows.len())
    }

    fn at(&self, index: usize) -> TabulaResult<RawValue> {
        self.rows
            .get(index)
            .ok_or_else(|| tabula_err!(IndexOutOfRange: index, 0, self.rows.len()))
    }

    fn add(&mut self, record: RawValue, at: Option<usize>) -> TabulaResult<()> {
        let record = object(record)?;
        self.rows.insert(at.unwrap_or_else(|| self.rows.len()), record)
    }

    fn remove(&mut self, index: usize) -> TabulaResult<()> {
        self.rows.remove(index).map(|_| ())
    }

    fn replace(&mut self, record: RawValue, index: usize) -> TabulaResult<()> {
        self.rows.set(index, object(record)?)
    }

    fn move_row(&mut self, source: usize, target: MoveTarget) -> TabulaResult<()> {
        self.rows.update(|rows| move_within(rows, source, target))
    }

    fn merge(&mut self, acceptor: usize, donor: usize, key_field: &str) -> TabulaResult<()> {
        check_merge(acceptor, donor, self.rows.len())?;
        let acceptor = self.row(acceptor)?;
        for (name, value) in self.row(donor)?.entries() {
            if name.as_ref() != key_field {
                acceptor.insert(name, value);
            }
        }
        self.rows.remove(donor).map(|_| ())
    }

    fn copy(&mut self, index: usize) -> TabulaResult<RawValue> {
        let copy = RawValue::Object(self.row(index)?.deep_clone());
        self.rows.insert(index + 1, copy.clone())?;
        Ok(copy)
    }

    fn clear(&mut self) -> TabulaResult<()> {
        self.rows.clear();
        Ok(())
    }

    /// Adds the field to every row. `at` is a position among the table's fields and is clamped
    /// to the length of each row.
    fn add_field(&mut self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()> {
        let fields = self.fields()?;
        if fields.contains(format.name()) {
            tabula_bail!(DuplicateField: "{}", format.name());
        }
        let at = at.unwrap_or(fields.len());
        if at > fields.len() {
            tabula_bail!(IndexOutOfRange: at, 0, fields.len() + 1);
        }
        let value = RawValue::from(format.default_value());
        for row in self.all_rows()? {
            row.insert_at(at.min(row.len()), format.name().clone(), value.deep_clone())?;
        }
        self.declared.declare(format);
        Ok(())
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        if !self.fields()?.iter().any(|field| field.as_ref() == name) {
            tabula_bail!(FieldNotFound: "{}", name);
        }
        for row in self.all_rows()? {
            row.remove(name);
        }
        self.declared.forget(name);
        Ok(())
    }

    fn remove_field_at(&mut self, _index: usize) -> TabulaResult<()> {
        tabula_bail!(UnsupportedOperation: "plain tables have no positional field order")
    }

    /// The declared format of the field, or one inferred from the first row holding a value
    /// for it that is not null.
    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        if let Some(format) = self.declared.get(name) {
            return Ok(format.clone());
        }
        let mut found = None;
        for row in self.all_rows()? {
            match row.get(name) {
                Some(value) if !value.is_null() => return Ok(infer_format(name, &value)),
                Some(value) => found = Some(value),
                None => {}
            }
        }
        found
            .map(|value| infer_format(name, &value))
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        let format = self.format(name)?;
        Ok(self.generic.share(&format))
    }
}
