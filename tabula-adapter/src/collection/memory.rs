use std::sync::Arc;

use parking_lot::RwLock;
use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldFormat, FieldName};

use crate::collection::{
    RowCollection, RowCollectionRef, RowEntity, RowEntityRef, RowFactory, RowFactoryRef,
};
use crate::plain::infer_format;
use crate::raw::{RawObject, RawValue};
use crate::table::{MoveTarget, move_within};

fn position_of(formats: &[FieldFormat], name: &str) -> Option<usize> {
    formats.iter().position(|format| format.name().as_ref() == name)
}

/// A row entity held entirely in memory.
///
/// Besides the fields of its declared format the row may hold extra values, which are readable
/// but not part of [`RowEntity::fields`].
#[derive(Debug, Default)]
pub struct MemoryRow {
    formats: RwLock<Vec<FieldFormat>>,
    values: RawObject,
}

impl MemoryRow {
    /// A row declaring `formats`, every field holding its default value.
    pub fn new(formats: Vec<FieldFormat>) -> Self {
        let values = RawObject::from_entries(
            formats
                .iter()
                .map(|format| (format.name().clone(), RawValue::from(format.default_value()))),
        );
        Self {
            formats: RwLock::new(formats),
            values,
        }
    }

    /// Store a value without declaring a field for it.
    pub fn with_value<N: Into<FieldName>>(self, name: N, value: RawValue) -> Self {
        self.values.insert(name, value);
        self
    }

    /// The values of the row, declared and extra.
    pub fn values(&self) -> &RawObject {
        &self.values
    }
}

impl RowEntity for MemoryRow {
    fn fields(&self) -> Vec<FieldName> {
        self.formats
            .read()
            .iter()
            .map(|format| format.name().clone())
            .collect()
    }

    fn has(&self, name: &str) -> bool {
        self.values.contains_key(name) || position_of(&self.formats.read(), name).is_some()
    }

    fn get(&self, name: &str) -> Option<RawValue> {
        self.values.get(name)
    }

    fn set(&self, name: &str, value: RawValue) -> TabulaResult<()> {
        if !self.has(name) {
            self.formats.write().push(infer_format(name, &value));
        }
        self.values.insert(name, value);
        Ok(())
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        let formats = self.formats.read();
        position_of(&formats, name)
            .map(|position| formats[position].clone())
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))
    }

    fn add_field(
        &self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()> {
        let mut formats = self.formats.write();
        if position_of(&formats, format.name()).is_some() {
            tabula_bail!(DuplicateField: "{}", format.name());
        }
        let at = at.unwrap_or(formats.len());
        if at > formats.len() {
            tabula_bail!(IndexOutOfRange: at, 0, formats.len() + 1);
        }
        formats.insert(at, format.clone());
        self.values.insert(
            format.name().clone(),
            value.unwrap_or_else(|| RawValue::from(format.default_value())),
        );
        Ok(())
    }

    fn remove_field(&self, name: &str) -> TabulaResult<()> {
        let mut formats = self.formats.write();
        let position =
            position_of(&formats, name).ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))?;
        formats.remove(position);
        self.values.remove(name);
        Ok(())
    }

    fn remove_field_at(&self, index: usize) -> TabulaResult<()> {
        let mut formats = self.formats.write();
        if index >= formats.len() {
            tabula_bail!(IndexOutOfRange: index, 0, formats.len());
        }
        let format = formats.remove(index);
        self.values.remove(format.name());
        Ok(())
    }

    fn duplicate(&self) -> RowEntityRef {
        Arc::new(MemoryRow {
            formats: RwLock::new(self.formats.read().clone()),
            values: self.values.deep_clone(),
        })
    }
}

/// A collection of rows held entirely in memory.
#[derive(Debug)]
pub struct MemoryRowSet {
    formats: RwLock<Vec<FieldFormat>>,
    rows: RwLock<Vec<RowEntityRef>>,
    key_field: Option<FieldName>,
    factory: RowFactoryRef,
}

impl Default for MemoryRowSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryRowSet {
    pub fn new(formats: Vec<FieldFormat>) -> Self {
        Self {
            formats: RwLock::new(formats),
            rows: RwLock::new(Vec::new()),
            key_field: None,
            factory: Arc::new(MemoryRowFactory),
        }
    }

    pub fn with_key_field<N: Into<FieldName>>(mut self, name: N) -> Self {
        self.key_field = Some(name.into());
        self
    }

    pub fn with_factory(mut self, factory: RowFactoryRef) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_rows<I: IntoIterator<Item = RowEntityRef>>(self, rows: I) -> Self {
        self.rows.write().extend(rows);
        self
    }
}

impl RowCollection for MemoryRowSet {
    fn count(&self) -> usize {
        self.rows.read().len()
    }

    fn at(&self, index: usize) -> Option<RowEntityRef> {
        self.rows.read().get(index).cloned()
    }

    fn add(&self, row: RowEntityRef, at: Option<usize>) -> TabulaResult<()> {
        let mut rows = self.rows.write();
        let at = at.unwrap_or(rows.len());
        if at > rows.len() {
            tabula_bail!(IndexOutOfRange: at, 0, rows.len() + 1);
        }
        rows.insert(at, row);
        Ok(())
    }

    fn remove_at(&self, index: usize) -> TabulaResult<RowEntityRef> {
        let mut rows = self.rows.write();
        if index >= rows.len() {
            tabula_bail!(IndexOutOfRange: index, 0, rows.len());
        }
        Ok(rows.remove(index))
    }

    fn replace(&self, row: RowEntityRef, index: usize) -> TabulaResult<()> {
        let mut rows = self.rows.write();
        let len = rows.len();
        match rows.get_mut(index) {
            Some(existing) => *existing = row,
            None => tabula_bail!(IndexOutOfRange: index, 0, len),
        }
        Ok(())
    }

    fn move_row(&self, source: usize, target: MoveTarget) -> TabulaResult<()> {
        move_within(&mut self.rows.write(), source, target)
    }

    fn clear(&self) {
        self.rows.write().clear();
    }

    fn fields(&self) -> Vec<FieldName> {
        self.formats
            .read()
            .iter()
            .map(|format| format.name().clone())
            .collect()
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        let formats = self.formats.read();
        position_of(&formats, name)
            .map(|position| formats[position].clone())
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))
    }

    fn add_field(&self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()> {
        let mut formats = self.formats.write();
        if position_of(&formats, format.name()).is_some() {
            tabula_bail!(DuplicateField: "{}", format.name());
        }
        let at = at.unwrap_or(formats.len());
        if at > formats.len() {
            tabula_bail!(IndexOutOfRange: at, 0, formats.len() + 1);
        }
        formats.insert(at, format.clone());
        for row in self.rows.read().iter() {
            let row_at = at.min(row.fields().len());
            row.add_field(format, Some(row_at), None)?;
        }
        Ok(())
    }

    fn remove_field(&self, name: &str) -> TabulaResult<()> {
        let mut formats = self.formats.write();
        let position =
            position_of(&formats, name).ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))?;
        formats.remove(position);
        for row in self.rows.read().iter() {
            if row.fields().iter().any(|field| field.as_ref() == name) {
                row.remove_field(name)?;
            }
        }
        Ok(())
    }

    fn remove_field_at(&self, index: usize) -> TabulaResult<()> {
        let name = {
            let formats = self.formats.read();
            match formats.get(index) {
                Some(format) => format.name().clone(),
                None => tabula_bail!(IndexOutOfRange: index, 0, formats.len()),
            }
        };
        self.remove_field(&name)
    }

    fn key_field(&self) -> Option<FieldName> {
        self.key_field.clone()
    }

    fn factory(&self) -> RowFactoryRef {
        self.factory.clone()
    }

    fn duplicate(&self) -> RowCollectionRef {
        Arc::new(MemoryRowSet {
            formats: RwLock::new(self.formats.read().clone()),
            rows: RwLock::new(self.rows.read().iter().map(|row| row.duplicate()).collect()),
            key_field: self.key_field.clone(),
            factory: self.factory.clone(),
        })
    }
}

/// Creates [`MemoryRow`]s and [`MemoryRowSet`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryRowFactory;

impl RowFactory for MemoryRowFactory {
    fn create_row(&self, formats: &[FieldFormat]) -> RowEntityRef {
        Arc::new(MemoryRow::new(formats.to_vec()))
    }

    fn create_collection(&self) -> RowCollectionRef {
        Arc::new(MemoryRowSet::default())
    }
}
