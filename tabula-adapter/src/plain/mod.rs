//! Views over plain data: a table is an array of objects and a record is a single object.
//!
//! Plain data carries no format of its own. Field formats are inferred from values, unless a
//! format was declared through `add_field`, in which case the declared one wins.

mod infer;
mod record;
mod table;

pub(crate) use infer::*;
pub use record::*;
pub use table::*;
use tabula_error::{TabulaResult, tabula_bail};
use tabula_format::{FieldFormat, FieldName};

use crate::config::AdapterConfig;
use crate::raw::{RawArray, RawObject, RawValue};
use crate::{Adapter, AdapterKind, Record, Table};

/// Adapter over plain arrays of objects.
#[derive(Debug, Default)]
pub struct PlainAdapter {
    config: AdapterConfig,
}

impl PlainAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }
}

impl Adapter for PlainAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Plain
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn for_table(&self, raw: Option<RawValue>) -> TabulaResult<Box<dyn Table>> {
        let rows = match raw {
            None => RawArray::new(),
            Some(RawValue::Array(rows)) => rows,
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "expected an array of rows, got {}",
                other.type_name()
            ),
        };
        Ok(Box::new(PlainTable::new(rows)))
    }

    fn for_record(
        &self,
        raw: Option<RawValue>,
        _table: Option<&RawValue>,
    ) -> TabulaResult<Box<dyn Record>> {
        let object = match raw {
            None => RawObject::new(),
            Some(RawValue::Object(object)) => object,
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "expected an object, got {}",
                other.type_name()
            ),
        };
        Ok(Box::new(PlainRecord::new(object)))
    }

    /// Plain data has no key field convention.
    fn key_field(&self, _raw: &RawValue) -> TabulaResult<Option<FieldName>> {
        Ok(None)
    }
}

/// Formats declared through `add_field`, in declaration order.
#[derive(Debug, Default, Clone)]
struct DeclaredFormats(Vec<FieldFormat>);

impl DeclaredFormats {
    fn get(&self, name: &str) -> Option<&FieldFormat> {
        self.0.iter().find(|format| format.name().as_ref() == name)
    }

    fn declare(&mut self, format: &FieldFormat) {
        self.forget(format.name());
        self.0.push(format.clone());
    }

    fn forget(&mut self, name: &str) {
        self.0.retain(|format| format.name().as_ref() != name);
    }

    fn clear(&mut self) {
        self.0.clear();
    }

    fn names(&self) -> impl Iterator<Item = &FieldName> {
        self.0.iter().map(FieldFormat::name)
    }
}
