//! Copy-on-write views.
//!
//! A copy-on-write view reads straight from the view it wraps, which may share its raw data
//! with any number of other views. The first mutation replaces the wrapped view with an
//! independent copy, and every mutation from then on goes to the copy.

mod record;
mod table;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub use record::*;
pub use table::*;
use tabula_error::TabulaResult;
use tabula_format::FieldName;

use crate::config::AdapterConfig;
use crate::raw::RawValue;
use crate::{Adapter, AdapterKind, AdapterRef, Record, Table};

/// Called the first time a copy-on-write view copies its data.
pub type FirstWriteCallback = Arc<dyn Fn() + Send + Sync>;

/// Decorates another adapter so that every view it creates copies its data on first write.
#[derive(Clone)]
pub struct CowAdapter {
    original: AdapterRef,
    on_first_write: Option<FirstWriteCallback>,
}

impl CowAdapter {
    pub fn new(original: AdapterRef) -> Self {
        Self {
            original,
            on_first_write: None,
        }
    }

    /// Run `callback` when a view created by this adapter copies its data. Each view runs it at
    /// most once.
    pub fn with_first_write<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_first_write = Some(Arc::new(callback));
        self
    }

    /// The decorated adapter.
    pub fn original(&self) -> &AdapterRef {
        &self.original
    }
}

impl Debug for CowAdapter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CowAdapter")
            .field("original", &self.original)
            .field("on_first_write", &self.on_first_write.is_some())
            .finish()
    }
}

impl Adapter for CowAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Cow
    }

    fn config(&self) -> &AdapterConfig {
        self.original.config()
    }

    fn for_table(&self, raw: Option<RawValue>) -> TabulaResult<Box<dyn Table>> {
        let view = self.original.for_table(raw)?;
        Ok(Box::new(
            CowTable::new(self.original.clone(), view).with_callback(self.on_first_write.clone()),
        ))
    }

    fn for_record(
        &self,
        raw: Option<RawValue>,
        table: Option<&RawValue>,
    ) -> TabulaResult<Box<dyn Record>> {
        let view = self.original.for_record(raw, table)?;
        Ok(Box::new(
            CowRecord::new(self.original.clone(), view).with_callback(self.on_first_write.clone()),
        ))
    }

    fn key_field(&self, raw: &RawValue) -> TabulaResult<Option<FieldName>> {
        self.original.key_field(raw)
    }
}
