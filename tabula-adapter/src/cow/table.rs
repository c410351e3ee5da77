use std::fmt::{Debug, Formatter};

use tabula_error::TabulaResult;
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::cow::FirstWriteCallback;
use crate::raw::RawValue;
use crate::table::MoveTarget;
use crate::{AdapterKind, AdapterRef, Table};

/// A table view that copies the view it wraps before the first mutation.
pub struct CowTable {
    adapter: AdapterRef,
    original: Box<dyn Table>,
    copy: Option<Box<dyn Table>>,
    on_first_write: Option<FirstWriteCallback>,
}

impl CowTable {
    /// Wrap `original`, a view created by `adapter`. Views without a cloning capability are
    /// copied by rebuilding them with `adapter` over a deep copy of their data.
    pub fn new(adapter: AdapterRef, original: Box<dyn Table>) -> Self {
        Self {
            adapter,
            original,
            copy: None,
            on_first_write: None,
        }
    }

    pub fn with_first_write(self, callback: FirstWriteCallback) -> Self {
        self.with_callback(Some(callback))
    }

    pub(crate) fn with_callback(mut self, callback: Option<FirstWriteCallback>) -> Self {
        self.on_first_write = callback;
        self
    }

    /// The wrapped view as it was before any copy. It is never mutated through this view.
    pub fn original(&self) -> &dyn Table {
        self.original.as_ref()
    }

    pub fn is_copied(&self) -> bool {
        self.copy.is_some()
    }

    fn view(&self) -> &dyn Table {
        match &self.copy {
            Some(copy) => copy.as_ref(),
            None => self.original.as_ref(),
        }
    }

    /// The view to mutate, copying the original first if this is the first write.
    fn writable(&mut self) -> TabulaResult<&mut Box<dyn Table>> {
        let copy = match self.copy.take() {
            Some(copy) => copy,
            None => self.copy_original()?,
        };
        Ok(self.copy.insert(copy))
    }

    fn copy_original(&mut self) -> TabulaResult<Box<dyn Table>> {
        let copy = match self.original.try_clone() {
            Some(copy) => copy?,
            None => self
                .adapter
                .for_table(Some(self.original.data().deep_clone()))?,
        };
        log::debug!("copied {} table on first write", self.original.kind());
        if let Some(callback) = self.on_first_write.take() {
            callback();
        }
        Ok(copy)
    }
}

impl Debug for CowTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CowTable")
            .field("view", &self.view())
            .field("copied", &self.is_copied())
            .finish_non_exhaustive()
    }
}

impl Table for CowTable {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Cow
    }

    fn data(&self) -> RawValue {
        self.view().data()
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        self.view().fields()
    }

    fn count(&self) -> TabulaResult<usize> {
        self.view().count()
    }

    fn at(&self, index: usize) -> TabulaResult<RawValue> {
        self.view().at(index)
    }

    fn add(&mut self, record: RawValue, at: Option<usize>) -> TabulaResult<()> {
        self.writable()?.add(record, at)
    }

    fn remove(&mut self, index: usize) -> TabulaResult<()> {
        self.writable()?.remove(index)
    }

    fn replace(&mut self, record: RawValue, index: usize) -> TabulaResult<()> {
        self.writable()?.replace(record, index)
    }

    fn move_row(&mut self, source: usize, target: MoveTarget) -> TabulaResult<()> {
        self.writable()?.move_row(source, target)
    }

    fn merge(&mut self, acceptor: usize, donor: usize, key_field: &str) -> TabulaResult<()> {
        self.writable()?.merge(acceptor, donor, key_field)
    }

    fn copy(&mut self, index: usize) -> TabulaResult<RawValue> {
        self.writable()?.copy(index)
    }

    fn clear(&mut self) -> TabulaResult<()> {
        self.writable()?.clear()
    }

    fn add_field(&mut self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()> {
        self.writable()?.add_field(format, at)
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        self.writable()?.remove_field(name)
    }

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()> {
        self.writable()?.remove_field_at(index)
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        self.view().format(name)
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        match &mut self.copy {
            Some(copy) => copy.shared_format(name),
            None => self.original.shared_format(name),
        }
    }
}
