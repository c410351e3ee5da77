use std::fmt::{Debug, Formatter};

use tabula_error::TabulaResult;
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::cow::FirstWriteCallback;
use crate::raw::RawValue;
use crate::{AdapterKind, AdapterRef, Record};

/// A record view that copies the view it wraps before the first mutation.
pub struct CowRecord {
    adapter: AdapterRef,
    original: Box<dyn Record>,
    copy: Option<Box<dyn Record>>,
    on_first_write: Option<FirstWriteCallback>,
}

impl CowRecord {
    pub fn new(adapter: AdapterRef, original: Box<dyn Record>) -> Self {
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

    pub fn original(&self) -> &dyn Record {
        self.original.as_ref()
    }

    pub fn is_copied(&self) -> bool {
        self.copy.is_some()
    }

    fn view(&self) -> &dyn Record {
        match &self.copy {
            Some(copy) => copy.as_ref(),
            None => self.original.as_ref(),
        }
    }

    fn writable(&mut self) -> TabulaResult<&mut Box<dyn Record>> {
        let copy = match self.copy.take() {
            Some(copy) => copy,
            None => self.copy_original()?,
        };
        Ok(self.copy.insert(copy))
    }

    fn copy_original(&mut self) -> TabulaResult<Box<dyn Record>> {
        let copy = match self.original.try_clone() {
            Some(copy) => copy?,
            None => self
                .adapter
                .for_record(Some(self.original.data().deep_clone()), None)?,
        };
        log::debug!("copied {} record on first write", self.original.kind());
        if let Some(callback) = self.on_first_write.take() {
            callback();
        }
        Ok(copy)
    }
}

impl Debug for CowRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CowRecord")
            .field("view", &self.view())
            .field("copied", &self.is_copied())
            .finish_non_exhaustive()
    }
}

impl Record for CowRecord {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Cow
    }

    fn data(&self) -> RawValue {
        self.view().data()
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        self.view().fields()
    }

    fn has(&self, name: &str) -> TabulaResult<bool> {
        self.view().has(name)
    }

    fn get(&self, name: &str) -> TabulaResult<Option<RawValue>> {
        self.view().get(name)
    }

    fn set(&mut self, name: &str, value: RawValue) -> TabulaResult<()> {
        self.writable()?.set(name, value)
    }

    fn clear(&mut self) -> TabulaResult<()> {
        self.writable()?.clear()
    }

    fn add_field(
        &mut self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()> {
        self.writable()?.add_field(format, at, value)
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
