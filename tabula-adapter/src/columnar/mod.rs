//! Views over the columnar wire format.
//!
//! A columnar record is `{d: values, s: descriptors, _type: "record"}` and a columnar table is
//! `{d: rows, s: descriptors, _type: "recordset"}`, where every row is an array of values
//! positioned like the descriptors. Instead of `s` a node may carry `f`, the id of a descriptor
//! list defined elsewhere in the same payload, see [`denormalize_formats`].

mod graph;
mod node;
mod record;
mod table;

pub use graph::{FormatId, denormalize_formats, normalize_formats};
pub(crate) use graph::FormatMark;
pub use record::*;
pub use table::*;
use tabula_error::{TabulaResult, tabula_bail};
use tabula_format::FieldName;

use crate::columnar::graph::FormatCache;
use crate::config::AdapterConfig;
use crate::field_index::FieldIndexed;
use crate::raw::{RawArray, RawObject, RawValue};
use crate::{Adapter, AdapterKind, Record, Table};

pub(crate) const DATA_KEY: &str = "d";
pub(crate) const FORMAT_KEY: &str = "s";
pub(crate) const FORMAT_ID_KEY: &str = "f";
pub(crate) const TYPE_KEY: &str = "_type";
pub(crate) const RECORD_TYPE: &str = "record";
pub(crate) const RECORDSET_TYPE: &str = "recordset";

/// Whether an object is a columnar record or table node.
pub fn is_columnar_node(object: &RawObject) -> bool {
    if !object.contains_key(DATA_KEY) {
        return false;
    }
    object.contains_key(FORMAT_KEY)
        || object.contains_key(FORMAT_ID_KEY)
        || matches!(
            object.get(TYPE_KEY).as_ref().and_then(RawValue::as_str),
            Some(RECORD_TYPE | RECORDSET_TYPE)
        )
}

/// Adapter over columnar nodes.
#[derive(Debug, Default)]
pub struct ColumnarAdapter {
    config: AdapterConfig,
}

impl ColumnarAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }
}

fn node_of(raw: RawValue) -> TabulaResult<RawObject> {
    match raw {
        RawValue::Object(object) => Ok(object),
        other => tabula_bail!(
            InvalidPayloadShape: "expected a columnar node, got {}",
            other.type_name()
        ),
    }
}

fn new_node(rows: RawArray, descriptors: Option<RawArray>, node_type: &str) -> RawObject {
    let node = RawObject::new();
    node.insert(DATA_KEY, RawValue::Array(rows));
    if let Some(descriptors) = descriptors {
        node.insert(FORMAT_KEY, RawValue::Array(descriptors));
    }
    node.insert(TYPE_KEY, RawValue::from(node_type));
    node
}

impl Adapter for ColumnarAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Columnar
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn for_table(&self, raw: Option<RawValue>) -> TabulaResult<Box<dyn Table>> {
        let node = match raw {
            Some(raw) => node_of(raw)?,
            None => new_node(RawArray::new(), None, RECORDSET_TYPE),
        };
        Ok(Box::new(ColumnarTable::new(node)))
    }

    /// A new record over a table's format shares the table's descriptor list and holds a null
    /// for every field.
    fn for_record(
        &self,
        raw: Option<RawValue>,
        table: Option<&RawValue>,
    ) -> TabulaResult<Box<dyn Record>> {
        let node = match (raw, table) {
            (Some(raw), _) => node_of(raw)?,
            (None, Some(table)) => {
                let table_node = node_of(table.clone())?;
                let descriptors = FormatCache::new(table.clone()).resolve_node(&table_node)?;
                let values = descriptors
                    .as_ref()
                    .map(|descriptors| vec![RawValue::Null; descriptors.len()])
                    .unwrap_or_default();
                new_node(RawArray::from_vec(values), descriptors, RECORD_TYPE)
            }
            (None, None) => new_node(RawArray::new(), None, RECORD_TYPE),
        };
        Ok(Box::new(ColumnarRecord::new(node)))
    }

    /// The first field whose name starts with the key marker, else the first field.
    fn key_field(&self, raw: &RawValue) -> TabulaResult<Option<FieldName>> {
        let node = node_of(raw.clone())?;
        let Some(descriptors) = FormatCache::new(raw.clone()).resolve_node(&node)? else {
            return Ok(None);
        };
        let names = descriptors.field_names();
        let marker = self.config.key_marker();
        Ok(names
            .iter()
            .find(|name| name.starts_with(marker))
            .or_else(|| names.first())
            .cloned())
    }
}
