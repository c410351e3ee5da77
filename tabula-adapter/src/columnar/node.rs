use std::fmt::{Debug, Formatter};

use parking_lot::Mutex;
use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldDescriptor, FieldFormat, FieldName};

use crate::columnar::graph::FormatCache;
use crate::columnar::{DATA_KEY, FORMAT_ID_KEY, FORMAT_KEY};
use crate::field_index::FieldIndexed;
use crate::raw::{RawArray, RawObject, RawValue};

/// The columnar node behind a table or record view, together with the format cache of the
/// payload rooted at it.
pub(crate) struct ColumnarNode {
    node: RawObject,
    cache: Mutex<FormatCache>,
}

impl ColumnarNode {
    pub(crate) fn new(node: RawObject) -> Self {
        let cache = FormatCache::new(RawValue::Object(node.clone()));
        Self {
            node,
            cache: Mutex::new(cache),
        }
    }

    pub(crate) fn raw(&self) -> &RawObject {
        &self.node
    }

    /// The node's descriptor list, inlined from the format cache if the node references it.
    pub(crate) fn descriptors(&self) -> TabulaResult<Option<RawArray>> {
        self.cache.lock().resolve_node(&self.node)
    }

    /// Inline every format reference within a value taken from this node.
    pub(crate) fn resolve(&self, value: &RawValue) -> TabulaResult<()> {
        self.cache.lock().resolve_value(value)
    }

    /// The `d` member, `None` if the node has none yet.
    pub(crate) fn data(&self) -> TabulaResult<Option<RawArray>> {
        match self.node.get(DATA_KEY) {
            Some(RawValue::Array(data)) => Ok(Some(data)),
            None | Some(RawValue::Null) => Ok(None),
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "columnar data is {}, not an array",
                other.type_name()
            ),
        }
    }

    pub(crate) fn data_or_create(&self) -> TabulaResult<RawArray> {
        if let Some(data) = self.data()? {
            return Ok(data);
        }
        let data = RawArray::new();
        self.node.insert(DATA_KEY, RawValue::Array(data.clone()));
        Ok(data)
    }

    /// Swap in a new descriptor list and data array, detaching the node from the ones it
    /// shared with other nodes.
    pub(crate) fn install(&self, descriptors: RawArray, data: RawArray) {
        self.node.remove(FORMAT_ID_KEY);
        self.node.insert(FORMAT_KEY, RawValue::Array(descriptors));
        self.node.insert(DATA_KEY, RawValue::Array(data));
    }

    pub(crate) fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        Ok(self
            .descriptors()?
            .map(|descriptors| descriptors.field_names())
            .unwrap_or_default())
    }

    pub(crate) fn position(&self, name: &str) -> TabulaResult<Option<usize>> {
        Ok(self
            .descriptors()?
            .and_then(|descriptors| descriptors.field_position(name)))
    }

    pub(crate) fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        let descriptors = self
            .descriptors()?
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))?;
        let position = descriptors.require_position(name)?;
        match descriptors.get(position) {
            Some(descriptor) => decode_descriptor(&descriptor),
            None => tabula_bail!(FieldNotFound: "{}", name),
        }
    }
}

impl Debug for ColumnarNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnarNode")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

/// The raw wire shape of a field format.
pub(crate) fn encode_descriptor(format: &FieldFormat) -> TabulaResult<RawValue> {
    Ok(RawValue::from(serde_json::to_value(FieldDescriptor::from(
        format,
    ))?))
}

pub(crate) fn decode_descriptor(descriptor: &RawValue) -> TabulaResult<FieldFormat> {
    let descriptor = serde_json::from_value::<FieldDescriptor>(descriptor.to_json())
        .map_err(|err| tabula_err!(InvalidPayloadShape: "malformed field descriptor: {}", err))?;
    Ok(FieldFormat::from(&descriptor))
}

/// Positional values of a row, padded with nulls up to `len`.
pub(crate) fn padded(values: Option<RawArray>, len: usize) -> Vec<RawValue> {
    let mut values = values.map(|values| values.to_vec()).unwrap_or_default();
    if values.len() < len {
        values.resize(len, RawValue::Null);
    }
    values
}
