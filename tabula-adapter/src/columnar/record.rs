use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::columnar::node::{ColumnarNode, encode_descriptor, padded};
use crate::field_index::FieldIndexed;
use crate::generic::GenericFormat;
use crate::raw::{RawArray, RawObject, RawValue};
use crate::{AdapterKind, Record};

/// A record view over a columnar `record` node.
///
/// Values are written into the node's value array in place. Adding or removing fields first
/// gives the node its own descriptor list and value array, so rows and records it shared them
/// with keep their shape.
#[derive(Debug)]
pub struct ColumnarRecord {
    node: ColumnarNode,
    generic: GenericFormat,
}

impl ColumnarRecord {
    pub fn new(node: RawObject) -> Self {
        Self {
            node: ColumnarNode::new(node),
            generic: GenericFormat::default(),
        }
    }

    /// Private copies of the descriptor list and of the values, padded to the list's length.
    fn detached(&self) -> TabulaResult<(RawArray, Vec<RawValue>)> {
        let descriptors = self
            .node
            .descriptors()?
            .map(|descriptors| descriptors.deep_clone())
            .unwrap_or_default();
        let values = padded(self.node.data()?, descriptors.len());
        Ok((descriptors, values))
    }
}

impl Record for ColumnarRecord {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Columnar
    }

    fn data(&self) -> RawValue {
        RawValue::Object(self.node.raw().clone())
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        self.node.fields()
    }

    fn get(&self, name: &str) -> TabulaResult<Option<RawValue>> {
        let Some(position) = self.node.position(name)? else {
            return Ok(None);
        };
        let value = self
            .node
            .data()?
            .and_then(|data| data.get(position))
            .unwrap_or(RawValue::Null);
        self.node.resolve(&value)?;
        Ok(Some(value))
    }

    /// Only declared fields can be set.
    fn set(&mut self, name: &str, value: RawValue) -> TabulaResult<()> {
        let position = self
            .node
            .position(name)?
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))?;
        self.node.data_or_create()?.set_padded(position, value)
    }

    fn clear(&mut self) -> TabulaResult<()> {
        self.node.install(RawArray::new(), RawArray::new());
        Ok(())
    }

    fn add_field(
        &mut self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()> {
        let (descriptors, mut values) = self.detached()?;
        if descriptors.field_position(format.name()).is_some() {
            tabula_bail!(DuplicateField: "{}", format.name());
        }
        let at = at.unwrap_or_else(|| descriptors.len());
        descriptors.insert(at, encode_descriptor(format)?)?;
        values.insert(
            at,
            value.unwrap_or_else(|| RawValue::from(format.default_value())),
        );
        self.node.install(descriptors, RawArray::from_vec(values));
        Ok(())
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        let position = self
            .node
            .position(name)?
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))?;
        self.remove_field_at(position)
    }

    fn remove_field_at(&mut self, index: usize) -> TabulaResult<()> {
        let (descriptors, mut values) = self.detached()?;
        descriptors.remove(index)?;
        values.remove(index);
        self.node.install(descriptors, RawArray::from_vec(values));
        Ok(())
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        self.node.format(name)
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        let format = self.node.format(name)?;
        Ok(self.generic.share(&format))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabula_error::TabulaError;
    use tabula_format::FieldType;

    use super::*;

    fn record(raw: serde_json::Value) -> (RawValue, ColumnarRecord) {
        let raw = RawValue::from(raw);
        let record = ColumnarRecord::new(raw.as_object().unwrap().clone());
        (raw, record)
    }

    fn person() -> (RawValue, ColumnarRecord) {
        record(json!({
            "d": [1, "a"],
            "s": [{"n": "id", "t": "Integer-tag"}, {"n": "name", "t": "String-tag"}],
            "_type": "record"
        }))
    }

    #[test]
    fn get_and_set() {
        let (raw, mut record) = person();
        assert_eq!(record.get("name").unwrap(), Some(RawValue::from("a")));
        assert_eq!(record.get("missing").unwrap(), None);
        record.set("name", RawValue::from("b")).unwrap();
        assert_eq!(raw.to_json()["d"], json!([1, "b"]));
        assert!(matches!(
            record.set("missing", RawValue::from(1)).unwrap_err(),
            TabulaError::FieldNotFound(..)
        ));
        assert!(record.has("id").unwrap());
    }

    #[test]
    fn short_values_read_as_null() {
        let (raw, mut record) = record(json!({
            "d": [1],
            "s": [{"n": "id", "t": "Integer-tag"}, {"n": "name", "t": "String-tag"}]
        }));
        assert_eq!(record.get("name").unwrap(), Some(RawValue::Null));
        record.set("name", RawValue::from("x")).unwrap();
        assert_eq!(raw.to_json()["d"], json!([1, "x"]));
    }

    #[test]
    fn add_field_detaches() {
        let (raw, mut record) = person();
        let shared = raw.as_object().unwrap().get("s").unwrap();
        let values = raw.as_object().unwrap().get("d").unwrap();
        let score = FieldFormat::new("score", FieldType::Real).with_default_value(0.5);
        record.add_field(&score, Some(0), None).unwrap();

        assert_eq!(shared.as_array().unwrap().len(), 2);
        assert_eq!(values.to_json(), json!([1, "a"]));
        assert_eq!(raw.to_json()["d"], json!([0.5, 1, "a"]));
        assert_eq!(record.fields().unwrap().len(), 3);
        assert_eq!(record.format("score").unwrap().field_type(), FieldType::Real);
        assert!(matches!(
            record.add_field(&score, None, None).unwrap_err(),
            TabulaError::DuplicateField(..)
        ));
        assert!(matches!(
            record
                .add_field(&FieldFormat::new("x", FieldType::Integer), Some(9), None)
                .unwrap_err(),
            TabulaError::IndexOutOfRange(..)
        ));
    }

    #[test]
    fn remove_field_detaches() {
        let (raw, mut record) = person();
        let shared = raw.as_object().unwrap().get("s").unwrap();
        record.remove_field("id").unwrap();
        assert_eq!(shared.as_array().unwrap().len(), 2);
        assert_eq!(raw.to_json()["d"], json!(["a"]));
        assert_eq!(record.get("name").unwrap(), Some(RawValue::from("a")));
        assert!(matches!(
            record.remove_field_at(1).unwrap_err(),
            TabulaError::IndexOutOfRange(..)
        ));
        assert!(matches!(
            record.remove_field("id").unwrap_err(),
            TabulaError::FieldNotFound(..)
        ));
    }

    #[test]
    fn nested_references_are_resolved_on_get() {
        let (_, record) = record(json!({
            "d": [
                {"d": [1], "s": [{"n": "x", "t": "Integer-tag"}], "_type": "record"},
                {"d": [2], "f": 1, "_type": "record"}
            ],
            "s": [{"n": "a", "t": "Record-tag"}, {"n": "b", "t": "Record-tag"}],
            "_type": "record"
        }));
        assert_eq!(record.format("b").unwrap().field_type(), FieldType::Record);
        let nested = record.get("b").unwrap().unwrap().to_json();
        assert_eq!(nested["s"], json!([{"n": "x", "t": "Integer-tag"}]));
        assert_eq!(nested["d"], json!([2]));
        assert!(nested.get("f").is_none());
    }

    #[test]
    fn format_reference_only() {
        let raw = RawValue::from(json!([
            {"d": [1], "s": [{"n": "x", "t": "Integer-tag"}], "_type": "record"},
            {"d": [2], "f": 0, "_type": "record"}
        ]));
        let second = raw.as_array().unwrap().get(1).unwrap();
        // A record view only sees its own node, so the definition in the sibling is unknown.
        let record = ColumnarRecord::new(second.as_object().unwrap().clone());
        assert!(matches!(
            record.fields().unwrap_err(),
            TabulaError::UnresolvedFormatReference(..)
        ));
    }

    #[test]
    fn clear_twice() {
        let (raw, mut record) = person();
        let shared = raw.as_object().unwrap().get("s").unwrap();
        record.clear().unwrap();
        record.clear().unwrap();
        assert!(record.fields().unwrap().is_empty());
        assert_eq!(shared.as_array().unwrap().len(), 2);
        assert!(record.set("id", RawValue::from(1)).is_err());
    }

    #[test]
    fn shared_format() {
        let (_, mut record) = person();
        assert_eq!(record.shared_format("id").unwrap().field_type, FieldType::Integer);
        assert_eq!(record.shared_format("name").unwrap().name.as_ref(), "name");
    }
}
