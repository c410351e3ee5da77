use itertools::Itertools;
use tabula_error::{TabulaResult, tabula_bail, tabula_err};
use tabula_format::{FieldFormat, FieldName, UniversalField};

use crate::generic::GenericFormat;
use crate::plain::{DeclaredFormats, infer_format};
use crate::raw::{RawObject, RawValue};
use crate::{AdapterKind, Record};

/// A record view over a single object.
#[derive(Debug)]
pub struct PlainRecord {
    object: RawObject,
    declared: DeclaredFormats,
    generic: GenericFormat,
}

impl PlainRecord {
    pub fn new(object: RawObject) -> Self {
        Self {
            object,
            declared: DeclaredFormats::default(),
            generic: GenericFormat::default(),
        }
    }
}

impl Record for PlainRecord {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Plain
    }

    fn data(&self) -> RawValue {
        RawValue::Object(self.object.clone())
    }

    fn fields(&self) -> TabulaResult<Vec<FieldName>> {
        Ok(self
            .object
            .keys()
            .into_iter()
            .chain(self.declared.names().cloned())
            .unique()
            .collect())
    }

    fn get(&self, name: &str) -> TabulaResult<Option<RawValue>> {
        Ok(self.object.get(name))
    }

    /// Sets the value, adding the field if the object does not hold it yet.
    fn set(&mut self, name: &str, value: RawValue) -> TabulaResult<()> {
        self.object.insert(name, value);
        Ok(())
    }

    fn clear(&mut self) -> TabulaResult<()> {
        self.object.clear();
        self.declared.clear();
        Ok(())
    }

    fn add_field(
        &mut self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()> {
        if self.has(format.name())? {
            tabula_bail!(DuplicateField: "{}", format.name());
        }
        let value = value.unwrap_or_else(|| RawValue::from(format.default_value()));
        self.object.insert_at(
            at.unwrap_or_else(|| self.object.len()),
            format.name().clone(),
            value,
        )?;
        self.declared.declare(format);
        Ok(())
    }

    fn remove_field(&mut self, name: &str) -> TabulaResult<()> {
        if !self.has(name)? {
            tabula_bail!(FieldNotFound: "{}", name);
        }
        self.object.remove(name);
        self.declared.forget(name);
        Ok(())
    }

    fn remove_field_at(&mut self, _index: usize) -> TabulaResult<()> {
        tabula_bail!(UnsupportedOperation: "plain records have no positional field order")
    }

    fn format(&self, name: &str) -> TabulaResult<FieldFormat> {
        if let Some(format) = self.declared.get(name) {
            return Ok(format.clone());
        }
        self.object
            .get(name)
            .map(|value| infer_format(name, &value))
            .ok_or_else(|| tabula_err!(FieldNotFound: "{}", name))
    }

    fn shared_format(&mut self, name: &str) -> TabulaResult<&UniversalField> {
        let format = self.format(name)?;
        Ok(self.generic.share(&format))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabula_format::{FieldMeta, FieldType};

    use super::*;

    fn record() -> PlainRecord {
        let raw = RawValue::from(json!({"id": 1, "tags": ["a"]}));
        PlainRecord::new(raw.as_object().unwrap().clone())
    }

    #[test]
    fn declared_format_wins() {
        let mut record = record();
        let money = FieldFormat::new("price", FieldType::Money).with_meta(FieldMeta {
            precision: Some(2),
            ..Default::default()
        });
        record.add_field(&money, Some(1), Some(RawValue::from(10))).unwrap();
        assert_eq!(record.format("price").unwrap(), money);
        assert_eq!(
            record.fields().unwrap().iter().map(|f| f.as_ref()).collect::<Vec<_>>(),
            vec!["id", "price", "tags"]
        );
        assert_eq!(
            record.format("tags").unwrap().meta().item_type,
            Some(FieldType::String)
        );
    }

    #[test]
    fn set_adds_unknown_fields() {
        let mut record = record();
        record.set("title", RawValue::from("x")).unwrap();
        assert_eq!(record.get("title").unwrap(), Some(RawValue::from("x")));
        assert_eq!(record.get("missing").unwrap(), None);
    }

    #[test]
    fn shared_format_overwrites_scratch() {
        let mut record = record();
        assert_eq!(record.shared_format("id").unwrap().field_type, FieldType::Integer);
        let tags = record.shared_format("tags").unwrap();
        assert_eq!(tags.name.as_ref(), "tags");
        assert_eq!(tags.field_type, FieldType::Array);
    }

    #[test]
    fn clear_twice() {
        let mut record = record();
        record.clear().unwrap();
        record.clear().unwrap();
        assert!(record.fields().unwrap().is_empty());
        assert!(record.remove_field("id").is_err());
    }
}
