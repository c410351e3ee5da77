use serde_json::Value as JsonValue;

use crate::{FieldFormat, FieldMeta, FieldName, FieldType};

/// A mutable scratch description of a field, returned by shared format queries.
///
/// Views keep exactly one instance and overwrite it on every query, so a reference obtained
/// from one query is only meaningful until the next one. Copy it out with
/// [`UniversalField::to_format`] or `clone` to keep it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniversalField {
    pub name: FieldName,
    pub field_type: FieldType,
    pub default_value: JsonValue,
    pub nullable: bool,
    pub meta: FieldMeta,
}

impl Default for UniversalField {
    fn default() -> Self {
        Self {
            name: "".into(),
            field_type: FieldType::default(),
            default_value: JsonValue::Null,
            nullable: true,
            meta: FieldMeta::default(),
        }
    }
}

impl UniversalField {
    /// Overwrite every member from the given format.
    pub fn assign(&mut self, format: &FieldFormat) {
        self.name = format.name().clone();
        self.field_type = format.field_type();
        self.default_value.clone_from(format.default_value());
        self.nullable = format.is_nullable();
        self.meta.clone_from(format.meta());
    }

    /// Copy the current contents into an owned [`FieldFormat`].
    pub fn to_format(&self) -> FieldFormat {
        FieldFormat::new(self.name.clone(), self.field_type)
            .with_default_value(self.default_value.clone())
            .with_nullable(self.nullable)
            .with_meta(self.meta.clone())
    }
}

impl From<&FieldFormat> for UniversalField {
    fn from(format: &FieldFormat) -> Self {
        let mut field = UniversalField::default();
        field.assign(format);
        field
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn assign_overwrites_previous_contents() {
        let mut scratch = UniversalField::default();
        scratch.assign(
            &FieldFormat::new("kind", FieldType::Enum)
                .with_meta(FieldMeta::dictionary(json!(["a", "b"]))),
        );
        assert_eq!(scratch.field_type, FieldType::Enum);

        let id = FieldFormat::new("id", FieldType::Integer).with_nullable(false);
        scratch.assign(&id);
        assert_eq!(scratch.name.as_ref(), "id");
        assert!(scratch.meta.is_empty());
        assert_eq!(scratch.to_format(), id);
    }
}
