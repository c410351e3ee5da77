use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::FieldType;

/// A name for a field in a record
pub type FieldName = Arc<str>;

/// Type-specific metadata of a field.
///
/// Only the members relevant to the field's [`FieldType`] are expected to be set, e.g.
/// `precision` for reals and money, `dictionary` for enums and flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    /// Number of digits after the decimal point for reals and money
    pub precision: Option<u32>,
    /// Whether a money field holds large amounts
    pub large: Option<bool>,
    /// Dictionary of an enum or flags field
    pub dictionary: Option<JsonValue>,
    /// Localized dictionary of an enum or flags field
    pub localized_dictionary: Option<JsonValue>,
    /// Whether a datetime field carries a time zone
    pub time_zone: Option<bool>,
    /// Kind of the items of an array field
    pub item_type: Option<FieldType>,
}

impl FieldMeta {
    /// Returns `true` if no metadata is set.
    pub fn is_empty(&self) -> bool {
        self == &FieldMeta::default()
    }

    /// Metadata for an array with items of the given type.
    pub fn array_of(item_type: FieldType) -> Self {
        Self {
            item_type: Some(item_type),
            ..Default::default()
        }
    }

    /// Metadata for an enum or flags field with the given dictionary.
    pub fn dictionary(dictionary: JsonValue) -> Self {
        Self {
            dictionary: Some(dictionary),
            ..Default::default()
        }
    }
}

/// The format of a single field: its name, logical type, default value, nullability and
/// type-specific metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFormat {
    name: FieldName,
    field_type: FieldType,
    default_value: JsonValue,
    nullable: bool,
    meta: FieldMeta,
}

impl FieldFormat {
    /// Create a nullable format with a `null` default value.
    pub fn new<N: Into<FieldName>>(name: N, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default_value: JsonValue::Null,
            nullable: true,
            meta: FieldMeta::default(),
        }
    }

    pub fn with_default_value<V: Into<JsonValue>>(mut self, default_value: V) -> Self {
        self.default_value = default_value.into();
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_meta(mut self, meta: FieldMeta) -> Self {
        self.meta = meta;
        self
    }

    #[inline]
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    #[inline]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[inline]
    pub fn default_value(&self) -> &JsonValue {
        &self.default_value
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }
}

impl Display for FieldFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.field_type)?;
        if let Some(item_type) = self.meta.item_type {
            write!(f, "<{item_type}>")?;
        }
        if self.nullable {
            write!(f, "?")?;
        }
        Ok(())
    }
}
