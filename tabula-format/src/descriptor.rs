//! Wire-level field descriptors of the columnar format.
//!
//! A descriptor is `{n: name, t: tag}` or `{n: name, t: {n: tag, ...details}}`, where the
//! details depend on the type:
//!
//! | type            | details                 |
//! |-----------------|-------------------------|
//! | real, money     | `p` precision           |
//! | money           | `l` large amounts       |
//! | enum, flags     | `s` dictionary, `sl` localized dictionary |
//! | datetime        | `tz` has time zone      |
//! | array           | `t` item tag            |

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{FieldFormat, FieldMeta, FieldType};

/// The wire shape of a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "t")]
    pub type_ref: TypeRef,
}

/// The type of a field descriptor, either a bare tag or a tag with details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Tag(String),
    Detailed(TypeDetail),
}

/// A type tag together with its type-specific details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDetail {
    #[serde(rename = "n")]
    pub tag: String,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(rename = "l", default, skip_serializing_if = "Option::is_none")]
    pub large: Option<bool>,
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<JsonValue>,
    #[serde(rename = "sl", default, skip_serializing_if = "Option::is_none")]
    pub localized_dictionary: Option<JsonValue>,
    #[serde(rename = "tz", default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<bool>,
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub item_tag: Option<String>,
}

impl TypeDetail {
    fn structural_key(&self) -> String {
        [
            self.precision.map(|p| format!("p={p}")),
            self.large.map(|l| format!("l={l}")),
            self.dictionary.as_ref().map(|s| format!("s={s}")),
            self.localized_dictionary.as_ref().map(|s| format!("sl={s}")),
            self.time_zone.map(|tz| format!("tz={tz}")),
            self.item_tag.as_ref().map(|t| format!("t={t}")),
        ]
        .into_iter()
        .flatten()
        .join(",")
    }
}

impl FieldDescriptor {
    pub fn new<N: Into<String>>(name: N, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            type_ref: TypeRef::Tag(field_type.tag().to_string()),
        }
    }

    /// The wire tag of the descriptor's type.
    pub fn tag(&self) -> &str {
        match &self.type_ref {
            TypeRef::Tag(tag) => tag,
            TypeRef::Detailed(detail) => &detail.tag,
        }
    }

    pub fn field_type(&self) -> FieldType {
        FieldType::from_tag(self.tag())
    }

    /// A string which is equal for two descriptors if and only if they have the same name,
    /// type and type-specific details.
    pub fn structural_key(&self) -> String {
        match &self.type_ref {
            TypeRef::Tag(tag) => format!("{}\u{1f}{}", self.name, tag),
            TypeRef::Detailed(detail) => format!(
                "{}\u{1f}{}\u{1f}{}",
                self.name,
                detail.tag,
                detail.structural_key()
            ),
        }
    }
}

/// The structural key of a whole descriptor list, used to deduplicate identical lists.
pub fn structural_key<'a, I>(descriptors: I) -> String
where
    I: IntoIterator<Item = &'a FieldDescriptor>,
{
    descriptors
        .into_iter()
        .map(FieldDescriptor::structural_key)
        .join("\u{1e}")
}

impl From<&FieldDescriptor> for FieldFormat {
    fn from(descriptor: &FieldDescriptor) -> Self {
        let format = FieldFormat::new(descriptor.name.as_str(), descriptor.field_type());
        match &descriptor.type_ref {
            TypeRef::Tag(_) => format,
            TypeRef::Detailed(detail) => format.with_meta(FieldMeta {
                precision: detail.precision,
                large: detail.large,
                dictionary: detail.dictionary.clone(),
                localized_dictionary: detail.localized_dictionary.clone(),
                time_zone: detail.time_zone,
                item_type: detail.item_tag.as_deref().map(FieldType::from_tag),
            }),
        }
    }
}

impl From<&FieldFormat> for FieldDescriptor {
    fn from(format: &FieldFormat) -> Self {
        let field_type = format.field_type();
        let meta = format.meta();
        let tag = field_type.tag().to_string();
        if !field_type.has_details() {
            return Self {
                name: format.name().to_string(),
                type_ref: TypeRef::Tag(tag),
            };
        }

        let detail = match field_type {
            FieldType::Real | FieldType::Money => TypeDetail {
                tag,
                precision: meta.precision,
                large: meta.large.filter(|_| field_type == FieldType::Money),
                ..Default::default()
            },
            FieldType::Enum | FieldType::Flags => TypeDetail {
                tag,
                dictionary: Some(
                    meta.dictionary
                        .clone()
                        .unwrap_or_else(|| JsonValue::Array(vec![])),
                ),
                localized_dictionary: meta.localized_dictionary.clone(),
                ..Default::default()
            },
            FieldType::DateTime => TypeDetail {
                tag,
                time_zone: meta.time_zone,
                ..Default::default()
            },
            _ => TypeDetail {
                tag,
                item_tag: meta.item_type.map(|t| t.tag().to_string()),
                ..Default::default()
            },
        };

        let type_ref = if detail.structural_key().is_empty() {
            TypeRef::Tag(detail.tag)
        } else {
            TypeRef::Detailed(detail)
        };

        Self {
            name: format.name().to_string(),
            type_ref,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_bare_tag() {
        let descriptor: FieldDescriptor =
            serde_json::from_value(json!({"n": "id", "t": "Integer-tag"})).unwrap();
        assert_eq!(descriptor, FieldDescriptor::new("id", FieldType::Integer));
        assert_eq!(FieldFormat::from(&descriptor), FieldFormat::new("id", FieldType::Integer));
    }

    #[test]
    fn parse_detailed() {
        let descriptor: FieldDescriptor = serde_json::from_value(json!({
            "n": "tags",
            "t": {"n": "Array-tag", "t": "String-tag"}
        }))
        .unwrap();
        let format = FieldFormat::from(&descriptor);
        assert_eq!(format.field_type(), FieldType::Array);
        assert_eq!(format.meta().item_type, Some(FieldType::String));
    }

    #[test]
    fn unknown_tag_is_string() {
        let descriptor: FieldDescriptor =
            serde_json::from_value(json!({"n": "x", "t": "Mystery-tag"})).unwrap();
        assert_eq!(FieldFormat::from(&descriptor).field_type(), FieldType::String);
    }

    #[rstest]
    #[case(FieldFormat::new("price", FieldType::Money).with_meta(FieldMeta { precision: Some(2), large: Some(true), ..Default::default() }), json!({"n": "price", "t": {"n": "Money-tag", "p": 2, "l": true}}))]
    #[case(FieldFormat::new("ratio", FieldType::Real).with_meta(FieldMeta { precision: Some(3), large: Some(true), ..Default::default() }), json!({"n": "ratio", "t": {"n": "Real-tag", "p": 3}}))]
    #[case(FieldFormat::new("state", FieldType::Enum), json!({"n": "state", "t": {"n": "Enum-tag", "s": []}}))]
    #[case(FieldFormat::new("at", FieldType::DateTime).with_meta(FieldMeta { time_zone: Some(true), ..Default::default() }), json!({"n": "at", "t": {"n": "DateTime-tag", "tz": true}}))]
    #[case(FieldFormat::new("at", FieldType::DateTime), json!({"n": "at", "t": "DateTime-tag"}))]
    #[case(FieldFormat::new("title", FieldType::String), json!({"n": "title", "t": "String-tag"}))]
    #[case(FieldFormat::new("count", FieldType::Integer).with_meta(FieldMeta { precision: Some(2), ..Default::default() }), json!({"n": "count", "t": "Integer-tag"}))]
    #[case(FieldFormat::new("tags", FieldType::Array).with_meta(FieldMeta::array_of(FieldType::Integer)), json!({"n": "tags", "t": {"n": "Array-tag", "t": "Integer-tag"}}))]
    fn encode(#[case] format: FieldFormat, #[case] expected: JsonValue) {
        let descriptor = FieldDescriptor::from(&format);
        assert_eq!(serde_json::to_value(&descriptor).unwrap(), expected);
    }

    #[test]
    fn structural_key_distinguishes_details() {
        let plain = FieldDescriptor::from(&FieldFormat::new("v", FieldType::Real));
        let precise = FieldDescriptor::from(
            &FieldFormat::new("v", FieldType::Real).with_meta(FieldMeta {
                precision: Some(4),
                ..Default::default()
            }),
        );
        assert_ne!(plain.structural_key(), precise.structural_key());
        assert_eq!(
            structural_key([&plain, &precise]),
            structural_key(&[plain.clone(), precise.clone()])
        );
        assert_ne!(structural_key([&plain, &precise]), structural_key([&precise, &plain]));
    }
}
