use tabula_format::{FieldFormat, FieldMeta, FieldName, FieldType};

use crate::raw::RawValue;

/// The field type a value would be declared with.
pub(crate) fn infer_type(value: &RawValue) -> FieldType {
    match value {
        RawValue::Null | RawValue::String(_) => FieldType::String,
        RawValue::Bool(_) => FieldType::Boolean,
        RawValue::Int(_) => FieldType::Integer,
        RawValue::Float(_) => FieldType::Real,
        RawValue::Array(_) => FieldType::Array,
        RawValue::Object(_) => FieldType::Object,
        RawValue::Entity(_) => FieldType::Record,
        RawValue::Collection(_) => FieldType::RecordSet,
    }
}

/// The format a field holding `value` would be declared with.
///
/// Arrays take their item type from the first item which is not null.
pub(crate) fn infer_format<N: Into<FieldName>>(name: N, value: &RawValue) -> FieldFormat {
    let field_type = infer_type(value);
    let format = FieldFormat::new(name, field_type);
    match value {
        RawValue::Array(items) => {
            match items.to_vec().iter().find(|item| !item.is_null()) {
                Some(item) => format.with_meta(FieldMeta::array_of(infer_type(item))),
                None => format,
            }
        }
        _ => format,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!(true), FieldType::Boolean)]
    #[case(json!(1), FieldType::Integer)]
    #[case(json!(1.5), FieldType::Real)]
    #[case(json!("a"), FieldType::String)]
    #[case(json!(null), FieldType::String)]
    #[case(json!({"k": 1}), FieldType::Object)]
    fn scalar_types(#[case] value: serde_json::Value, #[case] expected: FieldType) {
        assert_eq!(infer_type(&RawValue::from(value)), expected);
    }

    #[test]
    fn array_item_type() {
        let format = infer_format("list", &RawValue::from(json!([null, 2, "x"])));
        assert_eq!(format.field_type(), FieldType::Array);
        assert_eq!(format.meta().item_type, Some(FieldType::Integer));

        let empty = infer_format("list", &RawValue::from(json!([])));
        assert_eq!(empty.meta().item_type, None);
    }
}
