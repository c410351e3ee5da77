use serde_json::{Map, Number, Value as JsonValue};

use crate::raw::{RawArray, RawObject, RawValue};

impl From<JsonValue> for RawValue {
    fn from(value: JsonValue) -> Self {
        RawValue::from(&value)
    }
}

impl From<&JsonValue> for RawValue {
    fn from(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => RawValue::Null,
            JsonValue::Bool(b) => RawValue::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Int(i),
                None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => RawValue::String(s.as_str().into()),
            JsonValue::Array(items) => {
                RawValue::Array(items.iter().map(RawValue::from).collect::<RawArray>())
            }
            JsonValue::Object(entries) => RawValue::Object(RawObject::from_entries(
                entries
                    .iter()
                    .map(|(key, value)| (key.as_str(), RawValue::from(value))),
            )),
        }
    }
}

impl RawValue {
    /// Convert the value into JSON.
    ///
    /// Entities, collections and non-finite floats have no JSON counterpart and become `null`.
    /// Converting a value containing cycles does not terminate.
    pub fn to_json(&self) -> JsonValue {
        match self {
            RawValue::Null | RawValue::Entity(_) | RawValue::Collection(_) => JsonValue::Null,
            RawValue::Bool(b) => JsonValue::Bool(*b),
            RawValue::Int(i) => JsonValue::Number((*i).into()),
            RawValue::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            RawValue::String(s) => JsonValue::String(s.to_string()),
            RawValue::Array(array) => {
                JsonValue::Array(array.to_vec().iter().map(RawValue::to_json).collect())
            }
            RawValue::Object(object) => JsonValue::Object(
                object
                    .entries()
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(RawValue::from(json!(3)), RawValue::Int(3));
        assert_eq!(RawValue::from(json!(2.5)), RawValue::Float(2.5));
        assert_eq!(RawValue::Float(f64::INFINITY).to_json(), JsonValue::Null);
    }

    #[test]
    fn nested_values() {
        let value = RawValue::from(json!({"z": 1, "a": {"k": [true, null]}}));
        let keys = value.as_object().unwrap().keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(value.to_json(), json!({"z": 1, "a": {"k": [true, null]}}));
    }
}
