//! Access to values nested inside raw data by separated property paths.
//!
//! Each segment of a path like `"address.lines.0"` addresses an object key, an array index or
//! a field of a row entity. Reads are lenient and yield `None` for a missing segment. Writes
//! create missing intermediate segments as empty objects.

use tabula_error::{TabulaResult, tabula_bail, tabula_err};

use crate::raw::{RawObject, RawValue};

/// Read the value at `path` inside `raw`.
pub fn get_property(raw: &RawValue, path: &str, separator: char) -> Option<RawValue> {
    path.split(separator)
        .try_fold(raw.clone(), |current, segment| child(&current, segment))
}

/// Write `value` at `path` inside `raw`.
///
/// Fails with `InvalidPayloadShape` if `raw` or an intermediate value can not hold children.
pub fn set_property(
    raw: &RawValue,
    path: &str,
    value: RawValue,
    separator: char,
) -> TabulaResult<()> {
    let segments = path.split(separator).collect::<Vec<_>>();
    let Some((last, intermediate)) = segments.split_last() else {
        tabula_bail!("empty property path");
    };

    let mut current = raw.clone();
    for segment in intermediate {
        current = match child(&current, segment) {
            Some(next) if next.is_container() => next,
            Some(next) if !next.is_null() => tabula_bail!(
                InvalidPayloadShape: "cannot descend into {} at segment {} of {}",
                next.type_name(),
                segment,
                path
            ),
            _ => {
                let created = RawValue::Object(RawObject::new());
                assign(&current, segment, created.clone(), path)?;
                created
            }
        };
    }
    assign(&current, last, value, path)
}

fn child(parent: &RawValue, segment: &str) -> Option<RawValue> {
    match parent {
        RawValue::Object(object) => object.get(segment),
        RawValue::Array(array) => array.get(segment.parse().ok()?),
        RawValue::Entity(entity) => entity.get(segment),
        _ => None,
    }
}

fn assign(parent: &RawValue, segment: &str, value: RawValue, path: &str) -> TabulaResult<()> {
    match parent {
        RawValue::Object(object) => {
            object.insert(segment, value);
            Ok(())
        }
        RawValue::Array(array) => {
            let index = segment.parse::<usize>().map_err(|_| {
                tabula_err!(InvalidPayloadShape: "segment {} of {} is not an array index", segment, path)
            })?;
            array.set_padded(index, value)
        }
        RawValue::Entity(entity) => entity.set(segment, value),
        other => Err(tabula_err!(
            InvalidPayloadShape: "cannot set segment {} of {} on {}",
            segment,
            path,
            other.type_name()
        )),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use tabula_error::TabulaError;

    use super::*;

    #[rstest]
    #[case("a.b", Some(json!(1)))]
    #[case("a.list.1", Some(json!("y")))]
    #[case("a.list.5", None)]
    #[case("a.missing.deeper", None)]
    #[case("a.b.c", None)]
    fn get(#[case] path: &str, #[case] expected: Option<serde_json::Value>) {
        let raw = RawValue::from(json!({"a": {"b": 1, "list": ["x", "y"]}}));
        assert_eq!(
            get_property(&raw, path, '.').map(|value| value.to_json()),
            expected
        );
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let raw = RawValue::from(json!({"a": {}}));
        set_property(&raw, "a.b.c", RawValue::from(5), '.').unwrap();
        assert_eq!(raw.to_json(), json!({"a": {"b": {"c": 5}}}));
    }

    #[test]
    fn set_pads_arrays() {
        let raw = RawValue::from(json!({"list": [1]}));
        set_property(&raw, "list/3", RawValue::from(4), '/').unwrap();
        assert_eq!(raw.to_json(), json!({"list": [1, null, null, 4]}));
    }

    #[rstest]
    #[case("list.18446744073709551615")]
    #[case("list.1000000")]
    fn set_far_out_of_range_fails(#[case] path: &str) {
        let raw = RawValue::from(json!({"list": [1]}));
        assert!(matches!(
            set_property(&raw, path, RawValue::from(1), '.').unwrap_err(),
            TabulaError::IndexOutOfRange(..)
        ));
        assert_eq!(raw.to_json(), json!({"list": [1]}));
    }

    #[test]
    fn set_through_scalar_fails() {
        let raw = RawValue::from(json!({"a": 1}));
        assert!(set_property(&raw, "a.b", RawValue::Null, '.').is_err());
        assert!(set_property(&RawValue::from(3), "a", RawValue::Null, '.').is_err());
        assert_eq!(raw.to_json(), json!({"a": 1}));
    }
}
