use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tabula_adapter::columnar::{ColumnarAdapter, denormalize_formats, normalize_formats};
use tabula_adapter::cow::CowAdapter;
use tabula_adapter::plain::PlainAdapter;
use tabula_adapter::raw::RawValue;
use tabula_adapter::{Adapter, AdapterKind, AdapterRef, MoveTarget, Table};
use tabula_format::{FieldFormat, FieldType};

fn columnar_people() -> RawValue {
    RawValue::from(json!({
        "d": [[1, "a"], [2, "b"]],
        "s": [{"n": "id", "t": "Integer-tag"}, {"n": "name", "t": "String-tag"}],
        "_type": "recordset"
    }))
}

fn names(table: &dyn Table) -> Vec<String> {
    table
        .fields()
        .unwrap()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn plain_add_field_at_front() {
        let raw = RawValue::from(json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]));
        let mut table = PlainAdapter::default().for_table(Some(raw.clone())).unwrap();
        let flag = FieldFormat::new("flag", FieldType::Boolean).with_default_value(false);
        table.add_field(&flag, Some(0)).unwrap();

        assert_eq!(names(table.as_ref()), vec!["flag", "id", "name"]);
        for row in raw.as_array().unwrap().to_vec() {
            let (name, value) = row.as_object().unwrap().entry_at(0).unwrap();
            assert_eq!(name.as_ref(), "flag");
            assert_eq!(value, RawValue::from(false));
        }
    }

    #[test]
    fn columnar_remove_field() {
        let raw = columnar_people();
        let mut table = ColumnarAdapter::default().for_table(Some(raw.clone())).unwrap();
        table.remove_field("name").unwrap();

        let json = table.data().to_json();
        assert_eq!(json["s"].as_array().unwrap().len(), 1);
        for row in json["d"].as_array().unwrap() {
            assert_eq!(row.as_array().unwrap().len(), 1);
        }
        assert!(table.data().ptr_eq(&raw));
    }

    #[test]
    fn cow_isolates_original() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let adapter = CowAdapter::new(Arc::new(ColumnarAdapter::default())).with_first_write(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );
        let raw = columnar_people();
        let table = adapter.for_table(Some(raw.clone())).unwrap();
        assert_eq!(table.kind(), AdapterKind::Cow);
        assert!(table.data().ptr_eq(&raw));

        let mut record = adapter.for_record(Some(table.at(1).unwrap()), None).unwrap();
        record.set("name", RawValue::from("changed")).unwrap();
        record
            .add_field(&FieldFormat::new("extra", FieldType::Integer), None, None)
            .unwrap();
        record.remove_field("id").unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(raw.to_json()["d"], json!([[1, "a"], [2, "b"]]));
        assert_eq!(table.fields().unwrap().len(), 2);
        assert_eq!(record.fields().unwrap().len(), 2);
    }

    #[rstest]
    #[case::plain(
        Arc::new(PlainAdapter::default()),
        json!([{"id": 1, "a": "x"}, {"id": 2, "a": "y"}])
    )]
    #[case::columnar(
        Arc::new(ColumnarAdapter::default()),
        json!({"d": [[1, "x"], [2, "y"]], "s": [{"n": "id", "t": "Integer-tag"}, {"n": "a", "t": "String-tag"}]})
    )]
    fn merge_keeps_acceptor_key(#[case] adapter: AdapterRef, #[case] raw: serde_json::Value) {
        let mut table = adapter.for_table(Some(RawValue::from(raw))).unwrap();
        table.merge(0, 1, "id").unwrap();

        assert_eq!(table.count().unwrap(), 1);
        let record = adapter.for_record(Some(table.at(0).unwrap()), None).unwrap();
        assert_eq!(record.get("id").unwrap(), Some(RawValue::from(1)));
        assert_eq!(record.get("a").unwrap(), Some(RawValue::from("y")));
    }

    #[test]
    fn normalize_round_trip() {
        let inner = json!([{"n": "x", "t": "Integer-tag"}, {"n": "y", "t": "Money-tag"}]);
        let raw = RawValue::from(json!({
            "d": [
                [{"d": [1, 2], "s": inner, "_type": "record"}],
                [{"d": [3, 4], "s": inner, "_type": "record"}],
                [{"d": [5, 6], "s": inner, "_type": "record"}]
            ],
            "s": [{"n": "nested", "t": "Record-tag"}],
            "_type": "recordset"
        }));

        let normalized = normalize_formats(&raw).unwrap();
        let rows = normalized.to_json()["d"].clone();
        assert_eq!(rows[0][0]["s"], inner);
        assert_eq!(rows[1][0]["f"], json!(1));
        assert!(rows[2][0].get("s").is_none());

        denormalize_formats(&normalized).unwrap();
        assert_eq!(normalized.to_json(), raw.to_json());
    }

    #[test]
    fn views_resolve_normalized_payloads() {
        let inner = json!([{"n": "x", "t": "Integer-tag"}]);
        let raw = RawValue::from(json!({
            "d": [
                [{"d": [1], "s": inner, "_type": "record"}],
                [{"d": [2], "s": inner, "_type": "record"}]
            ],
            "s": [{"n": "nested", "t": "Record-tag"}],
            "_type": "recordset"
        }));
        let normalized = normalize_formats(&raw).unwrap();

        let adapter = ColumnarAdapter::default();
        let table = adapter.for_table(Some(normalized)).unwrap();
        for index in 0..2 {
            let row = adapter.for_record(Some(table.at(index).unwrap()), None).unwrap();
            let nested = row.get("nested").unwrap().unwrap();
            let nested = adapter.for_record(Some(nested), None).unwrap();
            assert_eq!(nested.format("x").unwrap().field_type(), FieldType::Integer);
        }
    }

    #[test]
    fn field_lookups_follow_structural_changes() {
        let adapter = ColumnarAdapter::default();
        let mut table = adapter.for_table(Some(columnar_people())).unwrap();
        let mut expected = vec!["id".to_string(), "name".to_string()];

        let steps: [(&str, Option<usize>); 5] = [
            ("a", Some(0)),
            ("name", None),
            ("b", Some(1)),
            ("a", None),
            ("name", Some(0)),
        ];
        for (name, at) in steps {
            // Warm the index before every change.
            for field in &expected {
                table.format(field).unwrap();
            }
            if expected.iter().any(|field| field == name) {
                table.remove_field(name).unwrap();
                expected.retain(|field| field != name);
            } else {
                let at = at.unwrap_or(expected.len());
                table
                    .add_field(&FieldFormat::new(name, FieldType::String), Some(at))
                    .unwrap();
                expected.insert(at, name.to_string());
            }
            assert_eq!(names(table.as_ref()), expected);
            for field in &expected {
                assert_eq!(table.format(field).unwrap().name().as_ref(), field.as_str());
            }
        }
        assert!(table.format("a").is_err());
    }

    #[test]
    fn rows_sharing_a_format() {
        let raw = RawValue::from(json!([
            {"d": [1, "a"], "s": [{"n": "id", "t": "Integer-tag"}, {"n": "name", "t": "String-tag"}], "_type": "record"},
            {"d": [2, "b"], "f": 0, "_type": "record"}
        ]));
        denormalize_formats(&raw).unwrap();
        let adapter = ColumnarAdapter::default();
        let rows = raw.as_array().unwrap().to_vec();
        let mut first = adapter.for_record(Some(rows[0].clone()), None).unwrap();
        let second = adapter.for_record(Some(rows[1].clone()), None).unwrap();

        for field in ["id", "name"] {
            assert_eq!(
                first.format(field).unwrap().field_type(),
                second.format(field).unwrap().field_type()
            );
        }
        first
            .add_field(&FieldFormat::new("extra", FieldType::Boolean), None, None)
            .unwrap();
        assert_eq!(first.fields().unwrap().len(), 3);
        assert_eq!(second.fields().unwrap().len(), 2);
    }

    #[rstest]
    #[case::plain(Arc::new(PlainAdapter::default()), json!([{"id": 1}]))]
    #[case::columnar(Arc::new(ColumnarAdapter::default()), columnar_people().to_json())]
    fn clear_is_idempotent(#[case] adapter: AdapterRef, #[case] raw: serde_json::Value) {
        let mut table = adapter.for_table(Some(RawValue::from(raw.clone()))).unwrap();
        table.clear().unwrap();
        let once = table.data().to_json();
        table.clear().unwrap();
        assert_eq!(table.data().to_json(), once);
        assert_eq!(table.count().unwrap(), 0);

        let row = match adapter.kind() {
            AdapterKind::Columnar => adapter
                .for_table(Some(RawValue::from(raw)))
                .unwrap()
                .at(0)
                .unwrap(),
            _ => RawValue::from(json!({"id": 1})),
        };
        let mut record = adapter.for_record(Some(row), None).unwrap();
        record.clear().unwrap();
        record.clear().unwrap();
        assert!(record.fields().unwrap().is_empty());
    }

    #[test]
    fn move_entry_points() {
        let raw = RawValue::from(json!([{"id": 1}, {"id": 2}, {"id": 3}]));
        let mut front = PlainAdapter::default().for_table(Some(raw.deep_clone())).unwrap();
        let mut zero = PlainAdapter::default().for_table(Some(raw.deep_clone())).unwrap();
        front.move_row(2, MoveTarget::Front).unwrap();
        zero.move_row(2, MoveTarget::Position(0)).unwrap();
        assert_eq!(front.data().to_json(), zero.data().to_json());
        assert_eq!(front.data().to_json(), json!([{"id": 3}, {"id": 1}, {"id": 2}]));
    }

    #[test]
    fn detect_and_create() {
        let raw = columnar_people();
        let kind = AdapterKind::detect(&raw);
        assert_eq!(kind, AdapterKind::Columnar);
        let adapter = kind.adapter(Default::default()).unwrap();
        assert_eq!(adapter.key_field(&raw).unwrap().as_deref(), Some("id"));
        assert_eq!(
            adapter.get_property(&raw, "s.1.n"),
            Some(RawValue::from("name"))
        );
    }
}
