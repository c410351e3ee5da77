//! Views over already materialized row entities.
//!
//! Row entities and their collections own their own mutation API, so the views here delegate
//! every structural change to them instead of editing raw arrays.

mod memory;
mod record;
mod table;

use std::fmt::Debug;
use std::sync::Arc;

pub use memory::*;
pub use record::*;
pub use table::*;
use tabula_error::{TabulaResult, tabula_bail};
use tabula_format::{FieldFormat, FieldName};

use crate::config::AdapterConfig;
use crate::raw::RawValue;
use crate::table::MoveTarget;
use crate::{Adapter, AdapterKind, Record, Table};

pub type RowEntityRef = Arc<dyn RowEntity>;
pub type RowCollectionRef = Arc<dyn RowCollection>;
pub type RowFactoryRef = Arc<dyn RowFactory>;

/// A materialized row with a declared format of its own.
pub trait RowEntity: Debug + Send + Sync {
    /// The names of the fields in the row's declared format.
    fn fields(&self) -> Vec<FieldName>;

    /// Whether the row holds a value for the field, declared or not.
    fn has(&self, name: &str) -> bool;

    fn get(&self, name: &str) -> Option<RawValue>;

    /// Set the value of a field, declaring it first if the row has never seen it.
    fn set(&self, name: &str, value: RawValue) -> TabulaResult<()>;

    fn format(&self, name: &str) -> TabulaResult<FieldFormat>;

    fn add_field(
        &self,
        format: &FieldFormat,
        at: Option<usize>,
        value: Option<RawValue>,
    ) -> TabulaResult<()>;

    fn remove_field(&self, name: &str) -> TabulaResult<()>;

    fn remove_field_at(&self, index: usize) -> TabulaResult<()>;

    /// An independent copy of the row.
    fn duplicate(&self) -> RowEntityRef;
}

/// An ordered collection of rows sharing one format.
pub trait RowCollection: Debug + Send + Sync {
    fn count(&self) -> usize;

    fn at(&self, index: usize) -> Option<RowEntityRef>;

    fn add(&self, row: RowEntityRef, at: Option<usize>) -> TabulaResult<()>;

    fn remove_at(&self, index: usize) -> TabulaResult<RowEntityRef>;

    fn replace(&self, row: RowEntityRef, index: usize) -> TabulaResult<()>;

    fn move_row(&self, source: usize, target: MoveTarget) -> TabulaResult<()>;

    fn clear(&self);

    fn fields(&self) -> Vec<FieldName>;

    fn format(&self, name: &str) -> TabulaResult<FieldFormat>;

    /// Add a field to the collection format and to every row.
    fn add_field(&self, format: &FieldFormat, at: Option<usize>) -> TabulaResult<()>;

    fn remove_field(&self, name: &str) -> TabulaResult<()>;

    fn remove_field_at(&self, index: usize) -> TabulaResult<()>;

    /// The field acting as the primary key, if the collection declares one.
    fn key_field(&self) -> Option<FieldName> {
        None
    }

    /// The factory creating rows compatible with this collection.
    fn factory(&self) -> RowFactoryRef;

    /// An independent copy of the collection and all of its rows.
    fn duplicate(&self) -> RowCollectionRef;
}

/// Creates rows and collections of one concrete row type.
pub trait RowFactory: Debug + Send + Sync {
    /// A new row declaring the given formats, every field holding its default value.
    fn create_row(&self, formats: &[FieldFormat]) -> RowEntityRef;

    /// A new empty collection whose rows are created by this factory.
    fn create_collection(&self) -> RowCollectionRef;
}

/// Adapter over [`RawValue::Entity`] and [`RawValue::Collection`] data.
#[derive(Debug)]
pub struct CollectionAdapter {
    config: AdapterConfig,
    factory: RowFactoryRef,
}

impl CollectionAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self {
            config,
            factory: Arc::new(MemoryRowFactory),
        }
    }

    /// Use `factory` for tables and records created without data or table context.
    pub fn with_factory(mut self, factory: RowFactoryRef) -> Self {
        self.factory = factory;
        self
    }
}

impl Adapter for CollectionAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Collection
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn for_table(&self, raw: Option<RawValue>) -> TabulaResult<Box<dyn Table>> {
        let rows = match raw {
            None => self.factory.create_collection(),
            Some(RawValue::Collection(rows)) => rows,
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "expected a collection of rows, got {}",
                other.type_name()
            ),
        };
        Ok(Box::new(CollectionTable::new(rows)))
    }

    fn for_record(
        &self,
        raw: Option<RawValue>,
        table: Option<&RawValue>,
    ) -> TabulaResult<Box<dyn Record>> {
        let row = match (raw, table) {
            (Some(RawValue::Entity(row)), _) => row,
            (Some(other), _) => tabula_bail!(
                InvalidPayloadShape: "expected a row entity, got {}",
                other.type_name()
            ),
            (None, Some(RawValue::Collection(rows))) => {
                let formats = rows
                    .fields()
                    .iter()
                    .map(|name| rows.format(name))
                    .collect::<TabulaResult<Vec<_>>>()?;
                rows.factory().create_row(&formats)
            }
            (None, _) => self.factory.create_row(&[]),
        };
        Ok(Box::new(CollectionRecord::new(row)))
    }

    fn key_field(&self, raw: &RawValue) -> TabulaResult<Option<FieldName>> {
        match raw {
            RawValue::Collection(rows) => Ok(rows.key_field()),
            RawValue::Entity(_) => Ok(None),
            other => tabula_bail!(
                InvalidPayloadShape: "expected a collection of rows, got {}",
                other.type_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tabula_format::FieldType;

    use super::*;

    #[derive(Debug, Default, Clone)]
    struct CountingFactory {
        rows: Arc<AtomicUsize>,
        collections: Arc<AtomicUsize>,
    }

    impl RowFactory for CountingFactory {
        fn create_row(&self, formats: &[FieldFormat]) -> RowEntityRef {
            self.rows.fetch_add(1, Ordering::SeqCst);
            MemoryRowFactory.create_row(formats)
        }

        fn create_collection(&self) -> RowCollectionRef {
            self.collections.fetch_add(1, Ordering::SeqCst);
            Arc::new(MemoryRowSet::default().with_factory(Arc::new(self.clone())))
        }
    }

    fn rows() -> RowCollectionRef {
        let rows = MemoryRowSet::new(vec![
            FieldFormat::new("id", FieldType::Integer),
            FieldFormat::new("name", FieldType::String).with_default_value("none"),
        ])
        .with_key_field("id");
        Arc::new(rows)
    }

    #[test]
    fn new_record_follows_table_format() {
        let adapter = CollectionAdapter::new(AdapterConfig::default());
        let table = RawValue::Collection(rows());
        let record = adapter.for_record(None, Some(&table)).unwrap();
        assert_eq!(
            record.fields().unwrap().iter().map(|f| f.as_ref()).collect::<Vec<_>>(),
            vec!["id", "name"]
        );
        assert_eq!(record.get("name").unwrap(), Some(RawValue::from("none")));
    }

    #[test]
    fn rows_come_from_the_supplied_factory() {
        let factory = CountingFactory::default();
        let adapter = CollectionAdapter::new(AdapterConfig::default())
            .with_factory(Arc::new(factory.clone()));

        let mut table = adapter.for_table(None).unwrap();
        assert_eq!(factory.collections.load(Ordering::SeqCst), 1);
        table
            .add_field(&FieldFormat::new("id", FieldType::Integer), None)
            .unwrap();

        let record = adapter.for_record(None, Some(&table.data())).unwrap();
        assert_eq!(factory.rows.load(Ordering::SeqCst), 1);
        assert_eq!(record.fields().unwrap().len(), 1);
        table.add(record.data(), None).unwrap();
        assert_eq!(table.count().unwrap(), 1);

        adapter.for_record(None, None).unwrap();
        assert_eq!(factory.rows.load(Ordering::SeqCst), 2);
        assert_eq!(factory.collections.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn key_field() {
        let adapter = CollectionAdapter::new(AdapterConfig::default());
        assert_eq!(
            adapter.key_field(&RawValue::Collection(rows())).unwrap().as_deref(),
            Some("id")
        );
        assert!(adapter.key_field(&RawValue::Null).is_err());
    }

    #[test]
    fn rejects_plain_data() {
        let adapter = CollectionAdapter::new(AdapterConfig::default());
        assert!(adapter.for_table(Some(RawValue::from(1))).is_err());
        assert!(adapter.for_record(Some(RawValue::from("x")), None).is_err());
    }
}
