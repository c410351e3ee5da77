//! Uniform table and record views over raw data
//!
//! Tabular data arrives in several physical representations: plain arrays of objects, the
//! columnar wire format with shared field descriptors, and collections of materialized row
//! entities. An [`Adapter`] creates [`Table`] and [`Record`] views over one representation, and
//! callers work through those views without knowing which representation backs them. A
//! [`cow::CowAdapter`] decorates any adapter with copy-on-write views.

pub use adapter::*;
pub use config::*;
pub use field_index::FieldIndexed;
pub use property::*;
pub use record::*;
pub use table::*;

mod adapter;
pub mod aliases;
pub mod collection;
pub mod columnar;
mod config;
pub mod cow;
mod field_index;
mod generic;
pub mod plain;
mod property;
pub mod raw;
mod record;
mod table;

static_assertions::assert_impl_all!(raw::RawValue: Send, Sync);
static_assertions::assert_impl_all!(raw::RawArray: Send, Sync);
static_assertions::assert_impl_all!(raw::RawObject: Send, Sync);
static_assertions::assert_impl_all!(AdapterConfig: Send, Sync);
static_assertions::assert_impl_all!(cow::CowAdapter: Send, Sync);
