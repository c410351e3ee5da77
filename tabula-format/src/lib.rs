//! Field formats for tabula
//!
//! This crate contains the description of a single field as the adapter layer consumes it: the
//! [`FieldFormat`] value, the [`FieldType`] name space with its bidirectional wire tag table, the
//! reusable [`UniversalField`] scratch record, and the wire-level [`FieldDescriptor`] of the
//! columnar format.

pub use descriptor::*;
pub use field_type::*;
pub use format::*;
pub use universal::*;

mod descriptor;
mod field_type;
mod format;
mod universal;

static_assertions::assert_impl_all!(FieldFormat: Send, Sync);
static_assertions::assert_impl_all!(FieldDescriptor: Send, Sync);
