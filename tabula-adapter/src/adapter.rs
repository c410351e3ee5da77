use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use tabula_error::{TabulaResult, tabula_bail};
use tabula_format::FieldName;

use crate::collection::CollectionAdapter;
use crate::columnar::{ColumnarAdapter, is_columnar_node};
use crate::config::AdapterConfig;
use crate::plain::PlainAdapter;
use crate::property::{get_property, set_property};
use crate::raw::RawValue;
use crate::{Record, Table};

pub type AdapterRef = Arc<dyn Adapter>;

/// Creates table and record views over raw data of one physical representation.
pub trait Adapter: Debug + Send + Sync {
    fn kind(&self) -> AdapterKind;

    fn config(&self) -> &AdapterConfig;

    /// Create a table view over `raw`, or over a new empty table when `raw` is `None`.
    ///
    /// Creating the view never modifies `raw`.
    fn for_table(&self, raw: Option<RawValue>) -> TabulaResult<Box<dyn Table>>;

    /// Create a record view over `raw`, or over a new empty record when `raw` is `None`.
    ///
    /// A new record takes what it needs to be compatible with the rows of `table` from it,
    /// such as the shared format or the row factory.
    fn for_record(
        &self,
        raw: Option<RawValue>,
        table: Option<&RawValue>,
    ) -> TabulaResult<Box<dyn Record>>;

    /// The name of the field acting as the primary key of `raw`, if the representation has one.
    fn key_field(&self, raw: &RawValue) -> TabulaResult<Option<FieldName>>;

    /// Read the value at a separated property path, `None` if any segment is missing.
    fn get_property(&self, raw: &RawValue, path: &str) -> Option<RawValue> {
        get_property(raw, path, self.config().property_separator())
    }

    /// Write the value at a separated property path, creating missing intermediate objects.
    fn set_property(&self, raw: &RawValue, path: &str, value: RawValue) -> TabulaResult<()> {
        set_property(raw, path, value, self.config().property_separator())
    }
}

/// The closed set of adapter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Plain,
    Columnar,
    Collection,
    Cow,
}

impl AdapterKind {
    /// Classify the physical representation of a raw payload.
    pub fn detect(raw: &RawValue) -> AdapterKind {
        match raw {
            RawValue::Entity(_) | RawValue::Collection(_) => AdapterKind::Collection,
            RawValue::Object(object) if is_columnar_node(object) => AdapterKind::Columnar,
            _ => AdapterKind::Plain,
        }
    }

    /// Create an adapter of this kind.
    ///
    /// A copy-on-write adapter decorates another adapter and cannot be created on its own, see
    /// [`crate::cow::CowAdapter::new`].
    pub fn adapter(self, config: AdapterConfig) -> TabulaResult<AdapterRef> {
        let adapter: AdapterRef = match self {
            AdapterKind::Plain => Arc::new(PlainAdapter::new(config)),
            AdapterKind::Columnar => Arc::new(ColumnarAdapter::new(config)),
            AdapterKind::Collection => Arc::new(CollectionAdapter::new(config)),
            AdapterKind::Cow => {
                tabula_bail!(UnsupportedOperation: "a copy-on-write adapter needs an adapter to wrap")
            }
        };
        Ok(adapter)
    }
}

impl Display for AdapterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::Plain => write!(f, "plain"),
            AdapterKind::Columnar => write!(f, "columnar"),
            AdapterKind::Collection => write!(f, "collection"),
            AdapterKind::Cow => write!(f, "cow"),
        }
    }
}
