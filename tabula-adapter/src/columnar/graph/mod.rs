//! The format graph of a columnar payload.
//!
//! A columnar payload may define a descriptor list once and reference it by id from many
//! nodes, at any depth. Denormalization inlines those references and normalization folds
//! repeated lists back into references. Both traverse the payload in the same pre-order, which
//! is what lets the first occurrence of a list carry its id implicitly.

mod cache;
mod normalize;
mod walk;

pub(crate) use cache::*;
pub use normalize::*;

use crate::raw::RawArray;

/// The id of a descriptor list, valid within one payload only.
pub type FormatId = u64;

/// What the format graph engine has done to a columnar node.
#[derive(Debug, Clone)]
pub(crate) enum FormatMark {
    /// The node defines format `id`. `snapshot` is a copy of its list taken at that time.
    Defined { id: FormatId, snapshot: RawArray },
    /// The node referenced format `id`, which has been inlined into it.
    Materialized { id: FormatId },
}
