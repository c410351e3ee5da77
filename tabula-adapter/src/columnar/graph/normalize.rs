use tabula_error::{TabulaResult, tabula_err};
use tabula_format::{FieldDescriptor, structural_key};

use crate::aliases::hash_map::HashMap;
use crate::columnar::graph::walk::Walker;
use crate::columnar::graph::{FormatCache, FormatId};
use crate::columnar::{FORMAT_ID_KEY, FORMAT_KEY, is_columnar_node};
use crate::raw::{RawArray, RawValue};

/// Inline every format reference in `raw`, in place.
///
/// Fails with `UnresolvedFormatReference` if a reference names a format that is defined
/// nowhere in `raw`.
pub fn denormalize_formats(raw: &RawValue) -> TabulaResult<()> {
    let mut cache = FormatCache::new(raw.clone());
    cache.warm()?;
    match cache.first_unresolved() {
        None => Ok(()),
        Some(id) => Err(tabula_err!(UnresolvedFormatReference: id)),
    }
}

/// A copy of `raw` in which every repeated descriptor list is replaced by a reference.
///
/// The first occurrence of each distinct list stays inline and implicitly takes the next id,
/// starting at 0 in pre-order. Later occurrences of a structurally equal list carry only an
/// `f` reference to that id. `raw` itself is left untouched.
pub fn normalize_formats(raw: &RawValue) -> TabulaResult<RawValue> {
    let resolved = raw.deep_clone();
    denormalize_formats(&resolved)?;
    // A second copy drops the marks the resolution left behind.
    let normalized = resolved.deep_clone();

    let mut ids: HashMap<String, FormatId> = HashMap::new();
    for node in Walker::new(normalized.clone()) {
        let RawValue::Object(object) = node else {
            continue;
        };
        if !is_columnar_node(&object) {
            continue;
        }
        let Some(RawValue::Array(descriptors)) = object.get(FORMAT_KEY) else {
            continue;
        };
        let key = list_key(&descriptors)?;
        match ids.get(&key) {
            Some(&id) => {
                object.remove(FORMAT_KEY);
                object.insert(FORMAT_ID_KEY, RawValue::Int(id as i64));
            }
            None => {
                let id = ids.len() as FormatId;
                ids.insert(key, id);
                object.remove(FORMAT_ID_KEY);
            }
        }
    }
    log::debug!("normalized payload down to {} distinct formats", ids.len());
    Ok(normalized)
}

fn list_key(descriptors: &RawArray) -> TabulaResult<String> {
    let decoded = serde_json::from_value::<Vec<FieldDescriptor>>(
        RawValue::Array(descriptors.clone()).to_json(),
    )
    .map_err(|err| tabula_err!(InvalidPayloadShape: "malformed descriptor list: {}", err))?;
    Ok(structural_key(&decoded))
}
