use tabula_error::{TabulaResult, tabula_bail, tabula_err};

use crate::aliases::hash_map::HashMap;
use crate::columnar::graph::walk::Walker;
use crate::columnar::graph::{FormatId, FormatMark};
use crate::columnar::{FORMAT_ID_KEY, FORMAT_KEY, is_columnar_node};
use crate::raw::{RawArray, RawObject, RawValue};

/// The formats defined within one payload, discovered lazily.
///
/// The cache walks the payload only as far as needed to find a requested format and resumes
/// from there on the next miss. Every columnar node the walk passes is processed once:
///
/// * a node with an inline descriptor list defines a format, under its explicit `f` id or the
///   next implicit one, and the cache stores a private copy of the list;
/// * a node with only an `f` reference gets a copy of the referenced list inlined, or waits
///   until the definition turns up later in the walk.
///
/// Processing leaves a mark on the node, so walking the same payload again, from this cache or
/// any other one, assigns the same ids and inlines nothing twice.
pub(crate) struct FormatCache {
    formats: HashMap<FormatId, RawArray>,
    walker: Walker,
    next_id: FormatId,
    pending: HashMap<FormatId, Vec<RawObject>>,
}

impl FormatCache {
    pub(crate) fn new(root: RawValue) -> Self {
        Self {
            formats: HashMap::new(),
            walker: Walker::new(root),
            next_id: 0,
            pending: HashMap::new(),
        }
    }

    /// A copy of the descriptor list of format `id`.
    pub(crate) fn get(&mut self, id: FormatId) -> TabulaResult<RawArray> {
        if !self.formats.contains_key(&id) {
            self.walk(Some(id))?;
        }
        match self.formats.get(&id) {
            Some(snapshot) => Ok(snapshot.deep_clone()),
            None => {
                log::debug!("format {id} is not defined in the payload");
                Err(tabula_err!(UnresolvedFormatReference: id))
            }
        }
    }

    /// The descriptor list of a columnar node, inlining it first if the node only references
    /// it. Returns `None` for a node with neither.
    pub(crate) fn resolve_node(&mut self, node: &RawObject) -> TabulaResult<Option<RawArray>> {
        match node.get(FORMAT_KEY) {
            Some(RawValue::Array(descriptors)) => return Ok(Some(descriptors)),
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "descriptor list is {}, not an array",
                other.type_name()
            ),
            None => {}
        }
        match node.get(FORMAT_ID_KEY) {
            Some(reference) => {
                let id = format_id(&reference)?;
                let snapshot = self.get(id)?;
                materialize(node, id, snapshot.clone());
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    /// Inline every format reference within `value`.
    pub(crate) fn resolve_value(&mut self, value: &RawValue) -> TabulaResult<()> {
        for node in Walker::new(value.clone()) {
            if let RawValue::Object(object) = &node {
                if is_columnar_node(object) {
                    self.resolve_node(object)?;
                }
            }
        }
        Ok(())
    }

    /// Walk the whole payload, inlining every reference whose format is defined in it.
    pub(crate) fn warm(&mut self) -> TabulaResult<()> {
        self.walk(None)
    }

    /// The lowest id of a reference the walk could not resolve.
    pub(crate) fn first_unresolved(&self) -> Option<FormatId> {
        self.pending.keys().min().copied()
    }

    fn walk(&mut self, target: Option<FormatId>) -> TabulaResult<()> {
        if !self.walker.is_done() {
            match target {
                Some(id) => log::trace!("walking payload for format {id}"),
                None => log::trace!("walking the rest of the payload"),
            }
        }
        while let Some(node) = self.next_columnar_node() {
            let defined = self.process(&node)?;
            if defined.is_some() && defined == target {
                return Ok(());
            }
        }
        Ok(())
    }

    fn next_columnar_node(&mut self) -> Option<RawObject> {
        self.walker.find_map(|node| match node {
            RawValue::Object(object) if is_columnar_node(&object) => Some(object),
            _ => None,
        })
    }

    fn process(&mut self, node: &RawObject) -> TabulaResult<Option<FormatId>> {
        match node.mark() {
            Some(FormatMark::Defined { id, snapshot }) => {
                self.register(id, snapshot);
                return Ok(Some(id));
            }
            Some(FormatMark::Materialized { id }) => {
                log::trace!("format {id} is already inlined");
                return Ok(None);
            }
            None => {}
        }

        let explicit = node
            .get(FORMAT_ID_KEY)
            .map(|reference| format_id(&reference))
            .transpose()?;
        match node.get(FORMAT_KEY) {
            Some(RawValue::Array(descriptors)) => {
                let id = explicit.unwrap_or(self.next_id);
                let snapshot = descriptors.deep_clone();
                node.remove(FORMAT_ID_KEY);
                node.set_mark(FormatMark::Defined {
                    id,
                    snapshot: snapshot.clone(),
                });
                self.register(id, snapshot);
                Ok(Some(id))
            }
            Some(other) => tabula_bail!(
                InvalidPayloadShape: "descriptor list is {}, not an array",
                other.type_name()
            ),
            None => {
                if let Some(id) = explicit {
                    match self.formats.get(&id) {
                        Some(snapshot) => materialize(node, id, snapshot.deep_clone()),
                        None => self.pending.entry(id).or_default().push(node.clone()),
                    }
                }
                Ok(None)
            }
        }
    }

    fn register(&mut self, id: FormatId, snapshot: RawArray) {
        self.next_id = self.next_id.max(id + 1);
        if let Some(waiting) = self.pending.remove(&id) {
            for node in waiting {
                materialize(&node, id, snapshot.deep_clone());
            }
        }
        self.formats.insert(id, snapshot);
    }
}

fn materialize(node: &RawObject, id: FormatId, descriptors: RawArray) {
    node.insert(FORMAT_KEY, RawValue::Array(descriptors));
    node.remove(FORMAT_ID_KEY);
    node.set_mark(FormatMark::Materialized { id });
}

pub(crate) fn format_id(reference: &RawValue) -> TabulaResult<FormatId> {
    match reference.as_i64().and_then(|id| FormatId::try_from(id).ok()) {
        Some(id) => Ok(id),
        None => tabula_bail!(
            InvalidPayloadShape: "format reference must be a non-negative integer, got {}",
            reference.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tabula_error::TabulaError;

    use super::*;

    fn descriptors(name: &str) -> serde_json::Value {
        json!([{"n": name, "t": "Integer-tag"}])
    }

    #[test]
    fn implicit_ids_follow_pre_order() {
        let root = RawValue::from(json!([
            {"d": [1], "s": descriptors("a")},
            {"d": [2], "s": descriptors("b")},
            {"d": [3], "f": 1},
            {"d": [4], "f": 0}
        ]));
        let mut cache = FormatCache::new(root.clone());
        assert_eq!(RawValue::Array(cache.get(1).unwrap()).to_json(), descriptors("b"));
        let rows = root.as_array().unwrap();
        let third = rows.get(2).unwrap();
        assert!(third.as_object().unwrap().get("s").is_none());

        cache.warm().unwrap();
        assert_eq!(third.to_json(), json!({"d": [3], "s": descriptors("b")}));
        assert_eq!(
            rows.get(3).unwrap().to_json(),
            json!({"d": [4], "s": descriptors("a")})
        );
    }

    #[test]
    fn walk_stops_at_target() {
        let root = RawValue::from(json!([
            {"d": [], "s": descriptors("a")},
            {"d": [], "f": 0},
        ]));
        let mut cache = FormatCache::new(root.clone());
        cache.get(0).unwrap();
        assert!(!cache.walker.is_done());
        let second = root.as_array().unwrap().get(1).unwrap();
        assert!(second.as_object().unwrap().contains_key("f"));
    }

    #[test]
    fn forward_references_wait_for_definition() {
        let root = RawValue::from(json!([
            {"d": [], "f": 7},
            {"d": [], "f": 7, "s": descriptors("a")},
        ]));
        let mut cache = FormatCache::new(root.clone());
        cache.warm().unwrap();
        assert_eq!(cache.first_unresolved(), None);
        let first = root.as_array().unwrap().get(0).unwrap();
        assert_eq!(first.to_json(), json!({"d": [], "s": descriptors("a")}));
    }

    #[test]
    fn unresolved_reference() {
        let root = RawValue::from(json!({"d": [], "f": 3}));
        let mut cache = FormatCache::new(root.clone());
        let err = cache.resolve_node(root.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, TabulaError::UnresolvedFormatReference(3, _)));
        assert_eq!(cache.first_unresolved(), Some(3));
    }

    #[test]
    fn snapshots_are_isolated_from_nodes() {
        let root = RawValue::from(json!([
            {"d": [], "s": descriptors("a")},
            {"d": [], "f": 0},
        ]));
        let mut cache = FormatCache::new(root.clone());
        let rows = root.as_array().unwrap();
        let first = rows.get(0).unwrap();
        let first = first.as_object().unwrap();
        cache.warm().unwrap();

        first.get("s").unwrap().as_array().unwrap().clear();
        let second = rows.get(1).unwrap();
        assert_eq!(second.to_json(), json!({"d": [], "s": descriptors("a")}));
        assert_eq!(cache.get(0).unwrap().len(), 1);
    }

    #[test]
    fn second_cache_reuses_marks() {
        let root = RawValue::from(json!([
            {"d": [], "s": descriptors("a")},
            {"d": [], "s": descriptors("b")},
            {"d": [], "f": 1},
        ]));
        FormatCache::new(root.clone()).warm().unwrap();

        // Marks left by the first cache keep the numbering of a second one stable.
        let mut cache = FormatCache::new(root);
        assert_eq!(RawValue::Array(cache.get(1).unwrap()).to_json(), descriptors("b"));
        assert_eq!(cache.get(0).unwrap().len(), 1);
    }
}
