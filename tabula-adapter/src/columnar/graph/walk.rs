use tabula_format::FieldName;

use crate::aliases::hash_map::HashMap;
use crate::columnar::{DATA_KEY, FORMAT_KEY};
use crate::raw::{RawObject, RawValue};

enum Frame {
    Root(Option<RawValue>),
    Array { items: Vec<RawValue>, cursor: usize },
    Object {
        entries: Vec<(FieldName, RawValue)>,
        cursor: usize,
    },
}

impl Frame {
    fn next_child(&mut self) -> Option<RawValue> {
        match self {
            Frame::Root(root) => root.take(),
            Frame::Array { items, cursor } => {
                let child = items.get(*cursor).cloned();
                *cursor += 1;
                child
            }
            Frame::Object { entries, cursor } => {
                let child = entries.get(*cursor).map(|(_, value)| value.clone());
                *cursor += 1;
                child
            }
        }
    }
}

/// A pre-order walk over the arrays and objects reachable from a root value.
///
/// The walk keeps its position on an explicit stack of frames, so it can be suspended after any
/// node and resumed later without revisiting what it has already seen. Every container is
/// yielded once, however many paths lead to it. Descriptor lists of columnar nodes are not
/// entered.
pub(crate) struct Walker {
    stack: Vec<Frame>,
    // Holding on to visited nodes keeps their addresses from being reused.
    visited: HashMap<usize, RawValue>,
}

impl Walker {
    pub(crate) fn new(root: RawValue) -> Self {
        Self {
            stack: vec![Frame::Root(Some(root))],
            visited: HashMap::new(),
        }
    }

    /// Returns `true` once every reachable node has been yielded.
    pub(crate) fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    fn first_visit(&mut self, addr: usize, node: &RawValue) -> bool {
        self.visited.insert(addr, node.clone()).is_none()
    }
}

impl Iterator for Walker {
    type Item = RawValue;

    fn next(&mut self) -> Option<RawValue> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(child) = frame.next_child() else {
                self.stack.pop();
                continue;
            };
            match &child {
                RawValue::Array(array) => {
                    if !self.first_visit(array.addr(), &child) {
                        continue;
                    }
                    self.stack.push(Frame::Array {
                        items: array.to_vec(),
                        cursor: 0,
                    });
                }
                RawValue::Object(object) => {
                    if !self.first_visit(object.addr(), &child) {
                        continue;
                    }
                    self.stack.push(Frame::Object {
                        entries: children(object),
                        cursor: 0,
                    });
                }
                _ => continue,
            }
            return Some(child);
        }
    }
}

fn children(object: &RawObject) -> Vec<(FieldName, RawValue)> {
    let columnar = object.contains_key(DATA_KEY);
    object
        .entries()
        .into_iter()
        .filter(|(key, _)| !(columnar && key.as_ref() == FORMAT_KEY))
        .collect()
}
