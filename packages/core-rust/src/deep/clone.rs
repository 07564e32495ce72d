//! Identity-preserving deep clone.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{ArrayNode, MapNode, Value};

/// Produces a structurally independent copy of a value.
///
/// Scalars are copied by value; [`Value::Timestamp`] becomes a new instant
/// with the same millisecond payload. Array and map nodes are recursively
/// copied through an identity map keyed by source node address: when the
/// same source node is reachable through several paths (including through a
/// cycle), every occurrence maps to the *same* cloned node, so the output
/// preserves the input's sharing and cyclic topology instead of duplicating
/// or recursing without bound.
///
/// Mutating the clone never affects the original, and vice versa.
///
/// # Examples
///
/// ```
/// use statekit_core::{deep, Value};
///
/// let original = Value::map([("n", Value::Int(1))]);
/// let copy = deep::clone(&original);
/// copy.insert("n", Value::Int(2));
/// assert_eq!(original.get("n").and_then(|v| v.as_int()), Some(1));
/// ```
#[must_use]
pub fn clone(value: &Value) -> Value {
    let mut cloned_nodes = HashMap::new();
    clone_inner(value, &mut cloned_nodes)
}

/// `cloned_nodes` maps source node addresses to their already-created clone
/// handles. Target nodes are registered *before* their children are filled
/// so that a cycle resolves to the in-progress clone.
fn clone_inner(value: &Value, cloned_nodes: &mut HashMap<usize, Value>) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Int(n) => Value::Int(*n),
        Value::Float(x) => Value::Float(*x),
        Value::String(s) => Value::String(s.clone()),
        Value::Timestamp(millis) => Value::Timestamp(*millis),
        Value::Array(node) => {
            let ptr = Rc::as_ptr(node) as usize;
            if let Some(existing) = cloned_nodes.get(&ptr) {
                return existing.clone();
            }
            let target: ArrayNode = Rc::new(RefCell::new(Vec::new()));
            cloned_nodes.insert(ptr, Value::Array(Rc::clone(&target)));
            for item in node.borrow().iter() {
                let cloned = clone_inner(item, cloned_nodes);
                target.borrow_mut().push(cloned);
            }
            Value::Array(target)
        }
        Value::Map(node) => {
            let ptr = Rc::as_ptr(node) as usize;
            if let Some(existing) = cloned_nodes.get(&ptr) {
                return existing.clone();
            }
            let target: MapNode = Rc::new(RefCell::new(BTreeMap::new()));
            cloned_nodes.insert(ptr, Value::Map(Rc::clone(&target)));
            for (key, item) in node.borrow().iter() {
                let cloned = clone_inner(item, cloned_nodes);
                target.borrow_mut().insert(key.clone(), cloned);
            }
            Value::Map(target)
        }
    }
}
