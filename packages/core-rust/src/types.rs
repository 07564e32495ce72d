//! Dynamic value type shared by the caches, the store, and the deep utilities.
//!
//! [`Value`] covers the JSON-compatible scalar types plus a temporal-point
//! variant, and represents arrays and maps as reference-counted interior
//! nodes. Because compound nodes are shared handles, the same node can be
//! reachable through several paths of one value, including through a cycle.
//! That makes aliased and cyclic structure representable, which the deep
//! utilities in [`crate::deep`] rely on.
//!
//! `Value::clone()` is a *shallow* handle copy: the clone shares every
//! compound node with the original. Use [`crate::deep::clone`] for a
//! structurally independent copy.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Shared interior node of an array value.
pub type ArrayNode = Rc<RefCell<Vec<Value>>>;

/// Shared interior node of a map value.
/// Uses `BTreeMap` for deterministic iteration and serialization order.
pub type MapNode = Rc<RefCell<BTreeMap<String, Value>>>;

/// Generic runtime value.
///
/// Scalars are stored inline; `Array` and `Map` hold shared nodes so that
/// one node may appear at several positions within a single value.
///
/// There is intentionally no `PartialEq` implementation: structural
/// comparison must guard against cycles, which [`crate::deep::equal`] does.
///
/// # Examples
///
/// ```
/// use statekit_core::Value;
///
/// let user = Value::map([
///     ("name", Value::from("Alice")),
///     ("age", Value::Int(30)),
/// ]);
/// assert_eq!(user.get("age").and_then(|v| v.as_int()), Some(30));
/// ```
#[derive(Clone)]
pub enum Value {
    /// Absence of a value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed 64-bit integer.
    Int(i64),
    /// 64-bit IEEE 754 floating-point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Temporal point: milliseconds since the Unix epoch.
    Timestamp(i64),
    /// Ordered sequence of values (shared node).
    Array(ArrayNode),
    /// String-keyed map of values (shared node).
    Map(MapNode),
}

impl Value {
    /// Creates an array value from the given items.
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items.into_iter().collect())))
    }

    /// Creates a map value from the given entries.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Creates an empty map value.
    #[must_use]
    pub fn empty_map() -> Self {
        Value::Map(Rc::new(RefCell::new(BTreeMap::new())))
    }

    /// Returns `true` if this value is a map.
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Returns the shared map node, or `None` if this value is not a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            Value::Map(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the shared array node, or `None` if this value is not an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Value::Array(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the integer payload, or `None` for any other variant.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string payload, or `None` for any other variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a field on a map value. Returns a shared handle to the
    /// field's value, or `None` if the key is absent or `self` is not a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_map().and_then(|node| node.borrow().get(key).cloned())
    }

    /// Inserts a field on a map value, returning the previous value if any.
    /// No effect when `self` is not a map.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.as_map()
            .and_then(|node| node.borrow_mut().insert(key.into(), value))
    }

    /// Removes a field from a map value, returning it if it was present.
    /// No effect when `self` is not a map.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.as_map().and_then(|node| node.borrow_mut().remove(key))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut in_progress = Vec::new();
        fmt_value(self, f, &mut in_progress)
    }
}

/// Recursive `Debug` body with an in-progress node stack so cyclic values
/// print `<cycle>` instead of recursing forever.
fn fmt_value(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    in_progress: &mut Vec<usize>,
) -> fmt::Result {
    match value {
        Value::Null => f.write_str("Null"),
        Value::Bool(b) => write!(f, "Bool({b})"),
        Value::Int(n) => write!(f, "Int({n})"),
        Value::Float(x) => write!(f, "Float({x})"),
        Value::String(s) => write!(f, "String({s:?})"),
        Value::Timestamp(millis) => write!(f, "Timestamp({millis})"),
        Value::Array(node) => {
            let ptr = Rc::as_ptr(node) as usize;
            if in_progress.contains(&ptr) {
                return f.write_str("<cycle>");
            }
            in_progress.push(ptr);
            f.write_str("Array[")?;
            for (i, item) in node.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt_value(item, f, in_progress)?;
            }
            in_progress.pop();
            f.write_str("]")
        }
        Value::Map(node) => {
            let ptr = Rc::as_ptr(node) as usize;
            if in_progress.contains(&ptr) {
                return f.write_str("<cycle>");
            }
            in_progress.push(ptr);
            f.write_str("Map{")?;
            for (i, (key, item)) in node.borrow().iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{key:?}: ")?;
                fmt_value(item, f, in_progress)?;
            }
            in_progress.pop();
            f.write_str("}")
        }
    }
}
