//! Changed-field computation between two map values, and patch application.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::deep::{clone, equal};
use crate::types::Value;

/// One level of a diff: changed keys mapped to how they changed.
pub type DiffMap = BTreeMap<String, DiffEntry>;

/// How a single key differs between `original` and `updated`.
#[derive(Debug, Clone)]
pub enum DiffEntry {
    /// The key resolves to `updated`'s value (new key, or changed leaf/array).
    Changed(Value),
    /// The key is present in `original` but absent in `updated`.
    Removed,
    /// Both values are maps and differ somewhere below; only the changed
    /// portion is carried.
    Nested(DiffMap),
}

/// Computes the set of changed fields between two values.
///
/// The diff is defined over map values and is flat at each level:
///
/// - a key present only in `updated` is reported as
///   [`DiffEntry::Changed`] with `updated`'s value;
/// - a key present only in `original` is reported as [`DiffEntry::Removed`];
/// - a key whose values are both maps recurses, and is included only when
///   the nested diff is non-empty;
/// - any other pair compares with [`equal`]; unequal values report
///   [`DiffEntry::Changed`] with `updated`'s value. Arrays are never
///   recursed: two arrays differing in one element are reported wholesale.
///
/// Non-map inputs produce an empty diff, and `diff(x, x)` is empty for any
/// `x`, including cyclic values. Reported values are shared handles into
/// `updated`, not copies.
///
/// # Examples
///
/// ```
/// use statekit_core::{deep, Value};
///
/// let before = Value::map([("name", Value::from("Ada")), ("age", Value::Int(36))]);
/// let after = Value::map([("name", Value::from("Ada")), ("age", Value::Int(37))]);
/// let changes = deep::diff(&before, &after);
/// assert_eq!(changes.len(), 1);
/// assert!(changes.contains_key("age"));
/// ```
#[must_use]
pub fn diff(original: &Value, updated: &Value) -> DiffMap {
    let mut in_progress = Vec::new();
    diff_inner(original, updated, &mut in_progress)
}

fn diff_inner(
    original: &Value,
    updated: &Value,
    in_progress: &mut Vec<(usize, usize)>,
) -> DiffMap {
    let (Some(before), Some(after)) = (original.as_map(), updated.as_map()) else {
        return DiffMap::new();
    };
    if Rc::ptr_eq(before, after) {
        return DiffMap::new();
    }
    let pair = (Rc::as_ptr(before) as usize, Rc::as_ptr(after) as usize);
    if in_progress.contains(&pair) {
        // Revisited pair along a cycle: any difference is reported where the
        // cycle was entered.
        return DiffMap::new();
    }
    in_progress.push(pair);

    let left = before.borrow();
    let right = after.borrow();
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

    let mut changes = DiffMap::new();
    for key in keys {
        match (left.get(key), right.get(key)) {
            (None, Some(new_value)) => {
                changes.insert(key.clone(), DiffEntry::Changed(new_value.clone()));
            }
            (Some(_), None) => {
                changes.insert(key.clone(), DiffEntry::Removed);
            }
            (Some(old_value), Some(new_value)) => {
                if old_value.is_map() && new_value.is_map() {
                    let nested = diff_inner(old_value, new_value, in_progress);
                    if !nested.is_empty() {
                        changes.insert(key.clone(), DiffEntry::Nested(nested));
                    }
                } else if !equal(old_value, new_value) {
                    changes.insert(key.clone(), DiffEntry::Changed(new_value.clone()));
                }
            }
            (None, None) => {}
        }
    }

    in_progress.pop();
    changes
}

/// Applies a diff onto a map value.
///
/// [`DiffEntry::Changed`] assigns a deep clone of the carried value,
/// [`DiffEntry::Removed`] deletes the key, and [`DiffEntry::Nested`]
/// recurses (materializing an empty map first when the key is missing or
/// not a map). Applying `diff(a, b)` onto a deep clone of `a` reproduces
/// `b`'s values for exactly the reported keys. No effect on non-map targets.
pub fn apply(target: &Value, changes: &DiffMap) {
    if !target.is_map() {
        return;
    }
    for (key, entry) in changes {
        match entry {
            DiffEntry::Changed(new_value) => {
                target.insert(key.clone(), clone(new_value));
            }
            DiffEntry::Removed => {
                target.remove(key);
            }
            DiffEntry::Nested(nested) => {
                let field = match target.get(key) {
                    Some(existing) if existing.is_map() => existing,
                    _ => {
                        let fresh = Value::empty_map();
                        target.insert(key.clone(), fresh.clone());
                        fresh
                    }
                };
                apply(&field, nested);
            }
        }
    }
}
