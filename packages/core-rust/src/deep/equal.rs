//! Cycle-safe structural equality.

use std::rc::Rc;

use crate::types::Value;

/// Compares two values by structure rather than node identity.
///
/// Comparison is variant-strict: `Int(1)` and `Float(1.0)` are unequal, and
/// floats compare with IEEE semantics (`NaN` is unequal to itself). Arrays
/// compare element by element, maps key by key.
///
/// Node pairs currently being compared are tracked on a stack; when a pair
/// recurs the walk assumes equality for that pair, so cyclic inputs
/// terminate. Two values that only differ beyond a cycle's closing edge
/// cannot exist, which makes that assumption sound.
#[must_use]
pub fn equal(a: &Value, b: &Value) -> bool {
    let mut in_progress = Vec::new();
    equal_inner(a, b, &mut in_progress)
}

fn equal_inner(a: &Value, b: &Value, in_progress: &mut Vec<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Timestamp(x), Value::Timestamp(y)) => x == y,
        (Value::Array(na), Value::Array(nb)) => {
            if Rc::ptr_eq(na, nb) {
                return true;
            }
            let pair = (Rc::as_ptr(na) as usize, Rc::as_ptr(nb) as usize);
            if in_progress.contains(&pair) {
                return true;
            }
            in_progress.push(pair);
            let left = na.borrow();
            let right = nb.borrow();
            let result = left.len() == right.len()
                && left
                    .iter()
                    .zip(right.iter())
                    .all(|(x, y)| equal_inner(x, y, in_progress));
            in_progress.pop();
            result
        }
        (Value::Map(na), Value::Map(nb)) => {
            if Rc::ptr_eq(na, nb) {
                return true;
            }
            let pair = (Rc::as_ptr(na) as usize, Rc::as_ptr(nb) as usize);
            if in_progress.contains(&pair) {
                return true;
            }
            in_progress.push(pair);
            let left = na.borrow();
            let right = nb.borrow();
            let result = left.len() == right.len()
                && left.iter().all(|(key, x)| {
                    right
                        .get(key)
                        .is_some_and(|y| equal_inner(x, y, in_progress))
                });
            in_progress.pop();
            result
        }
        _ => false,
    }
}
