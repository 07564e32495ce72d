//! Deep structural operations over [`Value`](crate::types::Value) graphs.
//!
//! - [`clone`]: structurally independent copy preserving shared/cyclic topology
//! - [`equal`]: cycle-safe structural equality
//! - [`diff`] / [`apply`]: minimal changed-field computation and patching
//!
//! All three walk the node graph with explicit visited tracking, so aliased
//! and cyclic inputs terminate instead of recursing without bound.

mod clone;
mod diff;
mod equal;

pub use self::clone::clone;
pub use self::diff::{apply, diff, DiffEntry, DiffMap};
pub use self::equal::equal;
