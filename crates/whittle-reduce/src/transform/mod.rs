//! Tree transformations that prepare a built tree for reduction.
//!
//! Each pass is idempotent, preserves unparse output and surviving node
//! ids, and leaves detached arena slots behind instead of freeing nodes.
//! The session re-verifies structural invariants after every pass.

mod flatten;
mod squeeze;
mod visibility;

pub use flatten::flatten_recursion;
pub use squeeze::squeeze;
pub use visibility::{coarse_filter, hide_unremovable};
