//! Grammar-aware hierarchical test-case reduction.
//!
//! Pipeline: the [`build`] module parses an input with a grammar
//! [`Bundle`] into a syntax-tree arena; [`transform`] prepares the tree
//! for reduction (recursion flattening, squeeze, visibility filters); a
//! [`ReduceSession`] then drives level-wise delta debugging against a
//! user [`Oracle`] until a fixed point, and unparses the reduced tree.

pub mod build;
pub mod bundle;
pub mod oracle;
pub mod session;
pub mod transform;

mod cache;
mod hdd;

#[cfg(test)]
mod scenario_tests;

pub use build::{BuildError, BuildIssue, BuildOutput, build_tree};
pub use bundle::{Bundle, GrammarSet, IslandRule};
pub use oracle::{FnOracle, Oracle, SubprocessOracle, Verdict};
pub use session::{ReduceConfig, ReduceError, ReduceSession, Reduction, Stats, Variant};
