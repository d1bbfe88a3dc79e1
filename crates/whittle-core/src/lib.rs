//! Core data structures for whittle.
//!
//! Two halves:
//! - **Grammar layer**: the grammar model, the grammar DSL front-end, and
//!   minimal-replacement computation (`grammar`)
//! - **Tree layer**: the id-indexed syntax-tree arena the reducer operates
//!   on, plus the unparser (`tree`)

pub mod grammar;
pub mod tree;

pub use grammar::{
    Alt, Atom, Channel, Grammar, GrammarError, Quant, Recursion, Replacements, RuleDef, Term,
    TokenDef, TokenPattern, compute_replacements, literal_token_name, parse_grammar,
};
pub use tree::{
    InvariantViolation, Node, NodeId, NodeKind, NodeState, Position, Tree, UnparseOptions, unparse,
    unparse_node, unparse_with, verify,
};
