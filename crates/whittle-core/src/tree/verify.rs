//! Structural self-checks run after every tree transformation.

use thiserror::Error;

use super::{NodeId, Tree};

/// A structural invariant failed after a transformation. Always indicates
/// a bug in the transformation, never in the input.
#[derive(Debug, Clone, Error)]
pub enum InvariantViolation {
    #[error("tree has no root")]
    MissingRoot,

    #[error("root node {0:?} is not a rule node")]
    RootNotRule(NodeId),

    #[error("node {child:?} is listed under {parent:?} but points back to {actual:?}")]
    ParentMismatch {
        parent: NodeId,
        child: NodeId,
        actual: Option<NodeId>,
    },

    #[error("terminal node {0:?} has children")]
    TerminalWithChildren(NodeId),

    #[error("node {0:?} is reachable through more than one path")]
    SharedNode(NodeId),
}

/// Walk the reachable tree and check that the root is a rule node, that
/// parent and child links agree, that terminals are leaves, and that no
/// node is reachable twice. Detached arena slots are ignored.
pub fn verify(tree: &Tree) -> Result<(), InvariantViolation> {
    let Some(root) = tree.try_root() else {
        return Err(InvariantViolation::MissingRoot);
    };
    if !tree.node(root).kind.is_rule() {
        return Err(InvariantViolation::RootNotRule(root));
    }

    let mut seen = vec![false; tree.len()];
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let slot = id.as_u32() as usize;
        if seen[slot] {
            return Err(InvariantViolation::SharedNode(id));
        }
        seen[slot] = true;

        let node = tree.node(id);
        if node.kind.is_terminal() && !node.children.is_empty() {
            return Err(InvariantViolation::TerminalWithChildren(id));
        }
        for &child in &node.children {
            let actual = tree.node(child).parent;
            if actual != Some(id) {
                return Err(InvariantViolation::ParentMismatch {
                    parent: id,
                    child,
                    actual,
                });
            }
            stack.push(child);
        }
    }
    Ok(())
}
