//! Hoisting: substitute a rule node with one of its same-rule
//! descendants.
//!
//! Pruning alone cannot collapse nesting: a chain of mandatory wrappers
//! survives every level. Hoisting lifts an inner instance of the same
//! rule into an ancestor's slot when the oracle accepts the result.
//! Search is greedy: candidates shallowest first, left to right, and a
//! committed hoist restarts from the lifted node.

use std::collections::VecDeque;

use tracing::debug;

use whittle_core::tree::{NodeId, NodeKind, NodeState, Tree};

use crate::oracle::Oracle;
use crate::session::ReduceSession;

/// Greedily hoist `node`. Returns the slot's final occupant and the
/// number of committed hoists.
pub(crate) fn hoist_node<O: Oracle>(
    s: &mut ReduceSession<O>,
    node: NodeId,
) -> (NodeId, u64) {
    let mut current = node;
    let mut hoisted = 0u64;
    'outer: loop {
        let NodeKind::Rule { name } = &s.tree.node(current).kind else {
            break;
        };
        let name = name.clone();
        for candidate in same_rule_descendants(&s.tree, current, &name) {
            if try_hoist(s, current, candidate) {
                debug!(rule = %name, "hoisted descendant into ancestor slot");
                hoisted += 1;
                current = candidate;
                continue 'outer;
            }
        }
        break;
    }
    (current, hoisted)
}

/// Same-rule descendants of `node` in breadth-first order (shallowest
/// first, left to right). Removed subtrees are not entered.
fn same_rule_descendants(tree: &Tree, node: NodeId, name: &str) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut queue: VecDeque<NodeId> = tree.children(node).iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if tree.node(id).state == NodeState::Remove {
            continue;
        }
        if matches!(&tree.node(id).kind, NodeKind::Rule { name: n } if n == name) {
            found.push(id);
        }
        queue.extend(tree.children(id).iter().copied());
    }
    found
}

/// Swap `descendant` into `node`'s slot, probe, and either commit or
/// restore. On commit `node`'s subtree is detached (minus the lifted
/// part).
fn try_hoist<O: Oracle>(s: &mut ReduceSession<O>, node: NodeId, descendant: NodeId) -> bool {
    let d_parent = s
        .tree
        .node(descendant)
        .parent
        .expect("descendant has a parent");
    let d_slot = s
        .tree
        .children(d_parent)
        .iter()
        .position(|&c| c == descendant)
        .expect("parent lists descendant");
    let n_parent = s.tree.node(node).parent;

    // Occupy the slot.
    match n_parent {
        Some(p) => {
            let n_slot = s
                .tree
                .children(p)
                .iter()
                .position(|&c| c == node)
                .expect("parent lists node");
            s.tree.node_mut(p).children[n_slot] = descendant;
            s.tree.node_mut(descendant).parent = Some(p);
            s.tree.node_mut(node).parent = None;
        }
        None => s.tree.set_root(descendant),
    }

    if s.probe() {
        // Commit: cut the stale edge inside the detached subtree.
        s.tree.node_mut(d_parent).children.remove(d_slot);
        true
    } else {
        // Restore both links.
        match n_parent {
            Some(p) => {
                let slot = s
                    .tree
                    .children(p)
                    .iter()
                    .position(|&c| c == descendant)
                    .expect("slot still holds descendant");
                s.tree.node_mut(p).children[slot] = node;
                s.tree.node_mut(node).parent = Some(p);
            }
            None => s.tree.set_root(node),
        }
        s.tree.node_mut(descendant).parent = Some(d_parent);
        false
    }
}
