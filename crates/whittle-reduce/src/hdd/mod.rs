//! Level-wise hierarchical reduction.
//!
//! A pass enumerates levels of the tree (breadth-first depth slices, or
//! subtree-at-a-time for the recursive variant) and submits each level's
//! reducible nodes to the set minimizer. Candidate evaluation snapshots
//! node states, renders, consults the cache/oracle, and restores; only
//! the minimizer's final kept set is committed. Hoisting additionally
//! tries to substitute rule nodes (removable or not, the root included)
//! with same-rule descendants. A final per-node sweep catches single
//! removals the set granularity missed.

mod hoist;

use std::collections::HashSet;

use tracing::debug;
use whittle_ddmin::ddmin;

use whittle_core::tree::{NodeId, NodeKind, NodeState, Tree};

use crate::oracle::Oracle;
use crate::session::{ReduceError, ReduceSession, Variant};

/// Run one full reduction pass over every level.
pub(crate) fn run_pass<O: Oracle>(s: &mut ReduceSession<O>) -> Result<(), ReduceError> {
    match s.config.variant {
        Variant::Bfs => bfs_pass(s),
        Variant::Recursive => recursive_pass(s),
    }
}

fn bfs_pass<O: Oracle>(s: &mut ReduceSession<O>) -> Result<(), ReduceError> {
    let mut depth = 0;
    loop {
        s.check_cancelled()?;
        let (nodes, any_at_depth) = collect_depth(&s.tree, depth);
        if !any_at_depth {
            return Ok(());
        }

        let level: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&id| reducible(&s.tree, id, s.config.reduce_hidden))
            .collect();
        prune_level(s, &level);

        if s.config.hoist {
            for id in nodes {
                let node = s.tree.node(id);
                if node.kind.is_rule() && node.state != NodeState::Remove {
                    let (_, hoisted) = hoist::hoist_node(s, id);
                    s.stats.hoisted_nodes += hoisted;
                }
            }
        }
        depth += 1;
    }
}

fn recursive_pass<O: Oracle>(s: &mut ReduceSession<O>) -> Result<(), ReduceError> {
    let Some(root) = s.tree.try_root() else {
        return Ok(());
    };
    let mut stack = vec![root];
    while let Some(mut subtree) = stack.pop() {
        s.check_cancelled()?;
        if s.tree.node(subtree).state == NodeState::Remove {
            continue;
        }
        // Hoist first: the slot's occupant may change, and the level is
        // collected from whatever ends up there.
        if s.config.hoist && s.tree.node(subtree).kind.is_rule() {
            let (occupant, hoisted) = hoist::hoist_node(s, subtree);
            s.stats.hoisted_nodes += hoisted;
            subtree = occupant;
        }

        let level = direct_reducible_descendants(&s.tree, subtree, s.config.reduce_hidden);
        prune_level(s, &level);

        // Descend into the survivors, leftmost subtree first.
        for &id in level.iter().rev() {
            if s.tree.node(id).state != NodeState::Remove {
                stack.push(id);
            }
        }
    }
    Ok(())
}

/// Submit one level to the set minimizer and commit its kept set.
fn prune_level<O: Oracle>(s: &mut ReduceSession<O>, level: &[NodeId]) {
    if level.is_empty() || !s.config.prune {
        return;
    }
    s.stats.levels += 1;
    let kept = ddmin(level, |kept| try_level(s, level, kept));
    if kept.len() == level.len() {
        return;
    }
    let keep: HashSet<NodeId> = kept.iter().copied().collect();
    for &id in level {
        if !keep.contains(&id) {
            s.tree.node_mut(id).state = NodeState::Remove;
        }
    }
    s.stats.pruned_nodes += (level.len() - kept.len()) as u64;
    debug!(
        level_size = level.len(),
        removed = level.len() - kept.len(),
        "pruned level"
    );
}

/// Candidate evaluation: apply a kept subset, render, judge, restore.
/// Level nodes all start as `Keep`, so restoring is uniform.
fn try_level<O: Oracle>(s: &mut ReduceSession<O>, level: &[NodeId], kept: &[NodeId]) -> bool {
    let keep: HashSet<NodeId> = kept.iter().copied().collect();
    for &id in level {
        s.tree.node_mut(id).state = if keep.contains(&id) {
            NodeState::Keep
        } else {
            NodeState::Remove
        };
    }
    let interesting = s.probe();
    for &id in level {
        s.tree.node_mut(id).state = NodeState::Keep;
    }
    interesting
}

/// Point-minimality sweep: try removing every remaining reducible node
/// on its own. Skips candidates whose removal cannot change the output.
pub(crate) fn sweep<O: Oracle>(s: &mut ReduceSession<O>) -> Result<(), ReduceError> {
    let Some(root) = s.tree.try_root() else {
        return Ok(());
    };
    let candidates: Vec<NodeId> = s
        .tree
        .preorder(root)
        .filter(|&id| reducible(&s.tree, id, s.config.reduce_hidden))
        .collect();

    let baseline = s.render();
    for id in candidates {
        s.check_cancelled()?;
        if s.tree.node(id).state != NodeState::Keep || s.tree.in_removed_subtree(id) {
            continue;
        }
        s.tree.node_mut(id).state = NodeState::Remove;
        let candidate = s.render();
        if candidate != baseline && s.probe_text(&candidate) {
            s.stats.swept_nodes += 1;
        } else {
            s.tree.node_mut(id).state = NodeState::Keep;
        }
    }
    Ok(())
}

/// Whether the minimizer may toggle this node.
fn reducible(tree: &Tree, id: NodeId, reduce_hidden: bool) -> bool {
    let node = tree.node(id);
    if node.state != NodeState::Keep || !tree.is_removable(id) {
        return false;
    }
    match node.kind {
        NodeKind::Rule { .. } | NodeKind::Quantifier | NodeKind::Token { .. } => true,
        NodeKind::Hidden { .. } => reduce_hidden,
        NodeKind::Error { .. } => false,
    }
}

/// All live nodes at exactly `depth` below the root, in document order,
/// plus whether the depth exists at all. Removed subtrees are not
/// entered.
fn collect_depth(tree: &Tree, depth: usize) -> (Vec<NodeId>, bool) {
    let mut nodes = Vec::new();
    let Some(root) = tree.try_root() else {
        return (nodes, false);
    };
    let mut stack = vec![(root, 0usize)];
    while let Some((id, d)) = stack.pop() {
        if tree.node(id).state == NodeState::Remove {
            continue;
        }
        if d == depth {
            nodes.push(id);
            continue;
        }
        for &child in tree.children(id).iter().rev() {
            stack.push((child, d + 1));
        }
    }
    // Pre-order ids at one depth sort into document order.
    nodes.sort_unstable();
    let any = !nodes.is_empty();
    (nodes, any)
}

/// Nearest reducible descendants of `subtree`: descend through
/// non-reducible nodes, stop at each reducible one.
fn direct_reducible_descendants(tree: &Tree, subtree: NodeId, reduce_hidden: bool) -> Vec<NodeId> {
    let mut level = Vec::new();
    let mut stack: Vec<NodeId> = tree.children(subtree).iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        if tree.node(id).state == NodeState::Remove {
            continue;
        }
        if reducible(tree, id, reduce_hidden) {
            level.push(id);
            continue;
        }
        for &child in tree.children(id).iter().rev() {
            stack.push(child);
        }
    }
    level
}
