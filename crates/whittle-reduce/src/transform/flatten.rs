//! Recursion flattening.
//!
//! A spine of same-name rule nodes in first- or last-child position,
//! the shape a recursive descent leaves behind for a directly recursive
//! rule, collapses into one wide node. Each unrolled step's remaining
//! children move under a fresh quantifier group (one recursion step is
//! jointly optional), the innermost base's children stay direct.
//! Unparse order is untouched; level enumeration then sees one wide
//! level instead of a tall spine.

use tracing::debug;

use whittle_core::tree::{Node, NodeId, NodeKind, Tree};

pub fn flatten_recursion(tree: &mut Tree) {
    let Some(root) = tree.try_root() else { return };
    let candidates: Vec<NodeId> = tree.preorder(root).collect();
    let mut flattened = 0usize;
    for id in candidates {
        // Spine nodes consumed by an earlier flatten are detached.
        if tree.node(id).parent.is_none() && id != tree.root() {
            continue;
        }
        flattened += usize::from(try_flatten(tree, id));
    }
    if flattened > 0 {
        debug!(nodes = flattened, "flattened recursive spines");
    }
}

fn try_flatten(tree: &mut Tree, id: NodeId) -> bool {
    let NodeKind::Rule { name } = &tree.node(id).kind else {
        return false;
    };
    let name = name.clone();

    // Direction from the shape: a same-name rule node can only sit in
    // first (left recursion) or last (right recursion) child position.
    if spine_child(tree, id, &name, Direction::Right).is_some() {
        flatten_spine(tree, id, &name, Direction::Right);
        true
    } else if spine_child(tree, id, &name, Direction::Left).is_some() {
        flatten_spine(tree, id, &name, Direction::Left);
        true
    } else {
        false
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

fn spine_child(tree: &Tree, id: NodeId, name: &str, direction: Direction) -> Option<NodeId> {
    let children = tree.children(id);
    let candidate = match direction {
        Direction::Left => *children.first()?,
        Direction::Right => *children.last()?,
    };
    matches!(&tree.node(candidate).kind, NodeKind::Rule { name: n } if n == name)
        .then_some(candidate)
}

/// Rebuild `id`'s children from the whole spine below it. For right
/// recursion the per-step prefixes come first and the innermost base
/// ends the list; left recursion is the mirror image.
fn flatten_spine(tree: &mut Tree, id: NodeId, name: &str, direction: Direction) {
    // Collect the spine top-down, then each step's non-spine children.
    let mut spine = vec![id];
    while let Some(next) = spine_child(tree, *spine.last().expect("nonempty"), name, direction) {
        spine.push(next);
    }

    let mut steps: Vec<Vec<NodeId>> = Vec::with_capacity(spine.len());
    for (i, &node) in spine.iter().enumerate() {
        let mut children = std::mem::take(&mut tree.node_mut(node).children);
        if i + 1 < spine.len() {
            // Drop the spine link itself.
            match direction {
                Direction::Left => {
                    children.remove(0);
                }
                Direction::Right => {
                    children.pop();
                }
            }
        }
        steps.push(children);
    }

    let mut flat: Vec<NodeId> = Vec::new();
    let base = steps.pop().expect("spine has a base");
    match direction {
        Direction::Right => {
            for step in steps {
                push_step(tree, &mut flat, id, step);
            }
            flat.extend(base);
        }
        Direction::Left => {
            flat.extend(base);
            for step in steps.into_iter().rev() {
                push_step(tree, &mut flat, id, step);
            }
        }
    }

    for &child in &flat {
        tree.node_mut(child).parent = Some(id);
    }
    tree.node_mut(id).children = flat;
    for &stale in &spine[1..] {
        tree.node_mut(stale).parent = None;
    }
}

/// One unrolled step becomes a quantifier group; empty steps vanish.
fn push_step(tree: &mut Tree, flat: &mut Vec<NodeId>, parent: NodeId, step: Vec<NodeId>) {
    if step.is_empty() {
        return;
    }
    // A step that is already a lone quantifier group keeps its node.
    if step.len() == 1 && tree.node(step[0]).kind.is_quantifier() {
        flat.push(step[0]);
        return;
    }
    let group = tree.push(Node::new(NodeKind::Quantifier));
    tree.node_mut(group).parent = Some(parent);
    for &child in &step {
        tree.node_mut(child).parent = Some(group);
    }
    tree.node_mut(group).children = step;
    flat.push(group);
}
