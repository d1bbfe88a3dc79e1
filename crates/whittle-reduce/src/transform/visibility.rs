//! Reducer-visibility filters.
//!
//! Both passes move nodes to the `Hidden` state: still rendered, never
//! offered to the minimizer. `hide_unremovable` is structural and runs
//! once; `coarse_filter` is textual and re-runs before every pass, since
//! subtree renderings shrink as reduction proceeds.

use tracing::debug;

use whittle_core::tree::{NodeState, Tree, unparse_node};

/// Hide nodes whose slot cannot be vacated: replacement is non-empty and
/// the parent position is mandatory. Removing such a node could never
/// shrink the output below its replacement, and dropping it outright
/// would break the grammar.
pub fn hide_unremovable(tree: &mut Tree) {
    let Some(root) = tree.try_root() else { return };
    let ids: Vec<_> = tree.preorder(root).collect();
    let mut hidden = 0usize;
    for id in ids {
        if id == root {
            continue;
        }
        if tree.node(id).state == NodeState::Keep && !tree.is_removable(id) {
            tree.node_mut(id).state = NodeState::Hidden;
            hidden += 1;
        }
    }
    if hidden > 0 {
        debug!(nodes = hidden, "hid unremovable nodes");
    }
}

/// Hide removable nodes whose current rendering already equals their
/// replacement: removing them cannot change the output.
pub fn coarse_filter(tree: &mut Tree) {
    let Some(root) = tree.try_root() else { return };
    let ids: Vec<_> = tree.preorder(root).collect();
    let mut hidden = 0usize;
    for id in ids {
        let node = tree.node(id);
        if node.state != NodeState::Keep || !tree.is_removable(id) {
            continue;
        }
        if unparse_node(tree, id) == node.replacement {
            tree.node_mut(id).state = NodeState::Hidden;
            hidden += 1;
        }
    }
    if hidden > 0 {
        debug!(nodes = hidden, "coarse filter hid gainless nodes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whittle_core::tree::{Node, NodeId, NodeKind};

    fn rule(tree: &mut Tree, name: &str, replacement: &str) -> NodeId {
        tree.push(
            Node::new(NodeKind::Rule {
                name: name.to_owned(),
            })
            .with_replacement(replacement),
        )
    }

    fn token(tree: &mut Tree, text: &str, replacement: &str) -> NodeId {
        tree.push(
            Node::new(NodeKind::Token {
                name: "T".to_owned(),
                text: text.to_owned(),
            })
            .with_replacement(replacement),
        )
    }

    #[test]
    fn mandatory_nonempty_replacement_is_hidden() {
        let mut tree = Tree::new();
        let root = rule(&mut tree, "doc", "x");
        tree.set_root(root);
        let bracket = token(&mut tree, "[", "[");
        tree.attach(root, bracket);
        let optional = rule(&mut tree, "opt", "");
        tree.attach(root, optional);

        hide_unremovable(&mut tree);

        assert_eq!(tree.node(bracket).state, NodeState::Hidden);
        assert_eq!(tree.node(optional).state, NodeState::Keep);
        // The root is exempt.
        assert_eq!(tree.node(root).state, NodeState::Keep);
    }

    #[test]
    fn quantifier_slots_stay_visible() {
        let mut tree = Tree::new();
        let root = rule(&mut tree, "doc", "");
        tree.set_root(root);
        let group = tree.push(Node::new(NodeKind::Quantifier));
        tree.attach(root, group);
        let inner = token(&mut tree, "x", "x");
        tree.attach(group, inner);

        hide_unremovable(&mut tree);

        assert_eq!(tree.node(group).state, NodeState::Keep);
        assert_eq!(tree.node(inner).state, NodeState::Keep);
    }

    #[test]
    fn hide_unremovable_is_idempotent() {
        let mut tree = Tree::new();
        let root = rule(&mut tree, "doc", "x");
        tree.set_root(root);
        let bracket = token(&mut tree, "[", "[");
        tree.attach(root, bracket);

        hide_unremovable(&mut tree);
        hide_unremovable(&mut tree);
        assert_eq!(tree.node(bracket).state, NodeState::Hidden);
    }

    #[test]
    fn coarse_filter_hides_gainless_nodes() {
        let mut tree = Tree::new();
        let root = rule(&mut tree, "doc", "");
        tree.set_root(root);
        let group = tree.push(Node::new(NodeKind::Quantifier));
        tree.attach(root, group);
        // Renders "x", replacement "x": no gain.
        let same = token(&mut tree, "x", "x");
        tree.attach(group, same);
        // Renders "long", replacement "x": worth trying.
        let shrinkable = token(&mut tree, "long", "x");
        tree.attach(group, shrinkable);

        coarse_filter(&mut tree);

        assert_eq!(tree.node(same).state, NodeState::Hidden);
        assert_eq!(tree.node(shrinkable).state, NodeState::Keep);
        // The group renders "xlong" != "": still visible.
        assert_eq!(tree.node(group).state, NodeState::Keep);
    }

    #[test]
    fn coarse_filter_hides_empty_groups() {
        let mut tree = Tree::new();
        let root = rule(&mut tree, "doc", "");
        tree.set_root(root);
        let group = tree.push(Node::new(NodeKind::Quantifier));
        tree.attach(root, group);
        let removed = token(&mut tree, "x", "");
        tree.attach(group, removed);
        tree.node_mut(removed).state = NodeState::Remove;

        coarse_filter(&mut tree);
        // Renders "" == replacement "": nothing to gain.
        assert_eq!(tree.node(group).state, NodeState::Hidden);
    }
}
