//! Squeeze: collapse unary rule chains.
//!
//! A chain of rule nodes with exactly one child each is structurally
//! indistinguishable for level-wise reduction and would cost one probe
//! round per link. The innermost rule of the chain takes the outermost
//! slot; the outer names are lost for reduction purposes, unparse is
//! unchanged.

use tracing::debug;

use whittle_core::tree::{NodeId, Tree};

pub fn squeeze(tree: &mut Tree) {
    let Some(root) = tree.try_root() else { return };
    let candidates: Vec<NodeId> = tree.preorder(root).collect();
    let mut collapsed = 0usize;
    for id in candidates {
        if tree.node(id).parent.is_none() && id != tree.root() {
            continue; // consumed by an earlier collapse
        }
        let chain = unary_chain_below(tree, id);
        let Some(&innermost) = chain.last() else {
            continue;
        };
        tree.replace(id, innermost);
        // Fully detach the absorbed links so later iterations skip them.
        tree.node_mut(id).children.clear();
        for &link in &chain[..chain.len() - 1] {
            let node = tree.node_mut(link);
            node.parent = None;
            node.children.clear();
        }
        collapsed += 1;
    }
    if collapsed > 0 {
        debug!(chains = collapsed, "squeezed unary rule chains");
    }
}

/// Rule nodes strictly below `id` along a single-child rule chain,
/// outermost first. Empty when `id` heads no chain.
fn unary_chain_below(tree: &Tree, id: NodeId) -> Vec<NodeId> {
    let mut chain = Vec::new();
    let mut current = id;
    loop {
        if !tree.node(current).kind.is_rule() {
            break;
        }
        let &[only_child] = tree.children(current) else {
            break;
        };
        if !tree.node(only_child).kind.is_rule() {
            break;
        }
        chain.push(only_child);
        current = only_child;
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use whittle_core::tree::{Node, NodeKind, unparse, verify};

    fn rule(tree: &mut Tree, name: &str) -> NodeId {
        tree.push(Node::new(NodeKind::Rule {
            name: name.to_owned(),
        }))
    }

    fn token(tree: &mut Tree, text: &str) -> NodeId {
        tree.push(Node::new(NodeKind::Token {
            name: "T".to_owned(),
            text: text.to_owned(),
        }))
    }

    /// doc(expr(term(factor(x y))))
    fn unary_chain() -> (Tree, NodeId, NodeId) {
        let mut tree = Tree::new();
        let doc = rule(&mut tree, "doc");
        tree.set_root(doc);
        let expr = rule(&mut tree, "expr");
        tree.attach(doc, expr);
        let term = rule(&mut tree, "term");
        tree.attach(expr, term);
        let factor = rule(&mut tree, "factor");
        tree.attach(term, factor);
        let x = token(&mut tree, "x");
        tree.attach(factor, x);
        let y = token(&mut tree, "y");
        tree.attach(factor, y);
        (tree, doc, factor)
    }

    #[test]
    fn chain_collapses_to_innermost_rule() {
        let (mut tree, doc, factor) = unary_chain();
        squeeze(&mut tree);

        // doc headed the chain doc->expr->term->factor; factor survives.
        assert_eq!(tree.root(), factor);
        assert_eq!(unparse(&tree), "xy");
        assert!(tree.node(doc).children.is_empty());
        assert!(verify(&tree).is_ok());
    }

    #[test]
    fn surviving_node_keeps_its_id_and_name() {
        let (mut tree, _, factor) = unary_chain();
        squeeze(&mut tree);
        assert_eq!(tree.root(), factor);
        assert_eq!(tree.node(factor).kind.name(), Some("factor"));
    }

    #[test]
    fn squeeze_is_idempotent() {
        let (mut tree, _, _) = unary_chain();
        squeeze(&mut tree);
        let shape = unparse(&tree);
        let root = tree.root();
        squeeze(&mut tree);
        assert_eq!(tree.root(), root);
        assert_eq!(unparse(&tree), shape);
    }

    #[test]
    fn branching_nodes_are_untouched() {
        let mut tree = Tree::new();
        let doc = rule(&mut tree, "doc");
        tree.set_root(doc);
        let a = rule(&mut tree, "a");
        tree.attach(doc, a);
        let b = rule(&mut tree, "b");
        tree.attach(doc, b);
        let ta = token(&mut tree, "1");
        tree.attach(a, ta);
        let tb = token(&mut tree, "2");
        tree.attach(b, tb);

        squeeze(&mut tree);
        assert_eq!(tree.root(), doc);
        assert_eq!(tree.children(doc).len(), 2);
    }

    #[test]
    fn rule_over_terminal_is_untouched() {
        let mut tree = Tree::new();
        let doc = rule(&mut tree, "doc");
        tree.set_root(doc);
        let t = token(&mut tree, "x");
        tree.attach(doc, t);
        squeeze(&mut tree);
        assert_eq!(tree.root(), doc);
    }

    #[test]
    fn quantifier_link_breaks_the_chain() {
        let mut tree = Tree::new();
        let doc = rule(&mut tree, "doc");
        tree.set_root(doc);
        let q = tree.push(Node::new(NodeKind::Quantifier));
        tree.attach(doc, q);
        let inner = rule(&mut tree, "inner");
        tree.attach(q, inner);
        let t = token(&mut tree, "x");
        tree.attach(inner, t);

        squeeze(&mut tree);
        assert_eq!(tree.root(), doc);
        assert!(tree.node(tree.children(doc)[0]).kind.is_quantifier());
    }
}
