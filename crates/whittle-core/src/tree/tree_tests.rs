use super::*;

fn rule(name: &str) -> Node {
    Node::new(NodeKind::Rule {
        name: name.to_owned(),
    })
}

fn token(name: &str, text: &str) -> Node {
    Node::new(NodeKind::Token {
        name: name.to_owned(),
        text: text.to_owned(),
    })
}

#[test]
fn push_assigns_sequential_ids() {
    let mut tree = Tree::new();
    let a = tree.push(rule("a"));
    let b = tree.push(rule("b"));
    assert_eq!(a.as_u32(), 0);
    assert_eq!(b.as_u32(), 1);
    assert_eq!(tree.len(), 2);
}

#[test]
fn attach_links_both_directions() {
    let mut tree = Tree::new();
    let parent = tree.push(rule("doc"));
    let child = tree.push(token("X", "x"));
    tree.set_root(parent);
    tree.attach(parent, child);

    assert_eq!(tree.children(parent), &[child]);
    assert_eq!(tree.node(child).parent, Some(parent));
}

#[test]
fn replace_swaps_parent_slot() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let old = tree.push(rule("old"));
    let new = tree.push(rule("new"));
    tree.set_root(root);
    tree.attach(root, old);

    tree.replace(old, new);

    assert_eq!(tree.children(root), &[new]);
    assert_eq!(tree.node(new).parent, Some(root));
    assert_eq!(tree.node(old).parent, None);
}

#[test]
fn replace_at_root_moves_root() {
    let mut tree = Tree::new();
    let root = tree.push(rule("outer"));
    let inner = tree.push(rule("inner"));
    tree.set_root(root);
    tree.attach(root, inner);

    tree.replace(root, inner);
    assert_eq!(tree.root(), inner);
    assert_eq!(tree.node(inner).parent, None);
}

#[test]
fn preorder_visits_parent_before_children() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let a = tree.push(rule("a"));
    let b = tree.push(rule("b"));
    let a1 = tree.push(token("X", "x"));
    tree.set_root(root);
    tree.attach(root, a);
    tree.attach(a, a1);
    tree.attach(root, b);

    let order: Vec<_> = tree.preorder(root).collect();
    assert_eq!(order, vec![root, a, a1, b]);
}

#[test]
fn depth_counts_parent_links() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let mid = tree.push(rule("mid"));
    let leaf = tree.push(token("X", "x"));
    tree.set_root(root);
    tree.attach(root, mid);
    tree.attach(mid, leaf);

    assert_eq!(tree.depth(root), 0);
    assert_eq!(tree.depth(mid), 1);
    assert_eq!(tree.depth(leaf), 2);
}

#[test]
fn removability_follows_replacement_and_slot() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let quant = tree.push(Node::new(NodeKind::Quantifier));
    let in_quant = tree.push(token("X", "x").with_replacement("x"));
    let mandatory = tree.push(token("Y", "y").with_replacement("y"));
    let empty_rep = tree.push(rule("opt"));
    tree.set_root(root);
    tree.attach(root, quant);
    tree.attach(quant, in_quant);
    tree.attach(root, mandatory);
    tree.attach(root, empty_rep);

    // Root is never removable.
    assert!(!tree.is_removable(root));
    // Quantifier slots admit deletion even with a non-empty replacement.
    assert!(tree.is_removable(in_quant));
    // Mandatory slot with non-empty replacement does not.
    assert!(!tree.is_removable(mandatory));
    // Empty replacement is always removable.
    assert!(tree.is_removable(empty_rep));
}

#[test]
fn error_fragments_are_never_removable() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let quant = tree.push(Node::new(NodeKind::Quantifier));
    let error = tree.push(Node::new(NodeKind::Error {
        text: "garbage".to_owned(),
    }));
    tree.set_root(root);
    tree.attach(root, quant);
    tree.attach(quant, error);

    assert!(!tree.is_removable(error));
}

#[test]
fn in_removed_subtree_walks_ancestors() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let mid = tree.push(rule("mid"));
    let leaf = tree.push(token("X", "x"));
    tree.set_root(root);
    tree.attach(root, mid);
    tree.attach(mid, leaf);

    assert!(!tree.in_removed_subtree(leaf));
    tree.node_mut(mid).state = NodeState::Remove;
    assert!(tree.in_removed_subtree(leaf));
    assert!(tree.in_removed_subtree(mid));
    assert!(!tree.in_removed_subtree(root));
}

#[test]
fn verify_accepts_well_formed_tree() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let leaf = tree.push(token("X", "x"));
    tree.set_root(root);
    tree.attach(root, leaf);
    assert!(verify(&tree).is_ok());
}

#[test]
fn verify_rejects_parent_mismatch() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let leaf = tree.push(token("X", "x"));
    tree.set_root(root);
    tree.node_mut(root).children.push(leaf); // no back-pointer

    assert!(matches!(
        verify(&tree),
        Err(InvariantViolation::ParentMismatch { .. })
    ));
}

#[test]
fn verify_rejects_non_rule_root() {
    let mut tree = Tree::new();
    let root = tree.push(token("X", "x"));
    tree.set_root(root);
    assert!(matches!(
        verify(&tree),
        Err(InvariantViolation::RootNotRule(_))
    ));
}

#[test]
fn verify_ignores_detached_slots() {
    let mut tree = Tree::new();
    let root = tree.push(rule("doc"));
    let detached = tree.push(rule("gone"));
    tree.set_root(root);
    // `detached` has inconsistent links but is unreachable.
    tree.node_mut(detached).children.push(root);
    assert!(verify(&tree).is_ok());
}
