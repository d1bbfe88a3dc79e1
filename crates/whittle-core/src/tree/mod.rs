//! Id-indexed syntax-tree arena.
//!
//! Nodes live in a flat `Vec`; a [`NodeId`] is the slot index. Ids are
//! assigned once at build time and are never reassigned, so they stay valid
//! across structural rewrites. Rewrites detach nodes instead of freeing
//! them; only nodes reachable from the root are part of the tree proper.
//!
//! Parents are non-owning back-references (an id, not a box); ownership
//! flows strictly root → leaves through `children`.

mod unparse;
mod verify;

#[cfg(test)]
mod tree_tests;

pub use unparse::{UnparseOptions, unparse, unparse_node, unparse_with};
pub use verify::{InvariantViolation, verify};

/// A lightweight handle to a node in a [`Tree`] arena.
///
/// Comparing two ids is O(1). Ids are ordered by creation order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw index for serialization/debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a NodeId from a raw index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Reduction state of a node.
///
/// `Remove` means "render as the cached replacement string"; the node is
/// not physically deleted. `Hidden` nodes render as kept but are invisible
/// to the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Keep,
    Remove,
    Hidden,
}

/// Source position: 1-indexed line, 0-indexed column.
///
/// Positions are advisory; the unparser never reads them and structural
/// rewrites do not recompute them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Node variants. Dispatch is by tag; there is no node-kind hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Internal node for a grammar-rule instance.
    Rule { name: String },
    /// Anonymous internal node grouping a contiguous span of children that
    /// are jointly optional (an instance of a `?`/`*` block or one unrolled
    /// recursion step).
    Quantifier,
    /// Terminal carrying literal source text.
    Token { name: String, text: String },
    /// Hidden-channel terminal (whitespace, comments). Unparse-visible,
    /// reducer-invisible by default.
    Hidden { name: String, text: String },
    /// Parse-error fragment. Preserved verbatim, never reducible.
    Error { text: String },
}

impl NodeKind {
    /// Rule or token name, if the variant has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            NodeKind::Rule { name }
            | NodeKind::Token { name, .. }
            | NodeKind::Hidden { name, .. } => Some(name),
            NodeKind::Quantifier | NodeKind::Error { .. } => None,
        }
    }

    /// Literal text, for terminal variants.
    pub fn text(&self) -> Option<&str> {
        match self {
            NodeKind::Token { text, .. }
            | NodeKind::Hidden { text, .. }
            | NodeKind::Error { text } => Some(text),
            NodeKind::Rule { .. } | NodeKind::Quantifier => None,
        }
    }

    /// Terminals carry text and never have children.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeKind::Token { .. } | NodeKind::Hidden { .. } | NodeKind::Error { .. }
        )
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, NodeKind::Rule { .. })
    }

    pub fn is_quantifier(&self) -> bool {
        matches!(self, NodeKind::Quantifier)
    }
}

/// A single node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub state: NodeState,
    /// Minimal text that validly substitutes for this subtree in place.
    pub replacement: String,
    pub start: Position,
    pub end: Position,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            state: NodeState::Keep,
            replacement: String::new(),
            start: Position::default(),
            end: Position::default(),
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = replacement.into();
        self
    }

    pub fn with_span(mut self, start: Position, end: Position) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

/// The syntax-tree arena.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node to the arena, returning its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Number of arena slots, including detached nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop all nodes from `len` onward. Used by the builder to roll back
    /// a failed parse attempt; never call once ids have escaped.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// The root node id.
    ///
    /// # Panics
    /// Panics if no root has been set; [`verify`] reports the same
    /// condition as a recoverable error.
    pub fn root(&self) -> NodeId {
        self.root.expect("tree has no root")
    }

    pub fn try_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
        self.nodes[id.index()].parent = None;
    }

    /// Attach `child` as the last child of `parent`.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
        self.nodes[child.index()].parent = Some(parent);
    }

    /// Replace `old` with `new` in `old`'s parent slot (or at the root).
    /// `old` is left detached; its subtree keeps its ids.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        match self.nodes[old.index()].parent {
            Some(parent) => {
                let slot = self.nodes[parent.index()]
                    .children
                    .iter()
                    .position(|&c| c == old)
                    .expect("parent does not list child");
                self.nodes[parent.index()].children[slot] = new;
                self.nodes[new.index()].parent = Some(parent);
            }
            None => {
                debug_assert_eq!(self.root, Some(old));
                self.set_root(new);
            }
        }
        self.nodes[old.index()].parent = None;
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Pre-order traversal of the subtree rooted at `id`.
    pub fn preorder(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Depth of `id` below the root (root is 0). Walks parent links.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = id;
        while let Some(parent) = self.nodes[cur.index()].parent {
            depth += 1;
            cur = parent;
        }
        depth
    }

    /// Whether this node or any ancestor is in `Remove` state.
    pub fn in_removed_subtree(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            if self.nodes[c.index()].state == NodeState::Remove {
                return true;
            }
            cur = self.nodes[c.index()].parent;
        }
        false
    }

    /// Whether `id` may be toggled to `Remove` without leaving its parent
    /// grammar-invalid: its replacement is empty, or it fills a slot of a
    /// quantified group (jointly-optional position). The root and error
    /// fragments are never removable.
    pub fn is_removable(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.index()];
        if matches!(node.kind, NodeKind::Error { .. }) {
            return false;
        }
        let Some(parent) = node.parent else {
            return false;
        };
        node.replacement.is_empty() || self.nodes[parent.index()].kind.is_quantifier()
    }
}

/// Pre-order iterator over a subtree.
pub struct Preorder<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.tree.children(id);
        self.stack.extend(children.iter().rev());
        Some(id)
    }
}
