//! Rendering a (possibly decorated) tree back to text.
//!
//! The unparser is a pure function of tree shape and node states; source
//! positions are never consulted, so it stays reproducible after
//! structural rewrites.

use super::{NodeId, NodeKind, NodeState, Tree};

/// Options controlling hidden-channel rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnparseOptions {
    /// Emit every hidden-channel token. When false (default), a hidden
    /// token is emitted only between two kept emissions.
    pub keep_hidden: bool,
}

/// Render the whole tree with default options.
pub fn unparse(tree: &Tree) -> String {
    unparse_with(tree, UnparseOptions::default())
}

/// Render the whole tree.
pub fn unparse_with(tree: &Tree, opts: UnparseOptions) -> String {
    match tree.try_root() {
        Some(root) => unparse_node_with(tree, root, opts),
        None => String::new(),
    }
}

/// Render a single subtree with default options.
pub fn unparse_node(tree: &Tree, id: NodeId) -> String {
    unparse_node_with(tree, id, UnparseOptions::default())
}

fn unparse_node_with(tree: &Tree, id: NodeId, opts: UnparseOptions) -> String {
    let mut r = Renderer {
        opts,
        out: String::new(),
        pending_hidden: Vec::new(),
        emitted: false,
    };
    r.render(tree, id);
    r.out
}

struct Renderer<'t> {
    opts: UnparseOptions,
    out: String,
    /// Hidden texts seen since the last kept emission.
    pending_hidden: Vec<&'t str>,
    emitted: bool,
}

impl<'t> Renderer<'t> {
    fn render(&mut self, tree: &'t Tree, id: NodeId) {
        let node = tree.node(id);
        if node.state == NodeState::Remove {
            // A removed subtree stands in as its minimal replacement.
            self.emit(&node.replacement);
            return;
        }
        match &node.kind {
            NodeKind::Token { text, .. } | NodeKind::Error { text } => self.emit(text),
            NodeKind::Hidden { text, .. } => {
                if self.opts.keep_hidden {
                    self.emit(text);
                } else {
                    self.pending_hidden.push(text);
                }
            }
            NodeKind::Rule { .. } | NodeKind::Quantifier => {
                for &child in &node.children {
                    self.render(tree, child);
                }
            }
        }
    }

    fn emit(&mut self, text: &'t str) {
        if text.is_empty() {
            return;
        }
        if self.emitted {
            for hidden in self.pending_hidden.drain(..) {
                self.out.push_str(hidden);
            }
        } else {
            // Hidden tokens before the first kept emission are dropped.
            self.pending_hidden.clear();
        }
        self.out.push_str(text);
        self.emitted = true;
    }
}
