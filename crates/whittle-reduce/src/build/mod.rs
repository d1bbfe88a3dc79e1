//! Tree builder: interprets a bundle grammar over an input.
//!
//! A backtracking ordered-choice interpreter over the token stream. Each
//! matched `?`/`*`/`+` instance is wrapped in its own quantifier node so
//! the reducer can delete iterations independently; left-recursive rules
//! are unrolled iteratively into the same flat shape. Hidden-channel
//! tokens are attached in source order before the token that follows
//! them. Ids come out in pre-order; rolled-back attempts leave no gaps.
//!
//! Island patterns are applied after the parse: matched capture groups of
//! a token's text are reparsed with their target grammar and spliced in
//! place of the token.

mod lexer;


use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use whittle_core::grammar::{
    Alt, Atom, GrammarError, Quant, Recursion, RuleDef, Term, TokenPattern, literal_token_name,
};
use whittle_core::tree::{Node, NodeId, NodeKind, Position, Tree, verify};

use crate::bundle::{Bundle, GrammarSet, IslandRule};
use lexer::{CompiledLexer, Lexeme, advance};

/// Nested-rule depth bound; mutually recursive rules that never consume
/// fail the branch instead of overflowing the stack.
const RECURSION_LIMIT: usize = 2048;

/// Errors raised while loading a bundle or building the initial tree.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("input cannot be parsed (no match at {line}:{column})")]
    ParseFailed { line: u32, column: u32 },

    #[error("unknown grammar `{0}`")]
    UnknownGrammar(String),

    #[error("unknown start rule `{0}`")]
    UnknownStart(String),

    #[error("start rule `{0}` is defined by more than one grammar")]
    AmbiguousStart(String),

    #[error("invalid pattern for token `{token}`: {message}")]
    TokenPattern { token: String, message: String },

    #[error("invalid island pattern for token `{token}`: {message}")]
    IslandPattern { token: String, message: String },

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("cannot read `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid bundle descriptor: {0}")]
    Descriptor(serde_json::Error),
}

/// Non-fatal problem encountered while building (recovered parse).
#[derive(Debug, Clone)]
pub struct BuildIssue {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl fmt::Display for BuildIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// A built tree plus any recovery issues worth surfacing.
#[derive(Debug)]
pub struct BuildOutput {
    pub tree: Tree,
    pub issues: Vec<BuildIssue>,
}

/// Parse `input` according to `start` (`rule` or `grammar:rule`).
///
/// Fails with [`BuildError::ParseFailed`] when nothing parses at all;
/// an unconsumed tail is kept verbatim as a trailing error node and
/// reported as an issue instead.
pub fn build_tree(bundle: &Bundle, start: &str, input: &str) -> Result<BuildOutput, BuildError> {
    let (name, set, rule) = bundle.resolve_start(start)?;
    debug!(grammar = name, rule, bytes = input.len(), "building tree");

    let mut tree = Tree::new();
    let mut issues = Vec::new();
    let root = parse_with_grammar(&mut tree, bundle, set, rule, input, &mut issues)?;
    tree.set_root(root);
    debug_assert!(verify(&tree).is_ok(), "builder produced malformed tree");
    Ok(BuildOutput { tree, issues })
}

/// Parse one input with one grammar, pushing into the shared arena.
/// Also used for island reparses.
fn parse_with_grammar(
    tree: &mut Tree,
    bundle: &Bundle,
    set: &GrammarSet,
    rule: &str,
    input: &str,
    issues: &mut Vec<BuildIssue>,
) -> Result<NodeId, BuildError> {
    let compiled = CompiledLexer::compile(&set.grammar, &set.replacements)?;
    let (lexemes, stuck) = compiled.lex(input);

    let mut parser = Parser {
        set,
        lexemes: &lexemes,
        pos: 0,
        max_pos: 0,
        depth: 0,
        token_nodes: Vec::new(),
    };
    let Some(root) = parser.parse_rule(tree, rule, None) else {
        let (line, column) = match lexemes.get(parser.max_pos) {
            Some(lex) => (lex.start.line, lex.start.column),
            None => {
                let end = advance(Position::new(1, 0), input);
                (end.line, end.column)
            }
        };
        return Err(BuildError::ParseFailed { line, column });
    };

    attach_leftovers(tree, root, &parser, input, stuck, issues);
    let token_nodes = parser.token_nodes;
    expand_islands(tree, bundle, set, token_nodes, issues)?;
    Ok(root)
}

/// Trailing hidden tokens become hidden children of the root; anything
/// else left over is preserved verbatim as an error node.
fn attach_leftovers(
    tree: &mut Tree,
    root: NodeId,
    parser: &Parser<'_>,
    input: &str,
    stuck: Option<usize>,
    issues: &mut Vec<BuildIssue>,
) {
    let lexemes = parser.lexemes;
    let mut cut = None;
    if parser.pos < lexemes.len() {
        if stuck.is_none() && lexemes[parser.pos..].iter().all(|l| l.hidden) {
            for lex in &lexemes[parser.pos..] {
                let node = tree.push(
                    Node::new(NodeKind::Hidden {
                        name: lex.name.clone(),
                        text: lex.text.clone(),
                    })
                    .with_span(lex.start, lex.end),
                );
                tree.attach(root, node);
            }
        } else {
            cut = Some(lexemes[parser.pos].byte_start);
        }
    } else if let Some(offset) = stuck {
        cut = Some(offset);
    }

    let Some(cut) = cut else { return };
    let text = &input[cut..];
    if text.is_empty() {
        return;
    }
    let start = advance(Position::new(1, 0), &input[..cut]);
    let end = advance(start, text);
    let node = tree.push(
        Node::new(NodeKind::Error {
            text: text.to_owned(),
        })
        .with_span(start, end),
    );
    tree.attach(root, node);
    issues.push(BuildIssue {
        line: start.line,
        column: start.column,
        message: format!("unparsed input kept verbatim ({} bytes)", text.len()),
    });
}

struct Parser<'p> {
    set: &'p GrammarSet,
    lexemes: &'p [Lexeme],
    /// Index of the first unattached lexeme (hidden included).
    pos: usize,
    /// High-water mark for error reporting.
    max_pos: usize,
    depth: usize,
    /// Default-channel token nodes created by this parse, for islands.
    token_nodes: Vec<NodeId>,
}

/// Rollback point for ordered-choice backtracking. Nodes created after
/// `arena` are dropped wholesale, which keeps surviving ids gap-free and
/// in pre-order.
#[derive(Clone, Copy)]
struct Checkpoint {
    pos: usize,
    arena: usize,
    children: usize,
    tokens: usize,
}

impl<'p> Parser<'p> {
    fn checkpoint(&self, tree: &Tree, parent: Option<NodeId>) -> Checkpoint {
        Checkpoint {
            pos: self.pos,
            arena: tree.len(),
            children: parent.map_or(0, |p| tree.children(p).len()),
            tokens: self.token_nodes.len(),
        }
    }

    fn rollback(&mut self, tree: &mut Tree, parent: Option<NodeId>, cp: Checkpoint) {
        self.pos = cp.pos;
        tree.truncate(cp.arena);
        if let Some(p) = parent {
            tree.node_mut(p).children.truncate(cp.children);
        }
        self.token_nodes.truncate(cp.tokens);
    }

    fn parse_rule(&mut self, tree: &mut Tree, name: &str, parent: Option<NodeId>) -> Option<NodeId> {
        if self.depth >= RECURSION_LIMIT {
            return None;
        }
        let rule = self
            .set
            .grammar
            .rule(name)
            .expect("rule references validated at grammar load");

        let cp = self.checkpoint(tree, parent);
        let replacement = self.set.replacements.rule(name).unwrap_or("");
        let node = tree.push(
            Node::new(NodeKind::Rule {
                name: name.to_owned(),
            })
            .with_replacement(replacement),
        );
        if let Some(p) = parent {
            tree.attach(p, node);
        }

        let first = self.pos;
        self.depth += 1;
        let ok = match rule.recursion {
            Recursion::Left => self.parse_left_recursive(tree, rule, node),
            _ => self.parse_alternatives(tree, &rule.alts, node),
        };
        self.depth -= 1;

        if !ok {
            self.rollback(tree, parent, cp);
            return None;
        }
        self.set_span(tree, node, first);
        Some(node)
    }

    /// Advisory span from the consumed lexeme range.
    fn set_span(&self, tree: &mut Tree, node: NodeId, first: usize) {
        if self.pos > first {
            let start = self.lexemes[first].start;
            let end = self.lexemes[self.pos - 1].end;
            let n = tree.node_mut(node);
            n.start = start;
            n.end = end;
        }
    }

    fn parse_alternatives(&mut self, tree: &mut Tree, alts: &[Alt], parent: NodeId) -> bool {
        for alt in alts {
            let cp = self.checkpoint(tree, Some(parent));
            if self.parse_sequence(tree, &alt.terms, parent) {
                return true;
            }
            self.rollback(tree, Some(parent), cp);
        }
        false
    }

    /// Left recursion cannot descend; parse the base, then greedily
    /// unroll the recursive suffixes, one quantifier group per step.
    fn parse_left_recursive(&mut self, tree: &mut Tree, rule: &RuleDef, node: NodeId) -> bool {
        let mut base_ok = false;
        for alt in rule.alts.iter().filter(|a| !self_headed(&rule.name, a)) {
            let cp = self.checkpoint(tree, Some(node));
            if self.parse_sequence(tree, &alt.terms, node) {
                base_ok = true;
                break;
            }
            self.rollback(tree, Some(node), cp);
        }
        if !base_ok {
            return false;
        }

        loop {
            let mut advanced = false;
            for alt in rule.alts.iter().filter(|a| self_headed(&rule.name, a)) {
                let cp = self.checkpoint(tree, Some(node));
                let group = tree.push(Node::new(NodeKind::Quantifier));
                tree.attach(node, group);
                if self.parse_sequence(tree, &alt.terms[1..], group) && self.pos > cp.pos {
                    advanced = true;
                    break;
                }
                self.rollback(tree, Some(node), cp);
            }
            if !advanced {
                return true;
            }
        }
    }

    fn parse_sequence(&mut self, tree: &mut Tree, terms: &[Term], parent: NodeId) -> bool {
        for term in terms {
            match term.quant {
                Quant::One => {
                    if !self.parse_atom(tree, &term.atom, parent) {
                        return false;
                    }
                }
                Quant::Opt => {
                    self.parse_quantified_instance(tree, &term.atom, parent);
                }
                Quant::Star => while self.parse_quantified_instance(tree, &term.atom, parent) {},
                Quant::Plus => {
                    if !self.parse_atom(tree, &term.atom, parent) {
                        return false;
                    }
                    while self.parse_quantified_instance(tree, &term.atom, parent) {}
                }
            }
        }
        true
    }

    /// One `?`/`*`/`+` instance under its own quantifier node. An empty
    /// match rolls back: it cannot advance the parse and an empty group
    /// would add nothing for the reducer.
    fn parse_quantified_instance(&mut self, tree: &mut Tree, atom: &Atom, parent: NodeId) -> bool {
        let cp = self.checkpoint(tree, Some(parent));
        let group = tree.push(Node::new(NodeKind::Quantifier));
        tree.attach(parent, group);
        if self.parse_atom(tree, atom, group) && self.pos > cp.pos {
            true
        } else {
            self.rollback(tree, Some(parent), cp);
            false
        }
    }

    fn parse_atom(&mut self, tree: &mut Tree, atom: &Atom, parent: NodeId) -> bool {
        match atom {
            Atom::Token(name) => self.consume(tree, parent, name),
            Atom::Literal(text) => {
                let name = self.literal_name(text);
                self.consume(tree, parent, &name)
            }
            Atom::Rule(name) => self.parse_rule(tree, name, Some(parent)).is_some(),
            Atom::Group(alts) => self.parse_alternatives(tree, alts, parent),
        }
    }

    /// Lexeme name an inline literal resolves to: a named token with the
    /// same fixed text wins over the anonymous form.
    fn literal_name(&self, text: &str) -> String {
        for def in self.set.grammar.tokens() {
            if matches!(&def.pattern, TokenPattern::Literal(t) if t == text) {
                return def.name.clone();
            }
        }
        literal_token_name(text)
    }

    /// Consume the next significant lexeme if it has the expected name,
    /// attaching any hidden lexemes before it.
    fn consume(&mut self, tree: &mut Tree, parent: NodeId, name: &str) -> bool {
        let mut idx = self.pos;
        while idx < self.lexemes.len() && self.lexemes[idx].hidden {
            idx += 1;
        }
        let Some(lex) = self.lexemes.get(idx) else {
            return false;
        };
        if lex.name != name {
            return false;
        }

        for hidden in &self.lexemes[self.pos..idx] {
            let node = tree.push(
                Node::new(NodeKind::Hidden {
                    name: hidden.name.clone(),
                    text: hidden.text.clone(),
                })
                .with_span(hidden.start, hidden.end),
            );
            tree.attach(parent, node);
        }
        let node = tree.push(
            Node::new(NodeKind::Token {
                name: lex.name.clone(),
                text: lex.text.clone(),
            })
            .with_replacement(lex.replacement.clone())
            .with_span(lex.start, lex.end),
        );
        tree.attach(parent, node);
        self.token_nodes.push(node);
        self.pos = idx + 1;
        self.max_pos = self.max_pos.max(self.pos);
        true
    }
}

fn self_headed(rule_name: &str, alt: &Alt) -> bool {
    matches!(
        alt.terms.first(),
        Some(Term {
            atom: Atom::Rule(r),
            quant: Quant::One,
        }) if r == rule_name
    )
}

/// Apply island rules to the token nodes of one parse. The first rule
/// whose pattern matches a token wins; its named capture groups are
/// reparsed and spliced, the rest of the token text stays as literal
/// fragments. A failed island reparse leaves the token untouched.
fn expand_islands(
    tree: &mut Tree,
    bundle: &Bundle,
    set: &GrammarSet,
    token_nodes: Vec<NodeId>,
    issues: &mut Vec<BuildIssue>,
) -> Result<(), BuildError> {
    if set.islands.is_empty() {
        return Ok(());
    }
    for id in token_nodes {
        let NodeKind::Token { name, text } = &tree.node(id).kind else {
            continue;
        };
        let (name, text) = (name.clone(), text.clone());
        let Some(rules) = set.islands.get(&name) else {
            continue;
        };
        for rule in rules {
            if expand_one_island(tree, bundle, rule, id, &name, &text, issues)? {
                break;
            }
        }
    }
    Ok(())
}

fn expand_one_island(
    tree: &mut Tree,
    bundle: &Bundle,
    island: &IslandRule,
    token: NodeId,
    token_name: &str,
    text: &str,
    issues: &mut Vec<BuildIssue>,
) -> Result<bool, BuildError> {
    let Some(caps) = island.pattern.captures(text) else {
        return Ok(false);
    };
    let mut matched: Vec<(usize, usize)> = island
        .pattern
        .capture_names()
        .flatten()
        .filter_map(|name| caps.name(name))
        .map(|m| (m.start(), m.end()))
        .collect();
    matched.sort_unstable();
    // Overlapping groups cannot be spliced side by side; first wins.
    let mut spans: Vec<(usize, usize)> = Vec::with_capacity(matched.len());
    let mut last_end = 0;
    for (start, end) in matched {
        if start >= last_end {
            spans.push((start, end));
            last_end = end;
        }
    }
    if spans.is_empty() {
        return Ok(false);
    }

    let target = bundle
        .get(&island.grammar)
        .expect("island targets validated at bundle build");
    let arena_cp = tree.len();
    let issues_cp = issues.len();
    let mut parts = Vec::with_capacity(spans.len());
    for &(start, end) in &spans {
        match parse_with_grammar(tree, bundle, target, &island.rule, &text[start..end], issues) {
            Ok(root) => parts.push((start, end, root)),
            Err(BuildError::ParseFailed { .. }) => {
                tree.truncate(arena_cp);
                issues.truncate(issues_cp);
                return Ok(false);
            }
            Err(other) => return Err(other),
        }
    }

    // Splice: the token becomes an internal node interleaving literal
    // fragments with the island subtrees.
    let mut children = Vec::new();
    let mut prev = 0;
    for (start, end, root) in parts {
        if start > prev {
            children.push(fragment(tree, token_name, &text[prev..start]));
        }
        children.push(root);
        prev = end;
    }
    if prev < text.len() {
        children.push(fragment(tree, token_name, &text[prev..]));
    }

    for &child in &children {
        tree.node_mut(child).parent = Some(token);
    }
    let node = tree.node_mut(token);
    node.kind = NodeKind::Rule {
        name: token_name.to_owned(),
    };
    node.children = children;
    debug!(token = token_name, grammar = %island.grammar, "expanded island");
    Ok(true)
}

/// Literal fragment of a host token around island matches. Replacement is
/// the text itself: the fragment is mandatory syntax of the host token.
fn fragment(tree: &mut Tree, name: &str, text: &str) -> NodeId {
    tree.push(
        Node::new(NodeKind::Token {
            name: name.to_owned(),
            text: text.to_owned(),
        })
        .with_replacement(text),
    )
}
