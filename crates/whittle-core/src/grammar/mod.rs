//! Grammar model and front-end.
//!
//! A [`Grammar`] is an ordered table of lexer rules ([`TokenDef`]) and
//! parser rules ([`RuleDef`]). Grammars are written in a compact BNF-like
//! DSL (see `parse`) and validated on load: all references must resolve,
//! token patterns must compile, and direct self-recursion is classified so
//! the builder and the flattener agree on unroll direction.

mod lexer;
mod parse;
mod replacement;

#[cfg(test)]
mod parse_tests;
#[cfg(test)]
mod replacement_tests;

use indexmap::IndexMap;
use thiserror::Error;

pub use parse::parse_grammar;
pub use replacement::{Replacements, compute_replacements};

/// Errors raised while loading or analyzing a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("{line}:{column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        message: String,
    },

    #[error("rule `{0}` is defined more than once")]
    Duplicate(String),

    #[error("rule `{rule}` references undefined `{name}`")]
    Undefined { rule: String, name: String },

    #[error("invalid pattern for token `{name}`: {message}")]
    Pattern { name: String, message: String },

    #[error("grammar `{0}` has no parser rules")]
    Empty(String),

    #[error("no minimal replacement for `{0}` (recursion without a base case?)")]
    ReplacementUnresolvable(String),
}

/// Lexer channel for a token definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    #[default]
    Default,
    /// Matched and kept in the tree but invisible to the reducer.
    Hidden,
    /// Matched and discarded entirely.
    Skip,
}

/// How a token's text is recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPattern {
    Literal(String),
    Regex(String),
}

/// A lexer rule.
#[derive(Debug, Clone)]
pub struct TokenDef {
    pub name: String,
    pub pattern: TokenPattern,
    pub channel: Channel,
}

/// Term quantifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quant {
    #[default]
    One,
    Opt,
    Star,
    Plus,
}

impl Quant {
    /// Whether zero occurrences satisfy the term.
    pub fn optional(self) -> bool {
        matches!(self, Quant::Opt | Quant::Star)
    }
}

/// An atomic term in an alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// Reference to a parser rule.
    Rule(String),
    /// Reference to a named lexer rule.
    Token(String),
    /// Inline literal (anonymous fixed token).
    Literal(String),
    /// Parenthesized group of alternatives.
    Group(Vec<Alt>),
}

/// A quantified term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub atom: Atom,
    pub quant: Quant,
}

/// One alternative: a sequence of terms.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alt {
    pub terms: Vec<Term>,
}

/// Direct self-recursion classification for a parser rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recursion {
    #[default]
    None,
    /// Some alternative starts with an unquantified self-reference.
    Left,
    /// Some alternative ends with an unquantified self-reference.
    Right,
}

/// A parser rule: ordered alternatives.
#[derive(Debug, Clone)]
pub struct RuleDef {
    pub name: String,
    pub alts: Vec<Alt>,
    pub recursion: Recursion,
}

/// A validated grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    name: String,
    start: String,
    tokens: IndexMap<String, TokenDef>,
    rules: IndexMap<String, RuleDef>,
}

impl Grammar {
    /// Assemble and validate a grammar from parsed definitions. The first
    /// parser rule becomes the default start rule.
    pub fn new(
        name: String,
        tokens: Vec<TokenDef>,
        rules: Vec<(String, Vec<Alt>)>,
    ) -> Result<Self, GrammarError> {
        let mut token_map = IndexMap::new();
        for token in tokens {
            if token_map.contains_key(&token.name) {
                return Err(GrammarError::Duplicate(token.name));
            }
            token_map.insert(token.name.clone(), token);
        }

        let mut rule_map = IndexMap::new();
        for (rule_name, alts) in rules {
            if rule_map.contains_key(&rule_name) || token_map.contains_key(&rule_name) {
                return Err(GrammarError::Duplicate(rule_name));
            }
            let recursion = classify_recursion(&rule_name, &alts);
            rule_map.insert(
                rule_name.clone(),
                RuleDef {
                    name: rule_name,
                    alts,
                    recursion,
                },
            );
        }

        let Some(start) = rule_map.keys().next().cloned() else {
            return Err(GrammarError::Empty(name));
        };

        let grammar = Self {
            name,
            start,
            tokens: token_map,
            rules: rule_map,
        };
        grammar.check_references()?;
        Ok(grammar)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default start rule (the first parser rule).
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn rule(&self, name: &str) -> Option<&RuleDef> {
        self.rules.get(name)
    }

    pub fn token(&self, name: &str) -> Option<&TokenDef> {
        self.tokens.get(name)
    }

    pub fn rules(&self) -> impl Iterator<Item = &RuleDef> {
        self.rules.values()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenDef> {
        self.tokens.values()
    }

    /// Inline literals appearing in parser rules, in first-appearance
    /// order. These are anonymous fixed tokens for the lexer.
    pub fn inline_literals(&self) -> Vec<String> {
        let mut literals = Vec::new();
        for rule in self.rules.values() {
            collect_literals(&rule.alts, &mut literals);
        }
        literals
    }

    fn check_references(&self) -> Result<(), GrammarError> {
        for rule in self.rules.values() {
            self.check_alts(&rule.name, &rule.alts)?;
        }
        Ok(())
    }

    fn check_alts(&self, rule: &str, alts: &[Alt]) -> Result<(), GrammarError> {
        for alt in alts {
            for term in &alt.terms {
                match &term.atom {
                    Atom::Rule(name) => {
                        if !self.rules.contains_key(name) {
                            return Err(GrammarError::Undefined {
                                rule: rule.to_owned(),
                                name: name.clone(),
                            });
                        }
                    }
                    Atom::Token(name) => {
                        if !self.tokens.contains_key(name) {
                            return Err(GrammarError::Undefined {
                                rule: rule.to_owned(),
                                name: name.clone(),
                            });
                        }
                    }
                    Atom::Literal(_) => {}
                    Atom::Group(alts) => self.check_alts(rule, alts)?,
                }
            }
        }
        Ok(())
    }
}

/// Tree-node name for an anonymous literal token.
pub fn literal_token_name(text: &str) -> String {
    format!("'{text}'")
}

fn collect_literals(alts: &[Alt], out: &mut Vec<String>) {
    for alt in alts {
        for term in &alt.terms {
            match &term.atom {
                Atom::Literal(text) => {
                    if !out.contains(text) {
                        out.push(text.clone());
                    }
                }
                Atom::Group(inner) => collect_literals(inner, out),
                Atom::Rule(_) | Atom::Token(_) => {}
            }
        }
    }
}

/// Classify direct self-recursion. Left recursion wins when a rule is
/// recursive in both directions; the builder then parses it iteratively.
fn classify_recursion(name: &str, alts: &[Alt]) -> Recursion {
    let is_self = |term: &Term| {
        term.quant == Quant::One && matches!(&term.atom, Atom::Rule(r) if r == name)
    };
    if alts.iter().any(|a| a.terms.first().is_some_and(is_self)) {
        return Recursion::Left;
    }
    if alts.iter().any(|a| a.terms.last().is_some_and(is_self)) {
        return Recursion::Right;
    }
    Recursion::None
}
