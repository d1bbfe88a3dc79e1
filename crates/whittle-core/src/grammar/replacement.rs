//! Minimal-replacement computation.
//!
//! For every token and parser rule, find a shortest string that any
//! production of it may be replaced with while still matching it. Token
//! minima come from a walk of the compiled regex HIR; rule minima are a
//! memoized fixed point over the alternatives (quantified parts contribute
//! nothing, ties break to the earlier alternative).

use indexmap::IndexMap;
use regex_syntax::hir::{Class, Hir, HirKind};

use super::{Alt, Atom, Grammar, GrammarError, TokenPattern, literal_token_name};

/// Computed minimal replacements for one grammar.
#[derive(Debug, Clone, Default)]
pub struct Replacements {
    rules: IndexMap<String, String>,
    tokens: IndexMap<String, String>,
}

impl Replacements {
    pub fn rule(&self, name: &str) -> Option<&str> {
        self.rules.get(name).map(String::as_str)
    }

    /// Replacement for a named token or an anonymous literal (keyed by
    /// [`literal_token_name`]).
    pub fn token(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    pub fn rules(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn tokens(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Compute replacements for `grammar`, with `overrides` pinning chosen
/// rules up front.
///
/// Fails with [`GrammarError::ReplacementUnresolvable`] when the start
/// rule has no terminating expansion. Non-termination propagates through
/// mandatory positions only; optional parts shield their context.
pub fn compute_replacements(
    grammar: &Grammar,
    overrides: &IndexMap<String, String>,
) -> Result<Replacements, GrammarError> {
    let mut tokens = IndexMap::new();
    for def in grammar.tokens() {
        let min = match &def.pattern {
            TokenPattern::Literal(text) => text.clone(),
            TokenPattern::Regex(pattern) => shortest_match(&def.name, pattern)?,
        };
        let min = overrides.get(&def.name).cloned().unwrap_or(min);
        tokens.insert(def.name.clone(), min);
    }
    for literal in grammar.inline_literals() {
        tokens.insert(literal_token_name(&literal), literal);
    }

    // Fixed point: recompute every rule from the current table until
    // nothing changes. Lengths only ever shrink, so this terminates.
    let mut rules: IndexMap<String, Option<String>> = grammar
        .rules()
        .map(|r| (r.name.clone(), overrides.get(&r.name).cloned()))
        .collect();
    loop {
        let mut changed = false;
        for rule in grammar.rules() {
            if overrides.contains_key(&rule.name) {
                continue;
            }
            let Some(best) = best_alt(&rule.alts, &rules, &tokens) else {
                continue;
            };
            if rules[&rule.name].as_ref() != Some(&best) {
                rules.insert(rule.name.clone(), Some(best));
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // A rule in an optional position propagates nothing when unresolved
    // (`alt_min` only fails on mandatory parts), so the grammar is
    // unusable exactly when the start rule itself never resolves.
    // Unresolved leftovers have no finite derivation, never appear in a
    // tree, and are left empty.
    if rules[grammar.start()].is_none() {
        return Err(GrammarError::ReplacementUnresolvable(
            grammar.start().to_owned(),
        ));
    }

    Ok(Replacements {
        rules: rules
            .into_iter()
            .map(|(name, rep)| (name, rep.unwrap_or_default()))
            .collect(),
        tokens,
    })
}

fn best_alt(
    alts: &[Alt],
    rules: &IndexMap<String, Option<String>>,
    tokens: &IndexMap<String, String>,
) -> Option<String> {
    let mut best: Option<String> = None;
    for alt in alts {
        let Some(candidate) = alt_min(alt, rules, tokens) else {
            continue;
        };
        // Strictly shorter wins; the earlier alternative keeps ties.
        if best.as_ref().is_none_or(|b| candidate.len() < b.len()) {
            best = Some(candidate);
        }
    }
    best
}

fn alt_min(
    alt: &Alt,
    rules: &IndexMap<String, Option<String>>,
    tokens: &IndexMap<String, String>,
) -> Option<String> {
    let mut out = String::new();
    for term in &alt.terms {
        if term.quant.optional() {
            continue;
        }
        let part = match &term.atom {
            Atom::Rule(name) => rules.get(name)?.clone()?,
            Atom::Token(name) => tokens.get(name)?.clone(),
            Atom::Literal(text) => text.clone(),
            Atom::Group(inner) => best_alt(inner, rules, tokens)?,
        };
        out.push_str(&part);
    }
    Some(out)
}

/// Shortest string accepted by a token regex, via the parsed HIR.
fn shortest_match(name: &str, pattern: &str) -> Result<String, GrammarError> {
    let hir = regex_syntax::parse(pattern).map_err(|e| GrammarError::Pattern {
        name: name.to_owned(),
        message: e.to_string(),
    })?;
    shortest_of_hir(&hir).ok_or_else(|| GrammarError::Pattern {
        name: name.to_owned(),
        message: "pattern matches no string".to_owned(),
    })
}

fn shortest_of_hir(hir: &Hir) -> Option<String> {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => Some(String::new()),
        HirKind::Literal(lit) => Some(String::from_utf8_lossy(&lit.0).into_owned()),
        HirKind::Class(class) => shortest_of_class(class).map(String::from),
        HirKind::Repetition(rep) => {
            if rep.min == 0 {
                Some(String::new())
            } else {
                shortest_of_hir(&rep.sub).map(|s| s.repeat(rep.min as usize))
            }
        }
        HirKind::Capture(cap) => shortest_of_hir(&cap.sub),
        HirKind::Concat(parts) => {
            let mut out = String::new();
            for part in parts {
                out.push_str(&shortest_of_hir(part)?);
            }
            Some(out)
        }
        HirKind::Alternation(arms) => {
            // Earliest minimum-length arm wins, for determinism.
            let mut best: Option<String> = None;
            for arm in arms {
                let Some(candidate) = shortest_of_hir(arm) else {
                    continue;
                };
                if best.as_ref().is_none_or(|b| candidate.len() < b.len()) {
                    best = Some(candidate);
                }
            }
            best
        }
    }
}

fn shortest_of_class(class: &Class) -> Option<char> {
    match class {
        Class::Unicode(c) => c.ranges().first().map(|r| r.start()),
        Class::Bytes(b) => b.ranges().first().map(|r| r.start() as char),
    }
}
