//! Grammar bundles.
//!
//! A bundle maps logical grammar names to loaded grammars with their
//! computed replacements and island rules. Bundles come from a JSON
//! descriptor on disk or are assembled programmatically.
//!
//! Descriptor shape:
//!
//! ```json
//! {
//!   "grammars": {
//!     "ini":  { "files": ["ini.wg"],
//!               "islands": { "VALUE": [ { "pattern": "(?P<json>\\{.*\\})",
//!                                          "grammar": "json",
//!                                          "rule": "value" } ] },
//!               "replacements": { "pair": "k=v\n" } },
//!     "json": { "files": ["json.wg"] }
//!   }
//! }
//! ```
//!
//! `files` are concatenated in order before parsing (only the first file
//! carries the `grammar name;` header). Island patterns are regexes whose
//! named capture groups are reparsed with the named grammar and rule.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use whittle_core::{Grammar, Replacements, compute_replacements, parse_grammar};

use crate::build::BuildError;

/// One grammar with its reduction metadata.
#[derive(Debug)]
pub struct GrammarSet {
    pub grammar: Grammar,
    pub replacements: Replacements,
    /// Token name → island rules applied to that token's text.
    pub islands: IndexMap<String, Vec<IslandRule>>,
}

/// Reparse instruction for matches inside a host token.
#[derive(Debug)]
pub struct IslandRule {
    pub pattern: Regex,
    pub grammar: String,
    pub rule: String,
}

/// A set of grammars addressable by logical name.
#[derive(Debug, Default)]
pub struct Bundle {
    sets: IndexMap<String, GrammarSet>,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    grammars: IndexMap<String, GrammarEntry>,
}

#[derive(Debug, Deserialize)]
struct GrammarEntry {
    files: Vec<PathBuf>,
    #[serde(default)]
    islands: IndexMap<String, Vec<IslandEntry>>,
    #[serde(default)]
    replacements: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct IslandEntry {
    pattern: String,
    grammar: String,
    rule: String,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a bundle from a JSON descriptor. Relative grammar paths are
    /// resolved against the descriptor's directory.
    pub fn from_descriptor_file(path: &Path) -> Result<Self, BuildError> {
        let text = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_owned(),
            source,
        })?;
        let descriptor: Descriptor =
            serde_json::from_str(&text).map_err(BuildError::Descriptor)?;
        let base = path.parent().unwrap_or(Path::new("."));

        let mut bundle = Self::new();
        // Grammars first so island targets can be validated afterwards.
        for (name, entry) in &descriptor.grammars {
            let mut source = String::new();
            for file in &entry.files {
                let file = if file.is_absolute() {
                    file.clone()
                } else {
                    base.join(file)
                };
                let part = fs::read_to_string(&file).map_err(|e| BuildError::Io {
                    path: file.clone(),
                    source: e,
                })?;
                source.push_str(&part);
                source.push('\n');
            }
            bundle.add_grammar_as(name, &source, &entry.replacements)?;
        }
        for (name, entry) in &descriptor.grammars {
            for (token, islands) in &entry.islands {
                for island in islands {
                    bundle.add_island(
                        name,
                        token,
                        &island.pattern,
                        &island.grammar,
                        &island.rule,
                    )?;
                }
            }
        }
        Ok(bundle)
    }

    /// Parse and add a grammar under the name from its `grammar` header.
    pub fn add_grammar(
        &mut self,
        source: &str,
        overrides: &IndexMap<String, String>,
    ) -> Result<String, BuildError> {
        let grammar = parse_grammar(source)?;
        let name = grammar.name().to_owned();
        self.insert(name.clone(), grammar, overrides)?;
        Ok(name)
    }

    /// Parse and add a grammar under an explicit logical name.
    pub fn add_grammar_as(
        &mut self,
        name: &str,
        source: &str,
        overrides: &IndexMap<String, String>,
    ) -> Result<(), BuildError> {
        let grammar = parse_grammar(source)?;
        self.insert(name.to_owned(), grammar, overrides)
    }

    fn insert(
        &mut self,
        name: String,
        grammar: Grammar,
        overrides: &IndexMap<String, String>,
    ) -> Result<(), BuildError> {
        let replacements = compute_replacements(&grammar, overrides)?;
        self.sets.insert(
            name,
            GrammarSet {
                grammar,
                replacements,
                islands: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Attach an island rule: named capture groups of `pattern` matched
    /// inside `token`'s text are reparsed with `target_grammar` starting
    /// at `target_rule`. The target must already be in the bundle.
    pub fn add_island(
        &mut self,
        grammar: &str,
        token: &str,
        pattern: &str,
        target_grammar: &str,
        target_rule: &str,
    ) -> Result<(), BuildError> {
        let target = self
            .sets
            .get(target_grammar)
            .ok_or_else(|| BuildError::UnknownGrammar(target_grammar.to_owned()))?;
        if target.grammar.rule(target_rule).is_none() {
            return Err(BuildError::UnknownStart(format!(
                "{target_grammar}:{target_rule}"
            )));
        }
        let pattern = Regex::new(pattern).map_err(|e| BuildError::IslandPattern {
            token: token.to_owned(),
            message: e.to_string(),
        })?;
        let host = self
            .sets
            .get_mut(grammar)
            .ok_or_else(|| BuildError::UnknownGrammar(grammar.to_owned()))?;
        host.islands.entry(token.to_owned()).or_default().push(IslandRule {
            pattern,
            grammar: target_grammar.to_owned(),
            rule: target_rule.to_owned(),
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&GrammarSet> {
        self.sets.get(name)
    }

    pub fn grammars(&self) -> impl Iterator<Item = (&str, &GrammarSet)> {
        self.sets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a start rule: `grammar:rule`, or a bare rule name defined
    /// by exactly one grammar.
    pub fn resolve_start<'a, 'b>(
        &'a self,
        start: &'b str,
    ) -> Result<(&'a str, &'a GrammarSet, &'b str), BuildError> {
        if let Some((grammar, rule)) = start.split_once(':') {
            let (name, set) = self
                .sets
                .get_key_value(grammar)
                .ok_or_else(|| BuildError::UnknownGrammar(grammar.to_owned()))?;
            if set.grammar.rule(rule).is_none() {
                return Err(BuildError::UnknownStart(start.to_owned()));
            }
            return Ok((name.as_str(), set, rule));
        }

        let mut hits = self
            .sets
            .iter()
            .filter(|(_, set)| set.grammar.rule(start).is_some());
        match (hits.next(), hits.next()) {
            (Some((name, set)), None) => Ok((name.as_str(), set, start)),
            (Some(_), Some(_)) => Err(BuildError::AmbiguousStart(start.to_owned())),
            (None, _) => Err(BuildError::UnknownStart(start.to_owned())),
        }
    }
}
