//! Input tokenizer driven by a grammar's lexer rules.
//!
//! At each position every matcher is tried against the rest of the input;
//! the longest match wins, a literal beats a regex of equal length, and
//! declaration order breaks remaining ties. Skip-channel matches are
//! dropped, hidden-channel matches are kept with a flag.

use regex::Regex;

use whittle_core::grammar::{Channel, Grammar, Replacements, TokenPattern, literal_token_name};
use whittle_core::tree::Position;

use crate::build::BuildError;

/// One recognized piece of input.
#[derive(Debug, Clone)]
pub(crate) struct Lexeme {
    pub name: String,
    pub text: String,
    pub replacement: String,
    pub hidden: bool,
    pub start: Position,
    pub end: Position,
    pub byte_start: usize,
    pub byte_end: usize,
}

enum Recognizer {
    Literal(String),
    Regex(Regex),
}

struct Matcher {
    name: String,
    recognizer: Recognizer,
    channel: Channel,
    replacement: String,
}

pub(crate) struct CompiledLexer {
    matchers: Vec<Matcher>,
}

impl CompiledLexer {
    /// Compile all named lexer rules plus the grammar's inline literals.
    pub(crate) fn compile(
        grammar: &Grammar,
        replacements: &Replacements,
    ) -> Result<Self, BuildError> {
        let mut matchers = Vec::new();
        for def in grammar.tokens() {
            let recognizer = match &def.pattern {
                TokenPattern::Literal(text) => Recognizer::Literal(text.clone()),
                TokenPattern::Regex(pattern) => {
                    // Anchor at the scan position; the body keeps its own
                    // grouping via (?: ).
                    let anchored = format!(r"\A(?:{pattern})");
                    let regex = Regex::new(&anchored).map_err(|e| BuildError::TokenPattern {
                        token: def.name.clone(),
                        message: e.to_string(),
                    })?;
                    Recognizer::Regex(regex)
                }
            };
            matchers.push(Matcher {
                name: def.name.clone(),
                recognizer,
                channel: def.channel,
                replacement: replacements.token(&def.name).unwrap_or("").to_owned(),
            });
        }
        for literal in grammar.inline_literals() {
            matchers.push(Matcher {
                name: literal_token_name(&literal),
                recognizer: Recognizer::Literal(literal.clone()),
                channel: Channel::Default,
                replacement: literal,
            });
        }
        Ok(Self { matchers })
    }

    /// Tokenize `input`. Returns the lexemes plus the byte offset where
    /// tokenization got stuck, if it did.
    pub(crate) fn lex(&self, input: &str) -> (Vec<Lexeme>, Option<usize>) {
        let mut lexemes = Vec::new();
        let mut offset = 0;
        let mut pos = Position::new(1, 0);

        while offset < input.len() {
            let rest = &input[offset..];
            let Some((matcher, len)) = self.best_match(rest) else {
                return (lexemes, Some(offset));
            };
            let text = &rest[..len];
            let end = advance(pos, text);
            if matcher.channel != Channel::Skip {
                lexemes.push(Lexeme {
                    name: matcher.name.clone(),
                    text: text.to_owned(),
                    replacement: matcher.replacement.clone(),
                    hidden: matcher.channel == Channel::Hidden,
                    start: pos,
                    end,
                    byte_start: offset,
                    byte_end: offset + len,
                });
            }
            offset += len;
            pos = end;
        }
        (lexemes, None)
    }

    fn best_match(&self, rest: &str) -> Option<(&Matcher, usize)> {
        let mut best: Option<(&Matcher, usize, bool)> = None;
        for matcher in &self.matchers {
            let (len, is_literal) = match &matcher.recognizer {
                Recognizer::Literal(text) => {
                    if !rest.starts_with(text.as_str()) {
                        continue;
                    }
                    (text.len(), true)
                }
                Recognizer::Regex(regex) => {
                    let Some(m) = regex.find(rest) else { continue };
                    (m.end(), false)
                }
            };
            // Zero-length matches cannot advance the scan.
            if len == 0 {
                continue;
            }
            let wins = match best {
                None => true,
                Some((_, best_len, best_literal)) => {
                    len > best_len || (len == best_len && is_literal && !best_literal)
                }
            };
            if wins {
                best = Some((matcher, len, is_literal));
            }
        }
        best.map(|(m, len, _)| (m, len))
    }
}

pub(crate) fn advance(mut pos: Position, text: &str) -> Position {
    for c in text.chars() {
        if c == '\n' {
            pos.line += 1;
            pos.column = 0;
        } else {
            pos.column += 1;
        }
    }
    pos
}
