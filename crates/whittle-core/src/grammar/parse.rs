//! Recursive-descent parser for the grammar DSL.
//!
//! ```text
//! grammar ini;
//!
//! document : line* ;
//! line     : section | pair | comment ;
//! section  : '[' NAME ']' NL ;
//!
//! NAME : /[A-Za-z_][A-Za-z0-9_.-]*/ ;
//! NL   : '\n' ;
//! WS   : /[ \t]+/ -> hidden ;
//! ```
//!
//! Lowercase identifiers are parser rules, uppercase are lexer rules; the
//! first parser rule is the default start rule. Lexer rules take a single
//! literal or `/regex/` body and an optional `-> hidden` / `-> skip`
//! channel directive.

use super::lexer::{DslToken, Lexed, lex, line_column, unescape_literal, unescape_regex};
use super::{Alt, Atom, Channel, Grammar, GrammarError, Quant, Term, TokenDef, TokenPattern};

/// Parse one grammar-DSL source into a validated [`Grammar`].
pub fn parse_grammar(source: &str) -> Result<Grammar, GrammarError> {
    let tokens = lex(source).map_err(|offset| syntax(source, offset, "unexpected character"))?;
    Parser {
        source,
        tokens: &tokens,
        pos: 0,
    }
    .grammar()
}

fn syntax(source: &str, offset: usize, message: impl Into<String>) -> GrammarError {
    let (line, column) = line_column(source, offset);
    GrammarError::Syntax {
        line,
        column,
        message: message.into(),
    }
}

struct Parser<'s> {
    source: &'s str,
    tokens: &'s [Lexed],
    pos: usize,
}

impl<'s> Parser<'s> {
    fn grammar(mut self) -> Result<Grammar, GrammarError> {
        self.expect(DslToken::GrammarKw, "expected `grammar` header")?;
        let name = self.ident("expected grammar name")?;
        self.expect(DslToken::Semi, "expected `;` after grammar name")?;

        let mut tokens = Vec::new();
        let mut rules = Vec::new();
        while let Some(t) = self.peek() {
            match t.kind {
                DslToken::LowerIdent => {
                    let rule_name = self.text(t).to_owned();
                    self.pos += 1;
                    self.expect(DslToken::Colon, "expected `:` after rule name")?;
                    let alts = self.alternatives()?;
                    self.expect(DslToken::Semi, "expected `;` after rule body")?;
                    rules.push((rule_name, alts));
                }
                DslToken::UpperIdent => {
                    let def = self.token_rule()?;
                    tokens.push(def);
                }
                _ => return Err(self.err_here("expected a rule definition")),
            }
        }
        Grammar::new(name, tokens, rules)
    }

    fn token_rule(&mut self) -> Result<TokenDef, GrammarError> {
        let t = self.peek().expect("caller checked");
        let name = self.text(t).to_owned();
        self.pos += 1;
        self.expect(DslToken::Colon, "expected `:` after token name")?;

        let pattern = match self.peek() {
            Some(t) if t.kind == DslToken::Literal => {
                self.pos += 1;
                TokenPattern::Literal(unescape_literal(self.text(t)))
            }
            Some(t) if t.kind == DslToken::Regex => {
                self.pos += 1;
                TokenPattern::Regex(unescape_regex(self.text(t)))
            }
            _ => return Err(self.err_here("expected a literal or /regex/ token body")),
        };

        let mut channel = Channel::Default;
        if self.eat(DslToken::Arrow) {
            let word = self.ident("expected `hidden` or `skip` after `->`")?;
            channel = match word.as_str() {
                "hidden" => Channel::Hidden,
                "skip" => Channel::Skip,
                _ => return Err(self.err_here("expected `hidden` or `skip` after `->`")),
            };
        }
        self.expect(DslToken::Semi, "expected `;` after token body")?;
        Ok(TokenDef {
            name,
            pattern,
            channel,
        })
    }

    fn alternatives(&mut self) -> Result<Vec<Alt>, GrammarError> {
        let mut alts = vec![self.sequence()?];
        while self.eat(DslToken::Pipe) {
            alts.push(self.sequence()?);
        }
        Ok(alts)
    }

    fn sequence(&mut self) -> Result<Alt, GrammarError> {
        let mut terms = Vec::new();
        while let Some(term) = self.term()? {
            terms.push(term);
        }
        if terms.is_empty() {
            return Err(self.err_here("empty alternative"));
        }
        Ok(Alt { terms })
    }

    fn term(&mut self) -> Result<Option<Term>, GrammarError> {
        let Some(t) = self.peek() else {
            return Ok(None);
        };
        let atom = match t.kind {
            DslToken::LowerIdent => {
                self.pos += 1;
                Atom::Rule(self.text(t).to_owned())
            }
            DslToken::UpperIdent => {
                self.pos += 1;
                Atom::Token(self.text(t).to_owned())
            }
            DslToken::Literal => {
                self.pos += 1;
                Atom::Literal(unescape_literal(self.text(t)))
            }
            DslToken::LParen => {
                self.pos += 1;
                let alts = self.alternatives()?;
                self.expect(DslToken::RParen, "expected `)`")?;
                Atom::Group(alts)
            }
            _ => return Ok(None),
        };

        let quant = match self.peek().map(|t| t.kind) {
            Some(DslToken::Question) => {
                self.pos += 1;
                Quant::Opt
            }
            Some(DslToken::Star) => {
                self.pos += 1;
                Quant::Star
            }
            Some(DslToken::Plus) => {
                self.pos += 1;
                Quant::Plus
            }
            _ => Quant::One,
        };
        Ok(Some(Term { atom, quant }))
    }

    fn peek(&self) -> Option<Lexed> {
        self.tokens.get(self.pos).copied()
    }

    fn text(&self, t: Lexed) -> &'s str {
        &self.source[t.span.0..t.span.1]
    }

    fn eat(&mut self, kind: DslToken) -> bool {
        if self.peek().is_some_and(|t| t.kind == kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: DslToken, message: &str) -> Result<(), GrammarError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.err_here(message))
        }
    }

    fn ident(&mut self, message: &str) -> Result<String, GrammarError> {
        match self.peek() {
            Some(t) if matches!(t.kind, DslToken::LowerIdent | DslToken::UpperIdent) => {
                self.pos += 1;
                Ok(self.text(t).to_owned())
            }
            _ => Err(self.err_here(message)),
        }
    }

    fn err_here(&self, message: &str) -> GrammarError {
        let offset = self
            .peek()
            .map(|t| t.span.0)
            .unwrap_or_else(|| self.source.len());
        syntax(self.source, offset, message)
    }
}
