//! Lexer for the grammar DSL.
//!
//! Produces span-based tokens; text is sliced from the source when needed.

use logos::Logos;
use std::ops::Range;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
pub enum DslToken {
    #[token("grammar")]
    GrammarKw,

    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token("|")]
    Pipe,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("?")]
    Question,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("->")]
    Arrow,

    /// Parser-rule name (also the channel words after `->`).
    #[regex(r"[a-z][A-Za-z0-9_]*")]
    LowerIdent,

    /// Lexer-rule name.
    #[regex(r"[A-Z][A-Za-z0-9_]*")]
    UpperIdent,

    /// Quoted literal with `\`-escapes.
    #[regex(r"'(?:[^'\\]|\\.)*'")]
    Literal,

    /// `/regex/` pattern; `\/` escapes the delimiter.
    #[regex(r"/(?:[^/\\\n]|\\.)+/")]
    Regex,
}

/// A lexed token: kind plus byte span into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexed {
    pub kind: DslToken,
    pub span: (usize, usize),
}

/// Tokenize a grammar source. An unlexable byte is reported with its
/// position for the caller to turn into a syntax error.
pub fn lex(source: &str) -> Result<Vec<Lexed>, usize> {
    let mut tokens = Vec::new();
    let mut lexer = DslToken::lexer(source);
    while let Some(result) = lexer.next() {
        let Range { start, end } = lexer.span();
        match result {
            Ok(kind) => tokens.push(Lexed {
                kind,
                span: (start, end),
            }),
            Err(()) => return Err(start),
        }
    }
    Ok(tokens)
}

/// Interpret the escapes of a quoted literal body (`\n`, `\t`, `\r`,
/// `\\`, `\'`; any other escaped char stands for itself).
pub fn unescape_literal(quoted: &str) -> String {
    let body = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Strip the `/` delimiters of a regex token and unescape `\/`.
/// All other escapes are left for the regex engine.
pub fn unescape_regex(delimited: &str) -> String {
    let body = &delimited[1..delimited.len() - 1];
    body.replace(r"\/", "/")
}

/// Convert a byte offset to (1-indexed line, 0-indexed column).
pub fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut column = 0u32;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}
