//! Tokenizer for the native statement language.

use crate::{CqlError, CqlResult};
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub(crate) enum Token {
    // Keywords are lexed as words and matched case-insensitively by the parser.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Word(String),

    #[regex(r#""([^"]|"")*""#, |lex| unquote(lex.slice(), '"'))]
    QuotedIdent(String),

    #[regex(r"'([^']|'')*'", |lex| unquote(lex.slice(), '\''))]
    Str(String),

    /// Unsigned; the parser applies a leading `-`.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Int(u64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"0[xX][0-9a-fA-F]*", |lex| hex::decode(&lex.slice()[2..]).ok())]
    Hex(Vec<u8>),

    #[regex(r":[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Placeholder(String),

    #[token("*")]
    Star,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Lte,
    #[token(">")]
    Gt,
    #[token(">=")]
    Gte,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token(";")]
    Semicolon,
}

impl Token {
    /// Returns true if this is the keyword `kw` (case-insensitive).
    pub(crate) fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Self::Word(w) if w.eq_ignore_ascii_case(kw))
    }
}

fn unquote(slice: &str, quote: char) -> String {
    let inner = &slice[1..slice.len() - 1];
    let doubled: String = [quote, quote].iter().collect();
    inner.replace(&doubled, &quote.to_string())
}

/// Splits `source` into tokens paired with their starting byte offset.
pub(crate) fn tokenize(source: &str) -> CqlResult<Vec<(Token, usize)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push((token, span.start)),
            Err(()) => {
                return Err(CqlError::Syntax {
                    position: span.start,
                    message: format!("unexpected input `{}`", lexer.slice()),
                });
            }
        }
    }
    Ok(tokens)
}
