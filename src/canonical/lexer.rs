//! Quote-aware, depth-checked tokenizer.

use std::borrow::Cow;
use std::ops::Range;

use super::error::{CanonicalError, CanonicalResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    Literal,
    Operator,
    Comma,
    LParen,
    RParen,
    /// A parenthesized sub-select already reduced to canonical text (parens included).
    SubSelect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) text: Cow<'a, str>,
    pub(crate) span: Range<usize>,
}

impl<'a> Token<'a> {
    fn borrowed(kind: TokenKind, src: &'a str, span: Range<usize>) -> Self {
        Self {
            kind,
            text: Cow::Borrowed(&src[span.clone()]),
            span,
        }
    }

    pub(crate) fn sub_select(canonical: String, span: Range<usize>) -> Self {
        Self {
            kind: TokenKind::SubSelect,
            text: Cow::Owned(canonical),
            span,
        }
    }

    /// Case-insensitive keyword test; literals never match.
    #[inline]
    pub(crate) fn is_word(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(keyword)
    }
}

#[inline]
fn is_quote(b: u8) -> bool {
    b == b'\'' || b == b'"'
}

#[inline]
fn is_operator_byte(b: u8) -> bool {
    matches!(b, b'=' | b'!' | b'<' | b'>')
}

#[inline]
fn ends_word(b: u8) -> bool {
    b.is_ascii_whitespace() || is_quote(b) || is_operator_byte(b) || matches!(b, b'(' | b')' | b',')
}

/// Returns the byte offset just past the literal that opens at `start`.
///
/// Backslash escapes the next byte. Quote bytes are ASCII, so the returned offset is
/// always a char boundary.
pub(crate) fn skip_literal(bytes: &[u8], start: usize) -> CanonicalResult<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err(CanonicalError::UnterminatedLiteral { position: start })
}

/// Splits `src` into tokens, discarding whitespace.
///
/// Fails on unterminated literals and unbalanced parentheses, which are the only
/// structural errors detectable without clause analysis.
pub(crate) fn tokenize(src: &str) -> CanonicalResult<Vec<Token<'_>>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::with_capacity(bytes.len() / 4 + 1);
    let mut open_parens: Vec<usize> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let kind = match b {
            b'\'' | b'"' => {
                i = skip_literal(bytes, start)?;
                TokenKind::Literal
            }
            b'(' => {
                open_parens.push(start);
                i += 1;
                TokenKind::LParen
            }
            b')' => {
                if open_parens.pop().is_none() {
                    return Err(CanonicalError::UnbalancedParenthesis { position: start });
                }
                i += 1;
                TokenKind::RParen
            }
            b',' => {
                i += 1;
                TokenKind::Comma
            }
            b'=' => {
                i += 1;
                TokenKind::Operator
            }
            b'!' | b'<' | b'>' => {
                let next = bytes.get(i + 1).copied();
                i += match (b, next) {
                    (_, Some(b'=')) | (b'<', Some(b'>')) => 2,
                    _ => 1,
                };
                TokenKind::Operator
            }
            _ => {
                while i < bytes.len() && !ends_word(bytes[i]) {
                    i += 1;
                }
                TokenKind::Word
            }
        };

        tokens.push(Token::borrowed(kind, src, start..i));
    }

    if let Some(&position) = open_parens.last() {
        return Err(CanonicalError::UnclosedParenthesis { position });
    }

    Ok(tokens)
}

/// Index of the `RParen` closing the `LParen` at `open`.
pub(crate) fn matching_close(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, tok) in tokens.iter().enumerate().skip(open) {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
