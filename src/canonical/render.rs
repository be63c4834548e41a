//! Token → canonical text, plus the ordering used wherever items are sorted.

use std::cmp::Ordering;

use super::lexer::{Token, TokenKind};

/// Words upper-cased wherever they appear outside literals.
const RESERVED_WORDS: &[&str] = &[
    "AND", "OR", "NOT", "IN", "LIKE", "INCLUDES", "EXCLUDES", "ASC", "DESC", "NULLS", "NULL",
    "TRUE", "FALSE",
];

#[inline]
pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|r| r.eq_ignore_ascii_case(word))
}

fn push_word(out: &mut String, prev: Option<&Token<'_>>, tok: &Token<'_>) {
    let after_nulls = prev.is_some_and(|p| p.is_word("NULLS"));
    let upper = is_reserved(&tok.text)
        || (after_nulls && (tok.is_word("FIRST") || tok.is_word("LAST")));
    if upper {
        out.extend(tok.text.chars().map(|c| c.to_ascii_uppercase()));
    } else {
        out.push_str(&tok.text);
    }
}

#[inline]
fn opens_group(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::LParen | TokenKind::SubSelect)
}

fn needs_space(prev: &Token<'_>, cur: &Token<'_>) -> bool {
    if matches!(cur.kind, TokenKind::Comma | TokenKind::RParen) {
        return false;
    }
    if prev.kind == TokenKind::LParen {
        return false;
    }
    // Function call: `COUNT(Id)`, `toLabel(Status)`.
    if opens_group(cur.kind) && prev.kind == TokenKind::Word && !is_reserved(&prev.text) {
        return false;
    }
    true
}

/// Renders tokens with canonical spacing, keyword case and operator spelling.
pub(crate) fn render(tokens: &[Token<'_>]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());
    let mut prev: Option<&Token<'_>> = None;

    for tok in tokens {
        if let Some(p) = prev
            && needs_space(p, tok)
        {
            out.push(' ');
        }
        match tok.kind {
            TokenKind::Word => push_word(&mut out, prev, tok),
            TokenKind::Operator if tok.text == "<>" => out.push_str("!="),
            _ => out.push_str(&tok.text),
        }
        prev = Some(tok);
    }

    out
}

/// Case-insensitive ordering with an exact tie-break, so the result is total.
pub(crate) fn canonical_cmp(a: &str, b: &str) -> Ordering {
    let folded = a
        .bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()));
    folded.then_with(|| a.cmp(b))
}

/// Splits at depth-0 tokens for which `is_separator` holds.
///
/// `is_separator` sees every depth-0 token in order, so it may carry state (e.g. to
/// skip separators inside a keyword-delimited block). Separators are dropped;
/// adjacent separators yield empty slices, which callers reject as malformed.
pub(crate) fn split_top_level<'t, 'a>(
    tokens: &'t [Token<'a>],
    mut is_separator: impl FnMut(&Token<'a>) -> bool,
) -> Vec<&'t [Token<'a>]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, tok) in tokens.iter().enumerate() {
        match tok.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => depth = depth.saturating_sub(1),
            _ if depth == 0 && is_separator(tok) => {
                parts.push(&tokens[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}
