//! Predicate normalization for `WHERE` and `HAVING`.
//!
//! Conjuncts are sorted because `AND` is commutative for cache-key purposes.
//! Disjuncts keep their written order: reordering `OR` is not proven safe across
//! every literal form, so two queries differing only in `OR` order get different keys.

use super::error::{CanonicalError, CanonicalResult};
use super::lexer::{Token, TokenKind, matching_close};
use super::render::{canonical_cmp, render, split_top_level};

pub(crate) struct PredicateNormalizer {
    pub(crate) clause: &'static str,
    pub(crate) max_depth: usize,
}

impl PredicateNormalizer {
    pub(crate) fn normalize(&self, tokens: &[Token<'_>]) -> CanonicalResult<String> {
        self.expression(tokens, 0)
    }

    fn expression(&self, tokens: &[Token<'_>], depth: usize) -> CanonicalResult<String> {
        if depth > self.max_depth {
            return Err(CanonicalError::NestingTooDeep {
                limit: self.max_depth,
            });
        }

        let disjuncts = split_top_level(tokens, |t| t.is_word("OR"));
        let mut rendered = Vec::with_capacity(disjuncts.len());
        for disjunct in disjuncts {
            let mut conjuncts = split_conjuncts(disjunct)
                .into_iter()
                .map(|c| self.conjunct(c, depth))
                .collect::<CanonicalResult<Vec<_>>>()?;
            conjuncts.sort_by(|a, b| canonical_cmp(a, b));
            rendered.push(conjuncts.join(" AND "));
        }
        Ok(rendered.join(" OR "))
    }

    fn conjunct(&self, tokens: &[Token<'_>], depth: usize) -> CanonicalResult<String> {
        if tokens.is_empty() {
            return Err(CanonicalError::EmptyPredicate {
                clause: self.clause,
            });
        }
        if let Some(inner) = enclosed(tokens) {
            return Ok(format!("({})", self.expression(inner, depth + 1)?));
        }
        if tokens[0].is_word("NOT")
            && let Some(inner) = enclosed(&tokens[1..])
        {
            return Ok(format!("NOT ({})", self.expression(inner, depth + 1)?));
        }
        Ok(render(tokens))
    }
}

/// Splits at depth-0 `AND`, except the one closing a `BETWEEN low AND high` range.
fn split_conjuncts<'t, 'a>(tokens: &'t [Token<'a>]) -> Vec<&'t [Token<'a>]> {
    let mut open_range = false;
    split_top_level(tokens, |t| {
        if t.is_word("BETWEEN") {
            open_range = true;
            false
        } else if t.is_word("AND") {
            !std::mem::take(&mut open_range)
        } else {
            false
        }
    })
}

/// Returns the inside of `tokens` when the whole slice is one parenthesized group.
fn enclosed<'t, 'a>(tokens: &'t [Token<'a>]) -> Option<&'t [Token<'a>]> {
    let last = tokens.len().checked_sub(1)?;
    if tokens[0].kind != TokenKind::LParen || tokens[last].kind != TokenKind::RParen {
        return None;
    }
    (matching_close(tokens, 0) == Some(last)).then(|| &tokens[1..last])
}
