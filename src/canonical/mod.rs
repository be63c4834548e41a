//! Query canonicalization: raw query text → deterministic canonical key.
//!
//! Two inputs that differ only in whitespace, keyword case, operator spacing,
//! selection-field order or conjunct order produce the same [`CanonicalKey`].
//!
//! A cheap prescan picks one of two paths:
//!
//! - **Direct**: no sub-selects. One lexing pass, then clause zones are rendered.
//! - **Structural**: each parenthesized sub-select is canonicalized recursively from
//!   its own source slice and spliced back as a single token before the parent is
//!   rendered. Cost grows with nesting depth because sub-select bodies are re-lexed.

pub mod error;
mod filter;
pub(crate) mod lexer;
mod render;
mod zones;


pub use error::{CanonicalError, CanonicalResult};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::constants::DEFAULT_MAX_NESTING_DEPTH;
use crate::hashing::hash_canonical;

use filter::PredicateNormalizer;
use lexer::{Token, TokenKind, matching_close, skip_literal, tokenize};
use render::{canonical_cmp, render, split_top_level};
use zones::{Clause, ClauseZones};

/// Deterministic canonical form of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Returns the canonical query text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the canonical text.
    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the 32-byte BLAKE3 digest of the canonical text.
    #[inline]
    pub fn digest(&self) -> [u8; 32] {
        hash_canonical(&self.0)
    }
}

impl std::fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Which normalization path a query took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPath {
    Direct,
    Structural,
}

impl NormalizationPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizationPath::Direct => "direct",
            NormalizationPath::Structural => "structural",
        }
    }
}

impl std::fmt::Display for NormalizationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the normalization path without tokenizing.
///
/// Returns [`NormalizationPath::Structural`] when a `(` outside quoted literals is
/// followed (after whitespace) by the word `SELECT`.
pub fn prescan(text: &str) -> NormalizationPath {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => match skip_literal(bytes, i) {
                Ok(end) => i = end,
                // Unterminated literal: let the lexer report it.
                Err(_) => return NormalizationPath::Direct,
            },
            b'(' => {
                let mut j = i + 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if starts_with_select(&bytes[j..]) {
                    return NormalizationPath::Structural;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    NormalizationPath::Direct
}

fn starts_with_select(rest: &[u8]) -> bool {
    const SELECT: &[u8] = b"select";
    rest.len() >= SELECT.len()
        && rest[..SELECT.len()].eq_ignore_ascii_case(SELECT)
        && rest
            .get(SELECT.len())
            .is_none_or(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
}

/// Query normalizer.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    max_depth: usize,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer with the default nesting limit.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_NESTING_DEPTH)
    }

    /// Creates a canonicalizer that rejects nesting deeper than `max_depth`.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Normalizes `text` into its canonical key.
    pub fn normalize(&self, text: &str) -> CanonicalResult<CanonicalKey> {
        self.normalize_with_path(text).map(|(key, _)| key)
    }

    /// Normalizes `text` and reports which path was taken.
    #[instrument(level = "debug", skip(self, text), fields(query_len = text.len()))]
    pub fn normalize_with_path(
        &self,
        text: &str,
    ) -> CanonicalResult<(CanonicalKey, NormalizationPath)> {
        let path = prescan(text);
        let canonical = self.normalize_at_depth(text, path, 0)?;
        debug!(path = %path, canonical_len = canonical.len(), "Query normalized");
        Ok((CanonicalKey(canonical), path))
    }

    fn normalize_at_depth(
        &self,
        text: &str,
        path: NormalizationPath,
        depth: usize,
    ) -> CanonicalResult<String> {
        if depth > self.max_depth {
            return Err(CanonicalError::NestingTooDeep {
                limit: self.max_depth,
            });
        }

        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(CanonicalError::Empty);
        }

        match path {
            NormalizationPath::Direct => self.assemble(&tokens),
            NormalizationPath::Structural => {
                let folded = self.fold_sub_selects(text, tokens, depth)?;
                self.assemble(&folded)
            }
        }
    }

    /// Replaces every `( SELECT … )` group with one token holding its canonical form.
    fn fold_sub_selects<'a>(
        &self,
        text: &'a str,
        tokens: Vec<Token<'a>>,
        depth: usize,
    ) -> CanonicalResult<Vec<Token<'a>>> {
        let mut folded = Vec::with_capacity(tokens.len());
        let mut idx = 0;
        while idx < tokens.len() {
            let opens_sub_select = tokens[idx].kind == TokenKind::LParen
                && tokens.get(idx + 1).is_some_and(|t| t.is_word("SELECT"));
            if !opens_sub_select {
                folded.push(tokens[idx].clone());
                idx += 1;
                continue;
            }

            let close = matching_close(&tokens, idx).ok_or(CanonicalError::UnclosedParenthesis {
                position: tokens[idx].span.start,
            })?;
            let body = &text[tokens[idx].span.end..tokens[close].span.start];
            let inner_path = prescan(body);
            let canonical = self.normalize_at_depth(body, inner_path, depth + 1)?;
            folded.push(Token::sub_select(
                format!("({canonical})"),
                tokens[idx].span.start..tokens[close].span.end,
            ));
            idx = close + 1;
        }
        Ok(folded)
    }

    fn assemble(&self, tokens: &[Token<'_>]) -> CanonicalResult<String> {
        let zones = ClauseZones::split(tokens)?;
        let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len() + 1).sum());

        for clause in Clause::ALL {
            let Some(body) = zones.get(clause) else {
                continue;
            };
            let rendered = match clause {
                Clause::Select => select_list(body)?,
                Clause::Where | Clause::Having => PredicateNormalizer {
                    clause: clause.keyword(),
                    max_depth: self.max_depth,
                }
                .normalize(body)?,
                _ => render(body),
            };
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(clause.keyword());
            out.push(' ');
            out.push_str(&rendered);
        }

        Ok(out)
    }
}

/// Sorted, comma-joined selection fields.
///
/// A `TYPEOF … END` block is one field; its inner commas and branch order are kept.
fn select_list(tokens: &[Token<'_>]) -> CanonicalResult<String> {
    let mut open_blocks = 0usize;
    let parts = split_top_level(tokens, |t| {
        if t.is_word("TYPEOF") {
            open_blocks += 1;
            false
        } else if open_blocks > 0 && t.is_word("END") {
            open_blocks -= 1;
            false
        } else {
            open_blocks == 0 && t.kind == TokenKind::Comma
        }
    });
    if open_blocks > 0 {
        return Err(CanonicalError::UnclosedTypeof);
    }

    let mut fields = Vec::with_capacity(parts.len());
    for field in parts {
        if field.is_empty() {
            return Err(CanonicalError::EmptyListItem {
                clause: Clause::Select.keyword(),
            });
        }
        fields.push(render(field));
    }
    fields.sort_by(|a, b| canonical_cmp(a, b));
    Ok(fields.join(", "))
}

/// Normalizes `text` with a default [`Canonicalizer`].
pub fn normalize(text: &str) -> CanonicalResult<CanonicalKey> {
    Canonicalizer::new().normalize(text)
}
