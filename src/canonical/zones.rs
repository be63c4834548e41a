//! Clause-zone detection at nesting depth zero.

use super::error::{CanonicalError, CanonicalResult};
use super::lexer::{Token, TokenKind};

/// Clause zones in canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum Clause {
    Select,
    From,
    Where,
    With,
    GroupBy,
    Having,
    OrderBy,
    Limit,
    Offset,
    For,
}

impl Clause {
    pub(crate) const ALL: [Clause; 10] = [
        Clause::Select,
        Clause::From,
        Clause::Where,
        Clause::With,
        Clause::GroupBy,
        Clause::Having,
        Clause::OrderBy,
        Clause::Limit,
        Clause::Offset,
        Clause::For,
    ];

    pub(crate) fn keyword(self) -> &'static str {
        match self {
            Clause::Select => "SELECT",
            Clause::From => "FROM",
            Clause::Where => "WHERE",
            Clause::With => "WITH",
            Clause::GroupBy => "GROUP BY",
            Clause::Having => "HAVING",
            Clause::OrderBy => "ORDER BY",
            Clause::Limit => "LIMIT",
            Clause::Offset => "OFFSET",
            Clause::For => "FOR",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    /// Recognizes a clause keyword at `tokens[idx]`, returning it and its token width.
    fn detect(tokens: &[Token<'_>], idx: usize) -> Option<(Clause, usize)> {
        let tok = &tokens[idx];
        if tok.kind != TokenKind::Word {
            return None;
        }
        let followed_by_by = tokens.get(idx + 1).is_some_and(|t| t.is_word("BY"));
        let single = [
            ("SELECT", Clause::Select),
            ("FROM", Clause::From),
            ("WHERE", Clause::Where),
            ("WITH", Clause::With),
            ("HAVING", Clause::Having),
            ("LIMIT", Clause::Limit),
            ("OFFSET", Clause::Offset),
            ("FOR", Clause::For),
        ];
        if let Some((_, clause)) = single.iter().find(|(kw, _)| tok.is_word(kw)) {
            return Some((*clause, 1));
        }
        if followed_by_by && tok.is_word("GROUP") {
            return Some((Clause::GroupBy, 2));
        }
        if followed_by_by && tok.is_word("ORDER") {
            return Some((Clause::OrderBy, 2));
        }
        None
    }
}

/// Token slices for each clause present in a query.
#[derive(Debug)]
pub(crate) struct ClauseZones<'t, 'a> {
    zones: [Option<&'t [Token<'a>]>; 10],
}

impl<'t, 'a> ClauseZones<'t, 'a> {
    pub(crate) fn get(&self, clause: Clause) -> Option<&'t [Token<'a>]> {
        self.zones[clause.index()]
    }

    /// Splits a full query into zones.
    ///
    /// The query must open with `SELECT` and contain `FROM`; every present zone must be
    /// non-empty and appear once.
    pub(crate) fn split(tokens: &'t [Token<'a>]) -> CanonicalResult<Self> {
        if tokens.is_empty() {
            return Err(CanonicalError::Empty);
        }

        let mut marks: Vec<(Clause, usize, usize)> = Vec::with_capacity(4);
        let mut depth = 0usize;
        let mut idx = 0;
        while idx < tokens.len() {
            match tokens[idx].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                TokenKind::Word if depth == 0 => {
                    if let Some((clause, width)) = Clause::detect(tokens, idx) {
                        marks.push((clause, idx, idx + width));
                        idx += width;
                        continue;
                    }
                }
                _ => {}
            }
            idx += 1;
        }

        match marks.first() {
            Some((Clause::Select, 0, _)) => {}
            _ => return Err(CanonicalError::MissingSelect),
        }

        let mut zones: [Option<&'t [Token<'a>]>; 10] = [None; 10];
        for (n, &(clause, _, body_start)) in marks.iter().enumerate() {
            let body_end = marks.get(n + 1).map_or(tokens.len(), |m| m.1);
            let body = &tokens[body_start..body_end];
            if body.is_empty() {
                return Err(CanonicalError::EmptyClause {
                    clause: clause.keyword(),
                });
            }
            let slot = &mut zones[clause.index()];
            if slot.is_some() {
                return Err(CanonicalError::DuplicateClause {
                    clause: clause.keyword(),
                });
            }
            *slot = Some(body);
        }

        if zones[Clause::From.index()].is_none() {
            return Err(CanonicalError::MissingFrom);
        }

        Ok(Self { zones })
    }
}
