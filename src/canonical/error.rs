use thiserror::Error;

/// Errors returned when query text cannot be split into clause zones.
///
/// Every variant is a "malformed query": the caller gets it back immediately and
/// nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanonicalError {
    /// Input was empty or whitespace only.
    #[error("query text is empty")]
    Empty,

    /// A quoted literal was opened but never closed.
    #[error("unterminated literal starting at byte {position}")]
    UnterminatedLiteral {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A closing parenthesis had no matching opener.
    #[error("unexpected ')' at byte {position}")]
    UnbalancedParenthesis {
        /// Byte offset of the stray `)`.
        position: usize,
    },

    /// An opening parenthesis was never closed.
    #[error("unclosed '(' at byte {position}")]
    UnclosedParenthesis {
        /// Byte offset of the unmatched `(`.
        position: usize,
    },

    /// The first token was not `SELECT`.
    #[error("query must begin with SELECT")]
    MissingSelect,

    /// No top-level `FROM` clause was found.
    #[error("query has no FROM clause")]
    MissingFrom,

    /// A clause keyword was followed by nothing.
    #[error("{clause} clause is empty")]
    EmptyClause { clause: &'static str },

    /// A clause keyword appeared twice at the same nesting level.
    #[error("{clause} clause appears more than once")]
    DuplicateClause { clause: &'static str },

    /// A list clause contained an empty item (e.g. `SELECT Id,, Name`).
    #[error("{clause} clause has an empty list item")]
    EmptyListItem { clause: &'static str },

    /// A boolean connective had nothing on one side.
    #[error("{clause} clause has an empty predicate")]
    EmptyPredicate { clause: &'static str },

    /// A `TYPEOF` selection block has no matching `END`.
    #[error("TYPEOF block has no matching END")]
    UnclosedTypeof,

    /// Sub-selects or predicate groups nest deeper than the configured limit.
    #[error("nesting exceeds the maximum depth of {limit}")]
    NestingTooDeep { limit: usize },
}

/// Convenience result type for canonicalization.
pub type CanonicalResult<T> = Result<T, CanonicalError>;
