//! `:name` placeholder scanning and substitution.
//!
//! Placeholders are recognized only outside quoted literals. `::` and a colon glued to
//! a preceding identifier are left alone.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::canonical::CanonicalResult;
use crate::canonical::lexer::skip_literal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Placeholder<'a> {
    pub name: &'a str,
    /// Byte range including the leading colon.
    pub span: Range<usize>,
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Finds every placeholder in `template`, in order of appearance.
pub(crate) fn placeholders(template: &str) -> CanonicalResult<Vec<Placeholder<'_>>> {
    let bytes = template.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' | b'"' => i = skip_literal(bytes, i)?,
            b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
            b':' if (i == 0 || !is_ident_byte(bytes[i - 1]))
                && bytes.get(i + 1).is_some_and(|b| is_ident_start(*b)) =>
            {
                let start = i;
                let mut end = i + 1;
                while end < bytes.len() && is_ident_byte(bytes[end]) {
                    end += 1;
                }
                found.push(Placeholder {
                    name: &template[start + 1..end],
                    span: start..end,
                });
                i = end;
            }
            _ => i += 1,
        }
    }

    Ok(found)
}

/// Replaces each placeholder with its rendered value.
///
/// Every placeholder name must be present in `values`; callers check this first.
pub(crate) fn substitute(
    template: &str,
    placeholders: &[Placeholder<'_>],
    values: &BTreeMap<String, String>,
) -> String {
    let mut out = String::with_capacity(template.len() + 16 * placeholders.len());
    let mut cursor = 0;
    for placeholder in placeholders {
        out.push_str(&template[cursor..placeholder.span.start]);
        match values.get(placeholder.name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&template[placeholder.span.clone()]),
        }
        cursor = placeholder.span.end;
    }
    out.push_str(&template[cursor..]);
    out
}
