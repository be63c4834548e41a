//! Literal escaping for bound parameter values.

/// Escapes `value` for use inside a single-quoted literal.
///
/// Quote characters and backslashes are backslash-escaped so the value can never close
/// its literal; control characters that would break the literal are written as escapes.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps `value` in single quotes after escaping it.
#[inline]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}
