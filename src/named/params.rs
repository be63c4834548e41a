use serde::{Deserialize, Serialize};

use super::sanitize::quote_literal;

/// A value bound to a named-query parameter.
///
/// Deserializes from plain JSON values. Lists render as a parenthesized, comma-separated
/// sequence suitable for `IN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Query-text form of the value. Strings are quoted and escaped.
    pub fn render(&self) -> String {
        match self {
            ParamValue::Null => "NULL".to_string(),
            ParamValue::Bool(true) => "TRUE".to_string(),
            ParamValue::Bool(false) => "FALSE".to_string(),
            ParamValue::Int(value) => value.to_string(),
            ParamValue::Float(value) if value.is_finite() => value.to_string(),
            ParamValue::Float(_) => "NULL".to_string(),
            ParamValue::String(value) => quote_literal(value),
            ParamValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(ParamValue::render).collect();
                format!("({})", rendered.join(", "))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Null, Into::into)
    }
}
