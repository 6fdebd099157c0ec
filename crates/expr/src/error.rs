//! `ExpressionError` (§7): compile-time syntax/type errors for the guard
//! expression sublanguage. Runtime evaluation never errors — missing
//! properties resolve to [`crate::Value::Missing`] instead (§4.11).

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct ExpressionError {
    pub message: String,
    pub span: Option<std::ops::Range<usize>>,
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExpressionError {}
