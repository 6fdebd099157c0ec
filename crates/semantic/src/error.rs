//! Semantic-layer error taxonomy (§7): `ReferenceError`, `DuplicateError`,
//! `SecretLiteralError`, `PolicyViolation`, `ImportError`. Every variant
//! matches the `{file:line:col, kind, message, fix_hint?}` diagnostic shape
//! the compiler front-end renders in `agentspec-lang::error`.

use agentspec_lang::ast::Span;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Error)]
pub enum SemanticError {
    #[error("{message}")]
    Reference { message: String, span: Option<Span>, suggestion: Option<String> },

    #[error("{message}")]
    Duplicate { message: String, first_span: Option<Span>, second_span: Option<Span> },

    #[error("{message}")]
    SecretLiteral { message: String, span: Option<Span> },

    #[error("{message}")]
    Policy {
        message: String,
        policy_name: String,
        rule_action: String,
        subject: String,
        span: Option<Span>,
        warn_only: bool,
    },

    #[error("{message}")]
    Import { message: String, chain: Vec<String> },
}

impl SemanticError {
    pub fn code(&self) -> &'static str {
        match self {
            SemanticError::Reference { .. } => "ReferenceError",
            SemanticError::Duplicate { .. } => "DuplicateError",
            SemanticError::SecretLiteral { .. } => "SecretLiteralError",
            SemanticError::Policy { .. } => "PolicyViolation",
            SemanticError::Import { .. } => "ImportError",
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            SemanticError::Reference { suggestion, .. } => {
                suggestion.as_ref().map(|s| format!("did you mean \"{s}\"?"))
            }
            SemanticError::SecretLiteral { .. } => Some("use a `secret` resource instead".to_string()),
            _ => None,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, SemanticError::Policy { warn_only: true, .. })
    }
}
