//! Lowering error taxonomy (§7 `LowerError`). Lowering runs after §4.5
//! semantic validation, so most of these are defense-in-depth rather than
//! expected user-facing paths — except `OverlayConflict`, which is only
//! detectable once an environment is actually selected.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum LowerError {
    #[error("duplicate fqn \"{fqn}\" across imported packages")]
    DuplicateFqn { fqn: String },

    #[error("environment \"{environment}\" overlay conflict on {fqn}.{attribute}: \"{first}\" vs \"{second}\"")]
    OverlayConflict { environment: String, fqn: String, attribute: String, first: String, second: String },

    #[error("environment \"{0}\" not found")]
    UnknownEnvironment(String),

    #[error("unresolved reference \"{0}\" survived semantic validation")]
    UnresolvedReference(String),

    #[error("invalid expression in {fqn}: {message}")]
    Expression { fqn: String, message: String },
}
