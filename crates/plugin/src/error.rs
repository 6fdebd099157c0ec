//! `PluginError` (§7): timeout, memory exceeded, contract violation,
//! duplicate custom-kind declaration, unordered hook collision.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("validator \"{name}\" exceeded {timeout_secs}s timeout")]
    Timeout { name: String, timeout_secs: u64 },

    #[error("plugin \"{name}\" exceeded its {pages}-page memory cap")]
    MemoryExceeded { name: String, pages: u32 },

    #[error("plugin \"{name}\" violated its contract: {message}")]
    ContractViolation { name: String, message: String },

    #[error("plugins \"{first}\" and \"{second}\" both declare custom resource kind \"{kind}\"")]
    DuplicateResourceKind { first: String, second: String, kind: String },

    #[error("plugins {names:?} all register a \"{stage}\" hook with no declared ordering")]
    UnorderedHooks { stage: String, names: Vec<String> },

    #[error("failed to load plugin module at {path}: {message}")]
    Load { path: String, message: String },

    #[error("plugin \"{name}\" runtime trap: {message}")]
    Trap { name: String, message: String },
}
