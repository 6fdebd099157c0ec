//! `StateError`, `PlanError`, `ApplyError` (§7): corrupted/locked state,
//! IR/state mismatch, and per-resource apply failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file {path} is corrupted: {message} — delete it or restore from version control, then re-run `plan` to rebuild")]
    Corrupt { path: String, message: String },

    #[error("state file {path} has version {found}, expected {expected} — run `migrate` or delete the file to start fresh")]
    VersionMismatch { path: String, found: String, expected: String },

    #[error("could not acquire lock on {path}: {message}")]
    Locked { path: String, message: String },

    #[error("io error on state file {path}: {message}")]
    Io { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("binding \"{target}\" not found among: {available:?}")]
    UnknownBinding { target: String, available: Vec<String> },

    #[error("no default binding declared; pass --target and pick one of: {available:?}")]
    NoDefaultBinding { available: Vec<String> },

    #[error("plan file was computed against input hash {expected}, current IR hashes to {actual}")]
    StaleInputHash { expected: String, actual: String },

    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("adapter \"{adapter}\" failed on {fqn}: {message}")]
    Adapter { adapter: String, fqn: String, message: String },

    #[error(transparent)]
    State(#[from] StateError),
}
