//! The persisted shape of `.agentspec.state.json` (§4.13, §6.3): one
//! [`StateEntry`] per resource FQN, tracking the state machine transitions
//! `(absent) -> pending -> applied | failed -> pending -> ...`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATE_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateFile {
    pub version: String,
    pub entries: BTreeMap<String, StateEntry>,
}

impl StateFile {
    pub fn new() -> Self {
        Self { version: STATE_VERSION.to_string(), entries: BTreeMap::new() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Pending,
    Applied,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    pub hash: String,
    pub status: ResourceStatus,
    pub last_applied: Option<DateTime<Utc>>,
    pub adapter: Option<String>,
    pub error: Option<String>,
}

impl StateEntry {
    pub fn pending(hash: String) -> Self {
        Self { hash, status: ResourceStatus::Pending, last_applied: None, adapter: None, error: None }
    }

    pub fn applied(hash: String, adapter: String, at: DateTime<Utc>) -> Self {
        Self { hash, status: ResourceStatus::Applied, last_applied: Some(at), adapter: Some(adapter), error: None }
    }

    pub fn failed(self, message: String) -> Self {
        // Keep the prior hash so a re-run's plan still treats this resource
        // as needing the same action rather than silently marking it clean.
        Self { status: ResourceStatus::Failed, error: Some(message), ..self }
    }
}
