//! # agentspec-state
//!
//! The desired-state engine's persistence and execution layer: C13 State
//! Store (§4.13), C9 Plan Engine (§4.9), C10 Apply Engine (§4.10).
//!
//! [`StateStore`] owns `.agentspec.state.json`; [`plan::plan`] diffs a
//! desired [`agentspec_ir::IRDocument`] against it into an ordered
//! [`plan::Plan`]; [`apply::apply`] drives that plan through a caller's
//! [`apply::Adapter`] implementation, persisting the store after every
//! single action so a crash mid-run leaves it consistent with whatever
//! actually happened.

pub mod apply;
pub mod entry;
pub mod error;
pub mod lock;
pub mod plan;
pub mod store;

pub use apply::{apply, Adapter, AdapterError, ApplySummary};
pub use entry::{ResourceStatus, StateEntry, StateFile, STATE_VERSION};
pub use error::{ApplyError, PlanError, StateError};
pub use lock::StateLock;
pub use plan::{plan, select_binding, verify_plan_freshness, Action, ActionKind, Plan};
pub use store::StateStore;
