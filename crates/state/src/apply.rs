//! Apply Engine (§4.10): executes a [`Plan`]'s actions in order against an
//! [`Adapter`], updating the [`StateStore`] after every single action so a
//! crash mid-run leaves state consistent with whatever actually happened
//! (§5 "Ordering guarantees"). Failures don't abort the run — later
//! actions still execute ("mark-and-continue", §4.10 step 3) — but they do
//! leave the resource's prior hash in place so the next `plan` retries it.

use crate::entry::StateEntry;
use crate::error::ApplyError;
use crate::plan::{Action, ActionKind, Plan};
use crate::store::StateStore;
use agentspec_ir::IRResource;
use chrono::Utc;
use std::time::{Duration, Instant};

/// External collaborator (§6.6): a deploy-target adapter. Implementations
/// live outside this crate (Docker/Kubernetes/Compose/process runners);
/// this trait is the contract the Apply Engine drives them through.
pub trait Adapter {
    fn name(&self) -> &str;

    /// Execute one plan action. `resource` is `None` for a `Delete`
    /// action, since the desired IR no longer carries that resource.
    fn apply(&self, action: &Action, resource: Option<&IRResource>) -> Result<(), AdapterError>;
}

#[derive(Debug, Clone)]
pub struct AdapterError(pub String);

impl std::fmt::Display for AdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for AdapterError {}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActionOutcome {
    pub fqn: String,
    pub kind: ActionKind,
    pub succeeded: bool,
    pub duration_ms: u128,
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ApplySummary {
    pub outcomes: Vec<ActionOutcome>,
}

impl ApplySummary {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded)
    }

    pub fn to_text(&self) -> String {
        let succeeded = self.outcomes.iter().filter(|o| o.succeeded).count();
        let failed = self.outcomes.len() - succeeded;
        let mut out = format!("{succeeded} succeeded, {failed} failed\n");
        for outcome in &self.outcomes {
            let mark = if outcome.succeeded { "ok" } else { "FAILED" };
            out.push_str(&format!("  [{mark}] {} ({}ms)", outcome.fqn, outcome.duration_ms));
            if let Some(err) = &outcome.error {
                out.push_str(&format!(" — {err}"));
            }
            out.push('\n');
        }
        out
    }
}

/// Run every action in `plan` against `adapter`, persisting `state` after
/// each one. `resources` resolves an action's FQN to the desired
/// [`IRResource`] it came from (absent for deletes).
pub fn apply<A: Adapter>(
    plan: &Plan,
    resources: &[IRResource],
    adapter: &A,
    state: &mut StateStore,
) -> Result<ApplySummary, ApplyError> {
    let mut outcomes = Vec::with_capacity(plan.actions.len());

    for action in &plan.actions {
        if action.kind == ActionKind::Noop {
            continue;
        }

        let resource = resources.iter().find(|r| r.fqn == action.fqn);
        let started = Instant::now();
        let result = adapter.apply(action, resource);
        let elapsed = started.elapsed();

        record_outcome(state, action, &result, elapsed, adapter.name())?;
        outcomes.push(ActionOutcome {
            fqn: action.fqn.clone(),
            kind: action.kind,
            succeeded: result.is_ok(),
            duration_ms: elapsed.as_millis(),
            error: result.err().map(|e| e.0),
        });
    }

    Ok(ApplySummary { outcomes })
}

fn record_outcome(
    state: &mut StateStore,
    action: &Action,
    result: &Result<(), AdapterError>,
    _elapsed: Duration,
    adapter_name: &str,
) -> Result<(), ApplyError> {
    match (action.kind, result) {
        (ActionKind::Delete, Ok(())) => {
            state.delete(&action.fqn);
        }
        (ActionKind::Delete, Err(e)) => {
            let prior = state.get(&action.fqn).cloned().unwrap_or_else(|| StateEntry::pending(String::new()));
            state.put(action.fqn.clone(), prior.failed(e.0.clone()));
        }
        (_, Ok(())) => {
            let hash = action.hash.clone().unwrap_or_default();
            state.put(action.fqn.clone(), StateEntry::applied(hash, adapter_name.to_string(), Utc::now()));
        }
        (_, Err(e)) => {
            // Keep the prior hash (or, for a first-time create, the
            // desired hash) so the next plan retries exactly this
            // resource instead of treating it as already satisfied.
            let prior_hash = state.get(&action.fqn).map(|e| e.hash.clone()).or_else(|| action.hash.clone()).unwrap_or_default();
            state.put(action.fqn.clone(), StateEntry::pending(prior_hash).failed(e.0.clone()));
        }
    }
    state.save().map_err(ApplyError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    struct FlakyAdapter {
        fail_once_for: RefCell<Option<String>>,
    }

    impl Adapter for FlakyAdapter {
        fn name(&self) -> &str {
            "test-adapter"
        }

        fn apply(&self, action: &Action, _resource: Option<&IRResource>) -> Result<(), AdapterError> {
            let mut fail_once = self.fail_once_for.borrow_mut();
            if fail_once.as_deref() == Some(action.fqn.as_str()) {
                *fail_once = None;
                return Err(AdapterError("simulated adapter failure".into()));
            }
            Ok(())
        }
    }

    fn resource(fqn: &str) -> IRResource {
        let mut parts = fqn.split('/');
        let _pkg = parts.next().unwrap();
        let kind = parts.next().unwrap();
        let name = parts.next().unwrap();
        IRResource { kind: kind.into(), name: name.into(), fqn: fqn.into(), attributes: BTreeMap::new(), references: vec![], hash: "sha256:aa".into() }
    }

    #[test]
    fn partial_failure_marks_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        let resources = vec![resource("demo/Prompt/greet"), resource("demo/Skill/search")];
        let plan = Plan {
            input_hash: "sha256:zz".into(),
            actions: vec![
                Action { kind: ActionKind::Create, fqn: "demo/Prompt/greet".into(), resource_kind: "Prompt".into(), name: "greet".into(), hash: Some("sha256:aa".into()) },
                Action { kind: ActionKind::Create, fqn: "demo/Skill/search".into(), resource_kind: "Skill".into(), name: "search".into(), hash: Some("sha256:aa".into()) },
            ],
        };
        let adapter = FlakyAdapter { fail_once_for: RefCell::new(Some("demo/Skill/search".into())) };

        let summary = apply(&plan, &resources, &adapter, &mut state).unwrap();
        assert!(!summary.all_succeeded());
        assert_eq!(state.get("demo/Prompt/greet").unwrap().status, crate::entry::ResourceStatus::Applied);
        assert_eq!(state.get("demo/Skill/search").unwrap().status, crate::entry::ResourceStatus::Failed);

        // Re-run: only the failed resource is retried and now succeeds.
        let plan2 = Plan {
            input_hash: "sha256:zz".into(),
            actions: vec![Action {
                kind: ActionKind::Create,
                fqn: "demo/Skill/search".into(),
                resource_kind: "Skill".into(),
                name: "search".into(),
                hash: Some("sha256:aa".into()),
            }],
        };
        let summary2 = apply(&plan2, &resources, &adapter, &mut state).unwrap();
        assert!(summary2.all_succeeded());
        assert_eq!(state.get("demo/Skill/search").unwrap().status, crate::entry::ResourceStatus::Applied);
    }

    #[test]
    fn successful_delete_removes_state_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        state.put("demo/Prompt/old".into(), StateEntry::applied("sha256:aa".into(), "local".into(), Utc::now()));
        let plan = Plan {
            input_hash: "sha256:zz".into(),
            actions: vec![Action { kind: ActionKind::Delete, fqn: "demo/Prompt/old".into(), resource_kind: "Prompt".into(), name: "old".into(), hash: None }],
        };
        let adapter = FlakyAdapter { fail_once_for: RefCell::new(None) };

        apply(&plan, &[], &adapter, &mut state).unwrap();
        assert!(state.get("demo/Prompt/old").is_none());
    }

    #[test]
    fn noop_actions_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        let plan = Plan {
            input_hash: "sha256:zz".into(),
            actions: vec![Action { kind: ActionKind::Noop, fqn: "demo/Prompt/greet".into(), resource_kind: "Prompt".into(), name: "greet".into(), hash: Some("sha256:aa".into()) }],
        };
        let adapter = FlakyAdapter { fail_once_for: RefCell::new(None) };

        let summary = apply(&plan, &[], &adapter, &mut state).unwrap();
        assert!(summary.outcomes.is_empty());
    }
}
