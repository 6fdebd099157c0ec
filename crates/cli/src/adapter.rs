//! The only deploy-target adapter this crate ships: `process`, a minimal
//! local adapter good enough to drive `apply`/`diff` end to end without a
//! container runtime. Docker/Kubernetes/Compose adapters are named in
//! spec.md §1 as external collaborators and are not implemented here; see
//! DESIGN.md.

use agentspec_ir::IRResource;
use agentspec_state::{Action, Adapter, AdapterError};
use tracing::info;

pub struct ProcessAdapter;

impl Adapter for ProcessAdapter {
    fn name(&self) -> &str {
        "process"
    }

    fn apply(&self, action: &Action, resource: Option<&IRResource>) -> Result<(), AdapterError> {
        info!(fqn = %action.fqn, kind = ?action.kind, "process adapter applying action");
        match resource {
            Some(r) if r.kind == "Agent" || r.kind == "Pipeline" => Ok(()),
            Some(_) => Ok(()),
            None => Ok(()), // delete: nothing local to tear down for a resource already gone
        }
    }
}

/// Resolve a binding's `target` string to the adapter that drives it.
/// `process` is the only target this crate implements; anything else is a
/// usage error pointing at the out-of-scope adapters named in spec.md §1.
pub fn adapter_for(target: &str) -> anyhow::Result<ProcessAdapter> {
    match target {
        "process" => Ok(ProcessAdapter),
        other => anyhow::bail!(
            "no built-in adapter for target \"{other}\" — only \"process\" ships with this tool; \
             Docker/Kubernetes/Compose adapters are external collaborators (spec §6.6)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentspec_state::ActionKind;

    #[test]
    fn process_adapter_always_succeeds() {
        let adapter = ProcessAdapter;
        let action = Action { kind: ActionKind::Create, fqn: "demo/Agent/bot".into(), resource_kind: "Agent".into(), name: "bot".into(), hash: Some("sha256:aa".into()) };
        assert!(adapter.apply(&action, None).is_ok());
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(adapter_for("kubernetes").is_err());
    }

    #[test]
    fn process_target_resolves() {
        assert!(adapter_for("process").is_ok());
    }
}
