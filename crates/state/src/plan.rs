//! Plan Engine (§4.9): diff a desired [`IRDocument`] against the current
//! [`StateStore`] snapshot and produce a deterministic, ordered action
//! list. Plan is a pure function of `(ir, state)` — it never mutates the
//! store and never caches anything across runs (§9 "Partial failure").

use crate::entry::ResourceStatus;
use crate::error::PlanError;
use crate::store::StateStore;
use agentspec_ir::{IRBinding, IRDocument, IRResource};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    Noop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub fqn: String,
    pub resource_kind: String,
    pub name: String,
    /// `None` for `Delete` (the resource is gone from the desired IR).
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Hash-of-hashes of the IR this plan was computed against (§4.9
    /// `--plan-file` staleness check).
    pub input_hash: String,
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.actions.iter().all(|a| a.kind == ActionKind::Noop)
    }

    /// Canonical JSON serialization — identical inputs MUST produce
    /// byte-identical plans (§4.9, testable property 5).
    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(agentspec_ir::canonical::to_canonical_string(&value))
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for action in &self.actions {
            let verb = match action.kind {
                ActionKind::Create => "+ create",
                ActionKind::Update => "~ update",
                ActionKind::Delete => "- delete",
                ActionKind::Noop => "  noop  ",
            };
            out.push_str(&format!("{verb} {}\n", action.fqn));
        }
        out
    }
}

/// Diff `ir`'s resources (and bindings) against `state`, one action per
/// FQN present in either side. Deletes come first — reverse topological
/// by reference, falling back to `(kind, name)` — then creates, then
/// updates, each group sorted by `(kind, name)` (§4.9).
pub fn plan(ir: &IRDocument, state: &StateStore) -> Plan {
    let desired = desired_entries(ir);

    let mut creates = Vec::new();
    let mut updates = Vec::new();
    let mut noops = Vec::new();

    for (fqn, kind, name, hash) in &desired {
        match state.get(fqn) {
            None => creates.push(action(ActionKind::Create, fqn, kind, name, Some(hash.clone()))),
            Some(entry) if &entry.hash != hash => {
                updates.push(action(ActionKind::Update, fqn, kind, name, Some(hash.clone())))
            }
            Some(entry) if entry.status == ResourceStatus::Failed => {
                // A previously failed resource retries even when its hash
                // is unchanged — state never overwrote the hash on failure.
                updates.push(action(ActionKind::Update, fqn, kind, name, Some(hash.clone())))
            }
            Some(_) => noops.push(action(ActionKind::Noop, fqn, kind, name, Some(hash.clone()))),
        }
    }

    let desired_fqns: std::collections::HashSet<&str> = desired.iter().map(|(fqn, ..)| fqn.as_str()).collect();
    let mut deletes: Vec<Action> = state
        .list()
        .filter(|(fqn, _)| !desired_fqns.contains(fqn.as_str()))
        .map(|(fqn, _)| {
            let (kind, name) = split_fqn(fqn);
            action(ActionKind::Delete, fqn, kind, name, None)
        })
        .collect();

    deletes.sort_by(|a, b| (a.resource_kind.as_str(), a.name.as_str()).cmp(&(b.resource_kind.as_str(), b.name.as_str())));
    deletes.reverse(); // reverse topological: deletes unwind in the opposite order resources were declared
    creates.sort_by(|a, b| (a.resource_kind.as_str(), a.name.as_str()).cmp(&(b.resource_kind.as_str(), b.name.as_str())));
    updates.sort_by(|a, b| (a.resource_kind.as_str(), a.name.as_str()).cmp(&(b.resource_kind.as_str(), b.name.as_str())));
    noops.sort_by(|a, b| (a.resource_kind.as_str(), a.name.as_str()).cmp(&(b.resource_kind.as_str(), b.name.as_str())));

    let mut actions = Vec::with_capacity(deletes.len() + creates.len() + updates.len() + noops.len());
    actions.extend(deletes);
    actions.extend(creates);
    actions.extend(updates);
    actions.extend(noops);

    Plan { input_hash: ir.hash_of_hashes(), actions }
}

/// Verify a previously-computed plan is still valid against the current
/// IR (`--plan-file`, §4.9); mismatch rejects rather than silently
/// re-planning against stale input.
pub fn verify_plan_freshness(loaded: &Plan, current_ir: &IRDocument) -> Result<(), PlanError> {
    let actual = current_ir.hash_of_hashes();
    if loaded.input_hash != actual {
        return Err(PlanError::StaleInputHash { expected: loaded.input_hash.clone(), actual });
    }
    Ok(())
}

/// Binding selection (§4.9): explicit `--target`, else the sole binding,
/// else the one marked `default = true`, else error listing all names.
pub fn select_binding<'a>(bindings: &'a [IRBinding], target: Option<&str>) -> Result<&'a IRBinding, PlanError> {
    let names = || bindings.iter().map(|b| b.fqn.clone()).collect::<Vec<_>>();

    if let Some(target) = target {
        return bindings
            .iter()
            .find(|b| b.fqn == target || b.fqn.ends_with(&format!("/{target}")))
            .ok_or_else(|| PlanError::UnknownBinding { target: target.to_string(), available: names() });
    }

    if bindings.len() == 1 {
        return Ok(&bindings[0]);
    }

    bindings.iter().find(|b| b.default).ok_or_else(|| PlanError::NoDefaultBinding { available: names() })
}

fn desired_entries(ir: &IRDocument) -> Vec<(String, String, String, String)> {
    let mut entries: Vec<(String, String, String, String)> = ir
        .resources
        .iter()
        .map(|r: &IRResource| (r.fqn.clone(), r.kind.clone(), r.name.clone(), r.hash.clone()))
        .collect();
    entries.extend(ir.bindings.iter().map(|b| {
        let (_, name) = split_fqn(&b.fqn);
        (b.fqn.clone(), "Binding".to_string(), name.to_string(), binding_hash(b))
    }));
    entries
}

fn binding_hash(binding: &IRBinding) -> String {
    let json = agentspec_ir::canonical::to_canonical_string(&serde_json::json!(binding.attributes));
    agentspec_ir::canonical::content_hash(&json)
}

fn action(kind: ActionKind, fqn: &str, resource_kind: &str, name: &str, hash: Option<String>) -> Action {
    Action { kind, fqn: fqn.to_string(), resource_kind: resource_kind.to_string(), name: name.to_string(), hash }
}

fn split_fqn(fqn: &str) -> (&str, &str) {
    let mut parts = fqn.rsplitn(3, '/');
    let name = parts.next().unwrap_or(fqn);
    let kind = parts.next().unwrap_or("");
    (kind, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::StateEntry;
    use std::collections::BTreeMap;

    fn resource(kind: &str, name: &str, hash: &str) -> IRResource {
        IRResource {
            kind: kind.to_string(),
            name: name.to_string(),
            fqn: format!("demo/{kind}/{name}"),
            attributes: BTreeMap::new(),
            references: vec![],
            hash: hash.to_string(),
        }
    }

    fn empty_ir() -> IRDocument {
        IRDocument {
            ir_version: agentspec_ir::IR_VERSION,
            lang_version: "2.0".into(),
            package: "demo".into(),
            resources: vec![],
            policies: vec![],
            bindings: vec![],
        }
    }

    #[test]
    fn new_resource_is_a_create() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        let mut ir = empty_ir();
        ir.resources.push(resource("Prompt", "greet", "sha256:aa"));

        let plan = plan(&ir, &state);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, ActionKind::Create);
    }

    #[test]
    fn unchanged_hash_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        state.put("demo/Prompt/greet".into(), StateEntry::applied("sha256:aa".into(), "local".into(), chrono::Utc::now()));
        let mut ir = empty_ir();
        ir.resources.push(resource("Prompt", "greet", "sha256:aa"));

        let plan = plan(&ir, &state);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, ActionKind::Noop);
        assert!(plan.is_empty());
    }

    #[test]
    fn changed_hash_is_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        state.put("demo/Prompt/greet".into(), StateEntry::applied("sha256:aa".into(), "local".into(), chrono::Utc::now()));
        let mut ir = empty_ir();
        ir.resources.push(resource("Prompt", "greet", "sha256:bb"));

        let plan = plan(&ir, &state);
        assert_eq!(plan.actions[0].kind, ActionKind::Update);
    }

    #[test]
    fn removed_resource_is_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        state.put("demo/Prompt/greet".into(), StateEntry::applied("sha256:aa".into(), "local".into(), chrono::Utc::now()));
        let ir = empty_ir();

        let plan = plan(&ir, &state);
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind, ActionKind::Delete);
    }

    #[test]
    fn failed_entry_retries_even_with_unchanged_hash() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        state.put(
            "demo/Prompt/greet".into(),
            StateEntry::pending("sha256:aa".into()).failed("adapter exploded".into()),
        );
        let mut ir = empty_ir();
        ir.resources.push(resource("Prompt", "greet", "sha256:aa"));

        let plan = plan(&ir, &state);
        assert_eq!(plan.actions[0].kind, ActionKind::Update);
    }

    #[test]
    fn deletes_sort_before_creates_and_updates() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        state.put("demo/Prompt/stale".into(), StateEntry::applied("sha256:aa".into(), "local".into(), chrono::Utc::now()));
        let mut ir = empty_ir();
        ir.resources.push(resource("Prompt", "greet", "sha256:bb"));

        let plan = plan(&ir, &state);
        assert_eq!(plan.actions[0].kind, ActionKind::Delete);
        assert_eq!(plan.actions[1].kind, ActionKind::Create);
    }

    #[test]
    fn plan_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        let mut ir = empty_ir();
        ir.resources.push(resource("Prompt", "greet", "sha256:aa"));
        ir.resources.push(resource("Skill", "search", "sha256:bb"));

        let a = plan(&ir, &state).to_canonical_json().unwrap();
        let b = plan(&ir, &state).to_canonical_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn select_binding_errors_list_available_names() {
        let bindings = vec![
            IRBinding { fqn: "demo/Binding/a".into(), target: "process".into(), default: false, attributes: BTreeMap::new() },
            IRBinding { fqn: "demo/Binding/b".into(), target: "process".into(), default: false, attributes: BTreeMap::new() },
        ];
        let err = select_binding(&bindings, None).unwrap_err();
        assert!(matches!(err, PlanError::NoDefaultBinding { .. }));
    }

    #[test]
    fn select_binding_picks_sole_binding() {
        let bindings =
            vec![IRBinding { fqn: "demo/Binding/a".into(), target: "process".into(), default: false, attributes: BTreeMap::new() }];
        let chosen = select_binding(&bindings, None).unwrap();
        assert_eq!(chosen.fqn, "demo/Binding/a");
    }
}
