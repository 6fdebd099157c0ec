//! Policy evaluation (§4.5 phase 4). Each `policy { rule ... }` block is
//! checked against every resource in the root package; violations in
//! `enforce` mode block the compile, violations in `warn` mode are
//! collected as warnings and the run proceeds — mirroring the
//! allow/deny `Decision` shape a policy engine elsewhere in this pack uses
//! for tool/path authorization.

use crate::error::SemanticError;
use crate::program::Program;
use agentspec_lang::ast::{PolicyAction, PolicySubjectType, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Enforce,
    Warn,
}

pub fn evaluate(program: &Program, mode: PolicyMode) -> Vec<SemanticError> {
    let mut out = Vec::new();
    let warn_only = mode == PolicyMode::Warn;

    for resource in program.root_resources() {
        let ResourceKind::Policy(policy) = &resource.kind else { continue };
        for rule in &policy.rules {
            match (rule.action, &rule.subject_type) {
                (PolicyAction::Deny, PolicySubjectType::Model) => {
                    if let Some(subject) = &rule.subject_name {
                        out.extend(deny_model(program, &resource.name.node, &subject.node, warn_only));
                    }
                }
                (PolicyAction::Deny, PolicySubjectType::Skill) => {
                    if let Some(subject) = &rule.subject_name {
                        out.extend(deny_skill(program, &resource.name.node, &subject.node, warn_only));
                    }
                }
                (PolicyAction::Require, PolicySubjectType::Secret) => {
                    if let Some(subject) = &rule.subject_name {
                        if !has_secret(program, &subject.node) {
                            out.push(violation(
                                &resource.name.node,
                                "require",
                                &format!("secret \"{}\"", subject.node),
                                format!("policy \"{}\" requires secret \"{}\" to exist", resource.name.node, subject.node),
                                warn_only,
                            ));
                        }
                    }
                }
                (PolicyAction::Require, PolicySubjectType::PinnedImports) => {
                    for import in &program.root.file.imports {
                        if import.version.is_none() && !import.is_local() {
                            out.push(violation(
                                &resource.name.node,
                                "require",
                                &format!("import \"{}\"", import.path.node),
                                format!("import \"{}\" is not pinned to a version", import.path.node),
                                warn_only,
                            ));
                        }
                    }
                }
                (PolicyAction::Require, PolicySubjectType::SignedPackages) => {
                    // Stubbed to a warning in MVP per §4.5.
                    for import in &program.root.file.imports {
                        if !import.is_local() {
                            out.push(violation(
                                &resource.name.node,
                                "require",
                                &format!("import \"{}\"", import.path.node),
                                format!(
                                    "package signature verification for \"{}\" is not yet implemented",
                                    import.path.node
                                ),
                                true,
                            ));
                        }
                    }
                }
                (PolicyAction::Allow, _) => {} // informational, never fails
                _ => {}
            }
        }
    }

    out
}

fn deny_model(program: &Program, policy_name: &str, model: &str, warn_only: bool) -> Vec<SemanticError> {
    program
        .root_resources()
        .iter()
        .filter_map(|r| match &r.kind {
            ResourceKind::Agent(agent) if agent.model.as_ref().map(|m| m.node.as_str()) == Some(model) => Some(
                violation(
                    policy_name,
                    "deny",
                    &format!("model \"{model}\""),
                    format!("agent \"{}\" uses denied model \"{model}\"", r.name.node),
                    warn_only,
                ),
            ),
            _ => None,
        })
        .collect()
}

fn deny_skill(program: &Program, policy_name: &str, skill: &str, warn_only: bool) -> Vec<SemanticError> {
    program
        .root_resources()
        .iter()
        .filter_map(|r| match &r.kind {
            ResourceKind::Agent(agent) if agent.uses_skills.iter().any(|s| s.name.node == skill) => Some(violation(
                policy_name,
                "deny",
                &format!("skill \"{skill}\""),
                format!("agent \"{}\" uses denied skill \"{skill}\"", r.name.node),
                warn_only,
            )),
            _ => None,
        })
        .collect()
}

fn has_secret(program: &Program, name: &str) -> bool {
    program
        .root_resources()
        .iter()
        .any(|r| r.name.node == name && matches!(r.kind, ResourceKind::Secret(_)))
}

fn violation(policy_name: &str, action: &str, subject: &str, message: String, warn_only: bool) -> SemanticError {
    SemanticError::Policy {
        message,
        policy_name: policy_name.to_string(),
        rule_action: action.to_string(),
        subject: subject.to_string(),
        span: None,
        warn_only,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Package;
    use agentspec_lang::parse;

    fn program_for(source: &str) -> Program {
        let file = parse(source).unwrap();
        Program::new(Package { name: "demo".into(), version: "0.1.0".into(), file }, vec![])
    }

    #[test]
    fn deny_skill_blocks_in_enforce_mode() {
        let program = program_for(
            r#"
package "demo" version "0.1.0" lang "2.0"

agent "bot" {
  uses skill "dangerous"
}

policy "guard" {
  rule deny skill "dangerous"
}
"#,
        );
        let violations = evaluate(&program, PolicyMode::Enforce);
        assert_eq!(violations.len(), 1);
        assert!(!violations[0].is_warning());
    }

    #[test]
    fn require_secret_passes_when_declared() {
        let program = program_for(
            r#"
package "demo" version "0.1.0" lang "2.0"

secret "api_key" {
  env "API_KEY"
}

policy "guard" {
  rule require secret "api_key"
}
"#,
        );
        assert!(evaluate(&program, PolicyMode::Enforce).is_empty());
    }
}
