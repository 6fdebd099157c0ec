//! Semantic Validator (§4.5): runs after structural validation on the
//! combined AST (root package + resolved imports). Five phases, each
//! accumulating into one error list rather than stopping at the first
//! failure (§7 propagation policy): uniqueness, reference resolution,
//! secret discipline, policy evaluation, and (delegated to
//! `agentspec-expr`) control-flow/validation-rule expression compilation.

use crate::error::SemanticError;
use crate::fuzzy;
use crate::policy::{self, PolicyMode};
use crate::program::Program;
use agentspec_lang::ast::{
    Attribute, PipelineDef, Resource, ResourceKind, Span, Statement, Value,
};
use std::collections::HashMap;

const SECRET_LIKE_KEYS: &[&str] = &["password", "secret", "api_key", "apikey", "token", "credential"];

pub fn validate(program: &Program, policy_mode: PolicyMode) -> Vec<SemanticError> {
    let mut errors = Vec::new();
    check_uniqueness(program, &mut errors);
    check_references(program, &mut errors);
    check_secrets(program, &mut errors);
    check_expressions(program, &mut errors);
    errors.extend(policy::evaluate(program, policy_mode));
    errors
}

// ---- Phase 1: uniqueness --------------------------------------------------

fn check_uniqueness(program: &Program, errors: &mut Vec<SemanticError>) {
    let mut seen: HashMap<(&str, &str), &Span> = HashMap::new();
    for resource in program.root_resources() {
        let key = (resource.kind.tag(), resource.name.node.as_str());
        if let Some(first_span) = seen.get(&key) {
            errors.push(SemanticError::Duplicate {
                message: format!("{} \"{}\" is declared more than once", key.0, key.1),
                first_span: Some((*first_span).clone()),
                second_span: Some(resource.span.clone()),
            });
        } else {
            seen.insert(key, &resource.span);
        }

        if let ResourceKind::Agent(agent) = &resource.kind {
            let mut rule_names: HashMap<&str, &Span> = HashMap::new();
            for rule in &agent.validation_rules {
                if let Some(first) = rule_names.get(rule.node.name.node.as_str()) {
                    errors.push(SemanticError::Duplicate {
                        message: format!(
                            "validation rule \"{}\" is declared more than once in agent \"{}\"",
                            rule.node.name.node, resource.name.node
                        ),
                        first_span: Some((*first).clone()),
                        second_span: Some(rule.node.span.clone()),
                    });
                } else {
                    rule_names.insert(&rule.node.name.node, &rule.node.span);
                }
            }
        }

        if let ResourceKind::Pipeline(pipeline) = &resource.kind {
            check_pipeline_step_uniqueness(resource, pipeline, errors);
        }
    }
}

fn check_pipeline_step_uniqueness(resource: &Resource, pipeline: &PipelineDef, errors: &mut Vec<SemanticError>) {
    let mut step_names: HashMap<&str, &Span> = HashMap::new();
    for step in &pipeline.steps {
        if let Some(first) = step_names.get(step.name.node.as_str()) {
            errors.push(SemanticError::Duplicate {
                message: format!(
                    "pipeline step \"{}\" is declared more than once in pipeline \"{}\"",
                    step.name.node, resource.name.node
                ),
                first_span: Some((*first).clone()),
                second_span: Some(step.span.clone()),
            });
        } else {
            step_names.insert(&step.name.node, &step.span);
        }
    }
}

// ---- Phase 2: reference resolution ---------------------------------------

/// Resolve a bare `kind "name"` reference to an FQN, searching the root
/// package first and then every imported package. Ambiguous names (present
/// identically in more than one imported package) are reported as
/// unresolved with both candidates named, rather than guessed at. Exposed
/// so downstream crates (IR lowering) resolve the same reference fields
/// without re-deriving this search order.
pub fn resolve_reference(program: &Program, kind: &str, name: &str) -> Result<String, Vec<String>> {
    let root_fqn = format!("{}/{}/{}", program.root.name, kind, name);
    if program.resolve(&root_fqn).is_some() {
        return Ok(root_fqn);
    }
    let matches: Vec<String> = program
        .dependencies
        .iter()
        .map(|dep| format!("{}/{}/{}", dep.name, kind, name))
        .filter(|fqn| program.resolve(fqn).is_some())
        .collect();
    match matches.len() {
        1 => Ok(matches.into_iter().next().unwrap()),
        0 => Err(vec![]),
        _ => Err(matches),
    }
}

fn unresolved(program: &Program, kind: &str, name: &str, span: Span) -> SemanticError {
    let candidate_names: Vec<String> = program
        .resources_of_kind(kind)
        .map(|(fqn, _)| fqn.rsplit('/').next().unwrap_or(&fqn).to_string())
        .collect();
    let suggestion =
        fuzzy::suggest(name, candidate_names.iter().map(String::as_str)).map(|s| s.to_string());
    SemanticError::Reference {
        message: format!("{} \"{}\" not found", kind.to_lowercase(), name),
        span: Some(span),
        suggestion,
    }
}

fn check_references(program: &Program, errors: &mut Vec<SemanticError>) {
    for resource in program.root_resources() {
        match &resource.kind {
            ResourceKind::Agent(agent) => {
                for reference in agent.uses_prompts.iter().chain(&agent.uses_skills) {
                    if resolve_reference(program, &reference.kind, &reference.name.node).is_err() {
                        errors.push(unresolved(program, &reference.kind, &reference.name.node, reference.span.clone()));
                    }
                }
                for stmt in &agent.on_input {
                    check_statement(program, &stmt.node, errors);
                }
            }
            ResourceKind::Skill(skill) => {
                if let Some(reference) = &skill.uses_tool {
                    if resolve_reference(program, "Tool", &reference.name.node).is_err() {
                        errors.push(unresolved(program, "Tool", &reference.name.node, reference.span.clone()));
                    }
                }
            }
            ResourceKind::MCPServer(server) => {
                for reference in &server.exposes_skills {
                    if resolve_reference(program, "Skill", &reference.name.node).is_err() {
                        errors.push(unresolved(program, "Skill", &reference.name.node, reference.span.clone()));
                    }
                }
            }
            ResourceKind::MCPClient(client) => {
                for reference in &client.connects_to_servers {
                    if resolve_reference(program, "MCPServer", &reference.name.node).is_err() {
                        errors.push(unresolved(program, "MCPServer", &reference.name.node, reference.span.clone()));
                    }
                }
            }
            ResourceKind::Pipeline(pipeline) => {
                let step_names: std::collections::HashSet<&str> =
                    pipeline.steps.iter().map(|s| s.name.node.as_str()).collect();
                for step in &pipeline.steps {
                    if resolve_reference(program, "Agent", &step.agent.name.node).is_err() {
                        errors.push(unresolved(program, "Agent", &step.agent.name.node, step.agent.span.clone()));
                    }
                    for dep in &step.depends_on {
                        if !step_names.contains(dep.node.as_str()) {
                            errors.push(SemanticError::Reference {
                                message: format!(
                                    "pipeline step \"{}\" depends_on unknown step \"{}\"",
                                    step.name.node, dep.node
                                ),
                                span: Some(dep.span.clone()),
                                suggestion: fuzzy::suggest(&dep.node, step_names.iter().copied()).map(str::to_string),
                            });
                        }
                    }
                }
            }
            ResourceKind::Environment(env) => {
                for entry in &env.overrides {
                    if resolve_reference(program, &capitalize(&entry.target_kind), &entry.target_name.node).is_err() {
                        errors.push(unresolved(
                            program,
                            &capitalize(&entry.target_kind),
                            &entry.target_name.node,
                            entry.span.clone(),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
}

fn check_statement(program: &Program, stmt: &Statement, errors: &mut Vec<SemanticError>) {
    match stmt {
        Statement::If { then_branch, elifs, else_branch, .. } => {
            for s in then_branch.iter().chain(else_branch) {
                check_statement(program, &s.node, errors);
            }
            for (_, body) in elifs {
                for s in body {
                    check_statement(program, &s.node, errors);
                }
            }
        }
        Statement::ForEach { body, .. } => {
            for s in body {
                check_statement(program, &s.node, errors);
            }
        }
        Statement::UseSkill { name, .. } => {
            if resolve_reference(program, "Skill", &name.node).is_err() {
                errors.push(unresolved(program, "Skill", &name.node, name.span.clone()));
            }
        }
        Statement::DelegateTo { agent } => {
            if resolve_reference(program, "Agent", &agent.node).is_err() {
                errors.push(unresolved(program, "Agent", &agent.node, agent.span.clone()));
            }
        }
        Statement::Respond { .. } => {}
    }
}

fn capitalize(kind_word: &str) -> String {
    match kind_word {
        "server" => "MCPServer".to_string(),
        "client" => "MCPClient".to_string(),
        "deploy" => "Binding".to_string(),
        other => {
            let mut c = other.chars();
            match c.next() {
                Some(first) => first.to_uppercase().collect::<String>() + c.as_str(),
                None => String::new(),
            }
        }
    }
}

// ---- Phase 3: secret discipline ------------------------------------------

fn check_secrets(program: &Program, errors: &mut Vec<SemanticError>) {
    for resource in program.root_resources() {
        let attributes: &[Attribute] = match &resource.kind {
            ResourceKind::Prompt(def) => &def.attributes,
            ResourceKind::Tool(def) => &def.attributes,
            ResourceKind::Skill(def) => &def.attributes,
            ResourceKind::Binding(def) => &def.attributes,
            ResourceKind::Plugin(def) => &def.attributes,
            ResourceKind::Agent(def) => &def.attributes,
            ResourceKind::MCPServer(def) => &def.attributes,
            ResourceKind::MCPClient(def) => &def.attributes,
            _ => continue,
        };
        for attr in attributes {
            let key_lower = attr.key.node.to_lowercase();
            let looks_secret = SECRET_LIKE_KEYS.iter().any(|k| key_lower.contains(k));
            if looks_secret {
                if let Value::String(s) = &attr.value.node {
                    if !s.is_empty() {
                        errors.push(SemanticError::SecretLiteral {
                            message: format!(
                                "attribute \"{}\" on {} \"{}\" holds a plaintext secret literal",
                                attr.key.node,
                                resource.kind.tag().to_lowercase(),
                                resource.name.node
                            ),
                            span: Some(attr.value.span.clone()),
                        });
                    }
                }
            }
        }
    }
}

// ---- Phase 5 (delegated): expression compilation -------------------------

fn check_expressions(program: &Program, errors: &mut Vec<SemanticError>) {
    for resource in program.root_resources() {
        let ResourceKind::Agent(agent) = &resource.kind else { continue };
        for rule in &agent.validation_rules {
            compile_and_collect(&rule.node.when_expression.node, rule.node.when_expression.span.clone(), errors);
        }
        for stmt in &agent.on_input {
            check_statement_expressions(&stmt.node, errors);
        }
    }
}

fn check_statement_expressions(stmt: &Statement, errors: &mut Vec<SemanticError>) {
    match stmt {
        Statement::If { cond, then_branch, elifs, else_branch } => {
            compile_and_collect(&cond.node, cond.span.clone(), errors);
            for s in then_branch.iter().chain(else_branch) {
                check_statement_expressions(&s.node, errors);
            }
            for (elif_cond, body) in elifs {
                compile_and_collect(&elif_cond.node, elif_cond.span.clone(), errors);
                for s in body {
                    check_statement_expressions(&s.node, errors);
                }
            }
        }
        Statement::ForEach { collection, body, .. } => {
            compile_and_collect(&collection.node, collection.span.clone(), errors);
            for s in body {
                check_statement_expressions(&s.node, errors);
            }
        }
        Statement::UseSkill { .. } | Statement::DelegateTo { .. } | Statement::Respond { .. } => {}
    }
}

fn compile_and_collect(source: &str, span: Span, errors: &mut Vec<SemanticError>) {
    if let Err(e) = agentspec_expr::compile(source) {
        errors.push(SemanticError::Reference {
            message: format!("invalid expression \"{source}\": {e}"),
            span: Some(span),
            suggestion: None,
        });
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
    fn suggests_close_typo_for_unresolved_skill() {
        let program = program_for(
            r#"
package "demo" version "0.1.0" lang "2.0"

skill "search" {
  tool command { binary "search" }
}

agent "bot" {
  uses skill "serch"
}
"#,
        );
        let errors = validate(&program, PolicyMode::Enforce);
        let reference_error = errors
            .iter()
            .find(|e| matches!(e, SemanticError::Reference { .. }))
            .expect("reference error");
        assert_eq!(reference_error.hint(), Some("did you mean \"search\"?".to_string()));
    }

    #[test]
    fn rejects_duplicate_resource_names() {
        let program = program_for(
            r#"
package "demo" version "0.1.0" lang "2.0"

prompt "greet" {
  content "Hello"
}

prompt "greet" {
  content "Hi"
}
"#,
        );
        let errors = validate(&program, PolicyMode::Enforce);
        assert!(errors.iter().any(|e| matches!(e, SemanticError::Duplicate { .. })));
    }

    #[test]
    fn rejects_plaintext_secret_attribute() {
        let program = program_for(
            r#"
package "demo" version "0.1.0" lang "2.0"

tool "t" {
  http {
    url "https://example.com"
  }
  api_key "sk-12345"
}
"#,
        );
        let errors = validate(&program, PolicyMode::Enforce);
        assert!(errors.iter().any(|e| matches!(e, SemanticError::SecretLiteral { .. })));
    }
}
