//! Structural validator (§4.4): per-resource-kind schema conformance that
//! needs no cross-resource context — required attributes, attribute types,
//! enum membership, and arity of repeatable clauses. Reference resolution,
//! uniqueness, secret discipline and policy evaluation are semantic
//! concerns and live in `agentspec-semantic` (§4.5), which runs after this
//! pass on the combined, import-resolved AST.

use crate::ast::{
    AgentDef, BindingDef, ConfigParam, IntentFile, MCPClientDef, PipelineDef, PolicyDef,
    PolicyRule, PolicySubjectType, PromptDef, Resource, ResourceKind, SkillDef, ToolDef, ToolSpec,
    TypeDef,
};
use crate::error::ValidationError;

/// Run every structural check over a parsed file and return all violations.
/// Does not consult imports or other resources (§4.4).
pub fn validate(file: &IntentFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(pkg) = &file.package {
        check_semver(&pkg.version.node, pkg.version.span.clone(), &mut errors);
        check_lang_version(&pkg.lang_version.node, pkg.lang_version.span.clone(), &mut errors);
    }

    for import in &file.imports {
        if let Some(version) = &import.version {
            check_semver(&version.node, version.span.clone(), &mut errors);
        }
    }

    for resource in &file.resources {
        validate_resource(resource, &mut errors);
    }

    errors
}

fn validate_resource(resource: &Resource, errors: &mut Vec<ValidationError>) {
    match &resource.kind {
        ResourceKind::Agent(def) => validate_agent(def, errors),
        ResourceKind::Prompt(def) => validate_prompt(def, errors),
        ResourceKind::Skill(def) => validate_skill(def, errors),
        ResourceKind::Tool(def) => validate_tool(def, errors),
        ResourceKind::MCPClient(def) => validate_mcp_client(def, errors),
        ResourceKind::Policy(def) => validate_policy(def, errors),
        ResourceKind::Pipeline(def) => validate_pipeline(def, errors),
        ResourceKind::Binding(def) => validate_binding(def, errors),
        ResourceKind::Type(def) => validate_type(resource, def, errors),
        ResourceKind::MCPServer(_)
        | ResourceKind::Secret(_)
        | ResourceKind::Environment(_)
        | ResourceKind::Plugin(_) => {}
    }
}

fn check_semver(value: &str, span: crate::ast::Span, errors: &mut Vec<ValidationError>) {
    if semver::Version::parse(value).is_err() {
        errors.push(ValidationError {
            code: "StructuralError",
            message: format!("'{value}' is not a valid semantic version"),
            span: Some(span),
            hint: Some("use major.minor.patch, e.g. \"1.0.0\"".to_string()),
        });
    }
}

fn check_lang_version(value: &str, span: crate::ast::Span, errors: &mut Vec<ValidationError>) {
    let parts: Vec<&str> = value.split('.').collect();
    let ok = parts.len() == 2 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
    if !ok {
        errors.push(ValidationError {
            code: "StructuralError",
            message: format!("'{value}' is not a valid lang version"),
            span: Some(span),
            hint: Some("use \"major.minor\", e.g. \"2.0\"".to_string()),
        });
    }
}

fn validate_agent(def: &AgentDef, errors: &mut Vec<ValidationError>) {
    for param in &def.config_params {
        validate_config_param(&param.node, errors);
    }
    for rule in &def.validation_rules {
        if rule.node.message.node.is_empty() {
            errors.push(ValidationError {
                code: "StructuralError",
                message: format!("validation rule '{}' has an empty message", rule.node.name.node),
                span: Some(rule.node.span.clone()),
                hint: Some("every rule needs a user-facing message".to_string()),
            });
        }
        if rule.node.when_expression.node.trim().is_empty() {
            errors.push(ValidationError {
                code: "StructuralError",
                message: format!("validation rule '{}' has an empty when expression", rule.node.name.node),
                span: Some(rule.node.span.clone()),
                hint: None,
            });
        }
    }
}

fn validate_config_param(param: &ConfigParam, errors: &mut Vec<ValidationError>) {
    // Invariant (§3): secret ⇒ ¬has_default.
    if param.secret && param.default.is_some() {
        errors.push(ValidationError {
            code: "StructuralError",
            message: format!("config param '{}' is secret and cannot carry a default value", param.name.node),
            span: Some(param.span.clone()),
            hint: Some("move the value into a `secret` resource instead".to_string()),
        });
    }
}

fn validate_prompt(def: &PromptDef, errors: &mut Vec<ValidationError>) {
    if def.content.node.trim().is_empty() {
        errors.push(ValidationError {
            code: "StructuralError",
            message: "prompt has no content".to_string(),
            span: Some(def.content.span.clone()),
            hint: Some("add a `content \"...\"` line".to_string()),
        });
    }
}

fn validate_skill(def: &SkillDef, errors: &mut Vec<ValidationError>) {
    match (&def.inline_tool, &def.uses_tool) {
        (None, None) => errors.push(ValidationError {
            code: "StructuralError",
            message: "skill declares neither an inline tool nor `uses tool`".to_string(),
            span: None,
            hint: Some("add `tool <kind> { ... }` or `uses tool \"<name>\"`".to_string()),
        }),
        (Some(tool), Some(reference)) => {
            errors.push(ValidationError {
                code: "StructuralError",
                message: "skill declares both an inline tool and `uses tool`".to_string(),
                span: Some(reference.span.clone()),
                hint: Some(format!(
                    "remove either the inline tool at the top of this block or `uses tool \"{}\"`",
                    reference.name.node
                )),
            });
            validate_tool_spec(&tool.node, tool.span.clone(), errors);
        }
        (Some(tool), None) => validate_tool_spec(&tool.node, tool.span.clone(), errors),
        (None, Some(_)) => {}
    }
}

fn validate_tool(def: &ToolDef, errors: &mut Vec<ValidationError>) {
    validate_tool_spec(&def.spec.node, def.spec.span.clone(), errors);
}

fn validate_tool_spec(spec: &ToolSpec, span: crate::ast::Span, errors: &mut Vec<ValidationError>) {
    match spec {
        ToolSpec::Command { binary, .. } => {
            if binary.node.trim().is_empty() {
                errors.push(ValidationError {
                    code: "StructuralError",
                    message: "command tool has no binary".to_string(),
                    span: Some(span),
                    hint: Some("add `binary \"...\"` inside `tool command { ... }`".to_string()),
                });
            }
        }
        ToolSpec::Http { url, .. } => {
            if url.node.trim().is_empty() {
                errors.push(ValidationError {
                    code: "StructuralError",
                    message: "http tool has no url".to_string(),
                    span: Some(span),
                    hint: Some("add `url \"...\"` inside `tool http { ... }`".to_string()),
                });
            }
        }
        ToolSpec::Inline { body } => {
            if body.node.trim().is_empty() {
                errors.push(ValidationError {
                    code: "StructuralError",
                    message: "inline tool has an empty body".to_string(),
                    span: Some(span),
                    hint: None,
                });
            }
        }
        // Transport's variants already structurally forbid `auth` on stdio
        // and `command` on sse/streamable-http (the grammar for each
        // variant only accepts its own attribute lines).
        ToolSpec::Mcp { .. } => {}
    }
}

fn validate_mcp_client(def: &MCPClientDef, errors: &mut Vec<ValidationError>) {
    // Arity: `connects to server` must occur ≥1 on a client (§4.4).
    if def.connects_to_servers.is_empty() {
        errors.push(ValidationError {
            code: "StructuralError",
            message: "client declares no `connects to server`".to_string(),
            span: None,
            hint: Some("add at least one `connects to server \"<name>\"`".to_string()),
        });
    }
}

fn validate_policy(def: &PolicyDef, errors: &mut Vec<ValidationError>) {
    for rule in &def.rules {
        validate_policy_rule(rule, errors);
    }
}

fn validate_policy_rule(rule: &PolicyRule, errors: &mut Vec<ValidationError>) {
    let needs_subject = matches!(
        rule.subject_type,
        PolicySubjectType::Model | PolicySubjectType::Skill | PolicySubjectType::Secret
    );
    if needs_subject && rule.subject_name.is_none() {
        errors.push(ValidationError {
            code: "StructuralError",
            message: format!("policy rule {:?} {:?} is missing a subject name", rule.action, rule.subject_type),
            span: Some(rule.span.clone()),
            hint: Some("e.g. `rule deny skill \"dangerous-skill\"`".to_string()),
        });
    }
}

fn validate_pipeline(def: &PipelineDef, errors: &mut Vec<ValidationError>) {
    for step in &def.steps {
        if step.name.node.trim().is_empty() {
            errors.push(ValidationError {
                code: "StructuralError",
                message: "pipeline step has an empty name".to_string(),
                span: Some(step.span.clone()),
                hint: None,
            });
        }
    }
}

fn validate_binding(def: &BindingDef, errors: &mut Vec<ValidationError>) {
    if def.target.node.trim().is_empty() {
        errors.push(ValidationError {
            code: "StructuralError",
            message: "binding has an empty target".to_string(),
            span: Some(def.target.span.clone()),
            hint: None,
        });
    }
}

fn validate_type(resource: &Resource, def: &TypeDef, errors: &mut Vec<ValidationError>) {
    match def {
        TypeDef::Struct { fields } => {
            if fields.is_empty() {
                errors.push(ValidationError {
                    code: "StructuralError",
                    message: format!("struct type '{}' has no fields", resource.name.node),
                    span: Some(resource.span.clone()),
                    hint: Some("add at least one `field \"name\" type <type>`".to_string()),
                });
            }
        }
        TypeDef::Enum { variants } => {
            if variants.is_empty() {
                errors.push(ValidationError {
                    code: "StructuralError",
                    message: format!("enum type '{}' has no cases", resource.name.node),
                    span: Some(resource.span.clone()),
                    hint: Some("add at least one `case \"...\"`".to_string()),
                });
            }
        }
        TypeDef::List { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn rejects_secret_config_param_with_default() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

agent "bot" {
  config {
    param "api_key" type string required secret default "x"
  }
}
"#;
        let file = parse(source).expect("parse");
        let errors = validate(&file);
        assert!(errors.iter().any(|e| e.message.contains("cannot carry a default")));
    }

    #[test]
    fn rejects_client_with_no_connections() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

client "orphan" {
}
"#;
        let file = parse(source).expect("parse");
        let errors = validate(&file);
        assert!(errors.iter().any(|e| e.message.contains("connects to server")));
    }

    #[test]
    fn accepts_well_formed_package() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

prompt "greet" {
  content "Hello"
}
"#;
        let file = parse(source).expect("parse");
        let errors = validate(&file);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn rejects_bad_semver() {
        let source = r#"package "demo" version "not-a-version" lang "2.0""#;
        let file = parse(source).expect("parse");
        let errors = validate(&file);
        assert!(errors.iter().any(|e| e.message.contains("semantic version")));
    }
}
