//! IR Lowering (§4.7): pure function `(validated Program, environment?) ->
//! IRDocument`. Reference resolution reuses `agentspec_semantic`'s search
//! order rather than re-deriving it — lowering runs only after semantic
//! validation already proved every reference resolves, so failures here
//! are defense-in-depth, not expected user-facing paths.

use crate::document::{IRBinding, IRDocument, IRPolicy, IRPolicyRule, IRResource, IR_VERSION};
use crate::error::LowerError;
use agentspec_lang::ast::{
    Attribute, ConfigParam, OverlayEntry, PipelineStep, PolicyRule, Reference, Resource, ResourceKind, Statement,
    ToolSpec, Transport, TypeDef, Value, ValidationRule,
};
use agentspec_semantic::{resolve_reference, Program};
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;

pub fn lower(program: &Program, environment: Option<&str>) -> Result<IRDocument, LowerError> {
    check_duplicate_fqns(program)?;

    let lang_version =
        program.root.file.package.as_ref().map(|h| h.lang_version.node.clone()).unwrap_or_else(|| "2.0".to_string());

    let mut resources = Vec::new();
    let mut policies = Vec::new();
    let mut bindings = Vec::new();

    for resource in program.root_resources() {
        let fqn = resource.fqn(&program.root.name);
        match &resource.kind {
            ResourceKind::Policy(policy) => policies.push(IRPolicy {
                name: resource.name.node.clone(),
                rules: policy.rules.iter().map(lower_policy_rule).collect(),
            }),
            ResourceKind::Binding(binding) => {
                let (mut attrs, _) = lower_generic_attributes(&fqn, &binding.attributes)?;
                attrs.insert("target".to_string(), json!(binding.target.node));
                bindings.push(IRBinding { fqn, target: binding.target.node.clone(), default: binding.default, attributes: attrs });
            }
            ResourceKind::Environment(_) => {} // overlay source only, never an emitted resource
            _ => resources.push(lower_resource(resource, &fqn, program)?),
        }
    }

    if let Some(env_name) = environment {
        apply_environment(program, env_name, &mut resources)?;
    }

    for resource in &mut resources {
        resource.recompute_hash();
    }
    resources.sort_by(|a, b| (a.kind.as_str(), a.name.as_str()).cmp(&(b.kind.as_str(), b.name.as_str())));
    bindings.sort_by(|a, b| a.fqn.cmp(&b.fqn));
    policies.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(IRDocument { ir_version: IR_VERSION, lang_version, package: program.root.name.clone(), resources, policies, bindings })
}

fn check_duplicate_fqns(program: &Program) -> Result<(), LowerError> {
    let mut seen = std::collections::HashSet::new();
    for fqn in program.all_fqns() {
        if !seen.insert(fqn) {
            return Err(LowerError::DuplicateFqn { fqn: fqn.to_string() });
        }
    }
    Ok(())
}

fn lower_policy_rule(rule: &PolicyRule) -> IRPolicyRule {
    IRPolicyRule {
        action: format!("{:?}", rule.action).to_lowercase(),
        subject_type: format!("{:?}", rule.subject_type).to_lowercase(),
        subject_name: rule.subject_name.as_ref().map(|s| s.node.clone()),
    }
}

fn resolve(program: &Program, reference: &Reference) -> Result<String, LowerError> {
    resolve_reference(program, &reference.kind, &reference.name.node)
        .map_err(|_| LowerError::UnresolvedReference(format!("{} \"{}\"", reference.kind, reference.name.node)))
}

fn lower_resource(resource: &Resource, fqn: &str, program: &Program) -> Result<IRResource, LowerError> {
    let (attributes, references) = match &resource.kind {
        ResourceKind::Agent(agent) => {
            let mut attrs = BTreeMap::new();
            let mut refs = Vec::new();
            if let Some(model) = &agent.model {
                attrs.insert("model".to_string(), json!(model.node));
            }
            let mut prompt_names = Vec::new();
            for r in &agent.uses_prompts {
                refs.push(resolve(program, r)?);
                prompt_names.push(r.name.node.clone());
            }
            attrs.insert("uses_prompts".to_string(), json!(prompt_names));
            let mut skill_names = Vec::new();
            for r in &agent.uses_skills {
                refs.push(resolve(program, r)?);
                skill_names.push(r.name.node.clone());
            }
            attrs.insert("uses_skills".to_string(), json!(skill_names));
            attrs.insert(
                "config_params".to_string(),
                json!(agent.config_params.iter().map(|p| lower_config_param(&p.node)).collect::<Vec<_>>()),
            );
            let rules: Result<Vec<_>, LowerError> =
                agent.validation_rules.iter().map(|r| lower_validation_rule(fqn, &r.node)).collect();
            attrs.insert("validation_rules".to_string(), json!(rules?));
            let (on_input_json, mut stmt_refs) = lower_statements(fqn, &agent.on_input, program)?;
            attrs.insert("on_input".to_string(), on_input_json);
            refs.append(&mut stmt_refs);
            let (mut generic, _) = lower_generic_attributes(fqn, &agent.attributes)?;
            attrs.append(&mut generic);
            (attrs, refs)
        }
        ResourceKind::Prompt(prompt) => {
            let mut attrs = BTreeMap::new();
            attrs.insert("content".to_string(), json!(prompt.content.node));
            let (mut generic, refs) = lower_generic_attributes(fqn, &prompt.attributes)?;
            attrs.append(&mut generic);
            (attrs, refs)
        }
        ResourceKind::Skill(skill) => {
            let mut attrs = BTreeMap::new();
            let mut refs = Vec::new();
            if let Some(inline) = &skill.inline_tool {
                attrs.insert("tool".to_string(), lower_tool_spec(fqn, &inline.node)?);
            }
            if let Some(uses_tool) = &skill.uses_tool {
                refs.push(resolve(program, uses_tool)?);
                attrs.insert("uses_tool".to_string(), json!(uses_tool.name.node));
            }
            let (mut generic, mut generic_refs) = lower_generic_attributes(fqn, &skill.attributes)?;
            attrs.append(&mut generic);
            refs.append(&mut generic_refs);
            (attrs, refs)
        }
        ResourceKind::Tool(tool) => {
            let mut attrs = BTreeMap::new();
            attrs.insert("spec".to_string(), lower_tool_spec(fqn, &tool.spec.node)?);
            let (mut generic, refs) = lower_generic_attributes(fqn, &tool.attributes)?;
            attrs.append(&mut generic);
            (attrs, refs)
        }
        ResourceKind::MCPServer(server) => {
            let mut attrs = BTreeMap::new();
            let mut refs = Vec::new();
            attrs.insert("transport".to_string(), lower_transport(&server.transport.node));
            let mut exposed = Vec::new();
            for r in &server.exposes_skills {
                refs.push(resolve(program, r)?);
                exposed.push(r.name.node.clone());
            }
            attrs.insert("exposes_skills".to_string(), json!(exposed));
            let (mut generic, mut generic_refs) = lower_generic_attributes(fqn, &server.attributes)?;
            attrs.append(&mut generic);
            refs.append(&mut generic_refs);
            (attrs, refs)
        }
        ResourceKind::MCPClient(client) => {
            let mut attrs = BTreeMap::new();
            let mut refs = Vec::new();
            let mut servers = Vec::new();
            for r in &client.connects_to_servers {
                refs.push(resolve(program, r)?);
                servers.push(r.name.node.clone());
            }
            attrs.insert("connects_to_servers".to_string(), json!(servers));
            let (mut generic, mut generic_refs) = lower_generic_attributes(fqn, &client.attributes)?;
            attrs.append(&mut generic);
            refs.append(&mut generic_refs);
            (attrs, refs)
        }
        ResourceKind::Secret(secret) => {
            let mut attrs = BTreeMap::new();
            attrs.insert(
                "source".to_string(),
                match &secret.source.node {
                    agentspec_lang::ast::SecretSource::Env { var_name } => json!({"kind": "env", "var_name": var_name.node}),
                    agentspec_lang::ast::SecretSource::Store { store_name } => {
                        json!({"kind": "store", "store_name": store_name.node})
                    }
                },
            );
            (attrs, vec![])
        }
        ResourceKind::Pipeline(pipeline) => {
            let mut attrs = BTreeMap::new();
            let mut refs = Vec::new();
            let mut steps = Vec::new();
            for step in &pipeline.steps {
                refs.push(resolve(program, &step.agent)?);
                steps.push(lower_pipeline_step(step));
            }
            attrs.insert("steps".to_string(), json!(steps));
            (attrs, refs)
        }
        ResourceKind::Plugin(plugin) => {
            let mut attrs = BTreeMap::new();
            attrs.insert("version".to_string(), json!(plugin.version.node));
            let (mut generic, refs) = lower_generic_attributes(fqn, &plugin.attributes)?;
            attrs.append(&mut generic);
            (attrs, refs)
        }
        ResourceKind::Type(type_def) => (lower_type_def(type_def), vec![]),
        ResourceKind::Policy(_) | ResourceKind::Binding(_) | ResourceKind::Environment(_) => unreachable!(),
    };

    Ok(IRResource {
        kind: resource.kind.tag().to_string(),
        name: resource.name.node.clone(),
        fqn: fqn.to_string(),
        attributes,
        references,
        hash: String::new(), // filled by recompute_hash after overlays
    })
}

fn lower_generic_attributes(fqn: &str, attributes: &[Attribute]) -> Result<(BTreeMap<String, Json>, Vec<String>), LowerError> {
    let mut attrs = BTreeMap::new();
    for attribute in attributes {
        attrs.insert(attribute.key.node.clone(), lower_value(fqn, &attribute.value.node)?);
    }
    Ok((attrs, vec![]))
}

fn lower_value(fqn: &str, value: &Value) -> Result<Json, LowerError> {
    Ok(match value {
        Value::String(s) => json!(s),
        Value::Number(n) => json!(n),
        Value::Bool(b) => json!(b),
        Value::List(items) => {
            let values: Result<Vec<Json>, LowerError> = items.iter().map(|v| lower_value(fqn, &v.node)).collect();
            Json::Array(values?)
        }
        Value::Expr(source) => lower_expression(fqn, source)?,
    })
}

fn lower_expression(fqn: &str, source: &str) -> Result<Json, LowerError> {
    let compiled = agentspec_expr::compile(source).map_err(|e| LowerError::Expression { fqn: fqn.to_string(), message: e.to_string() })?;
    for e in agentspec_expr::static_check(&compiled) {
        return Err(LowerError::Expression { fqn: fqn.to_string(), message: e.to_string() });
    }
    serde_json::to_value(&compiled).map_err(|e| LowerError::Expression { fqn: fqn.to_string(), message: e.to_string() })
}

fn lower_config_param(param: &ConfigParam) -> Json {
    json!({
        "name": param.name.node,
        "type": format!("{:?}", param.ty.node).to_lowercase(),
        "required": param.required,
        "secret": param.secret,
        "default": param.default.as_ref().map(|v| value_to_json_best_effort(&v.node)),
    })
}

/// Config-param defaults cannot themselves be expressions (structurally
/// enforced upstream), so this never needs to surface a compile error.
fn value_to_json_best_effort(value: &Value) -> Json {
    match value {
        Value::String(s) => json!(s),
        Value::Number(n) => json!(n),
        Value::Bool(b) => json!(b),
        Value::List(items) => Json::Array(items.iter().map(|v| value_to_json_best_effort(&v.node)).collect()),
        Value::Expr(source) => json!({"expr": source}),
    }
}

fn lower_validation_rule(fqn: &str, rule: &ValidationRule) -> Result<Json, LowerError> {
    Ok(json!({
        "name": rule.name.node,
        "severity": format!("{:?}", rule.severity).to_lowercase(),
        "message": rule.message.node,
        "when": lower_expression(fqn, &rule.when_expression.node)?,
        "max_retries": rule.max_retries,
    }))
}

fn lower_tool_spec(fqn: &str, spec: &ToolSpec) -> Result<Json, LowerError> {
    Ok(match spec {
        ToolSpec::Command { binary, args } => {
            let args: Result<Vec<Json>, LowerError> = args.iter().map(|v| lower_value(fqn, &v.node)).collect();
            json!({"kind": "command", "binary": binary.node, "args": args?})
        }
        ToolSpec::Http { url, method } => json!({"kind": "http", "url": url.node, "method": method.as_ref().map(|m| &m.node)}),
        ToolSpec::Inline { body } => json!({"kind": "inline", "body": body.node}),
        ToolSpec::Mcp { transport } => json!({"kind": "mcp", "transport": lower_transport(&transport.node)}),
    })
}

fn lower_transport(transport: &Transport) -> Json {
    match transport {
        Transport::Stdio { command } => json!({"kind": "stdio", "command": command.as_ref().map(|c| &c.node)}),
        Transport::Sse { url, auth } => {
            json!({"kind": "sse", "url": url.as_ref().map(|u| &u.node), "auth": auth.as_ref().map(|a| &a.node)})
        }
        Transport::StreamableHttp { url, auth } => {
            json!({"kind": "streamable-http", "url": url.as_ref().map(|u| &u.node), "auth": auth.as_ref().map(|a| &a.node)})
        }
    }
}

fn lower_pipeline_step(step: &PipelineStep) -> Json {
    json!({
        "name": step.name.node,
        "agent": step.agent.name.node,
        "depends_on": step.depends_on.iter().map(|d| d.node.clone()).collect::<Vec<_>>(),
        "parallel": step.parallel,
    })
}

fn lower_type_def(type_def: &TypeDef) -> BTreeMap<String, Json> {
    let mut attrs = BTreeMap::new();
    match type_def {
        TypeDef::Struct { fields } => {
            attrs.insert("kind".to_string(), json!("struct"));
            attrs.insert(
                "fields".to_string(),
                json!(fields
                    .iter()
                    .map(|(name, ty)| json!({"name": name.node, "type": format!("{:?}", ty.node).to_lowercase()}))
                    .collect::<Vec<_>>()),
            );
        }
        TypeDef::Enum { variants } => {
            attrs.insert("kind".to_string(), json!("enum"));
            attrs.insert("variants".to_string(), json!(variants.iter().map(|v| v.node.clone()).collect::<Vec<_>>()));
        }
        TypeDef::List { element } => {
            attrs.insert("kind".to_string(), json!("list"));
            attrs.insert("element".to_string(), json!(format!("{:?}", element.node).to_lowercase()));
        }
    }
    attrs
}

fn lower_statements(fqn: &str, statements: &[agentspec_lang::ast::Spanned<Statement>], program: &Program) -> Result<(Json, Vec<String>), LowerError> {
    let mut refs = Vec::new();
    let mut out = Vec::new();
    for stmt in statements {
        out.push(lower_statement(fqn, &stmt.node, program, &mut refs)?);
    }
    Ok((json!(out), refs))
}

fn lower_statement(fqn: &str, stmt: &Statement, program: &Program, refs: &mut Vec<String>) -> Result<Json, LowerError> {
    Ok(match stmt {
        Statement::If { cond, then_branch, elifs, else_branch } => {
            let (then_json, mut then_refs) = lower_statements(fqn, then_branch, program)?;
            refs.append(&mut then_refs);
            let (else_json, mut else_refs) = lower_statements(fqn, else_branch, program)?;
            refs.append(&mut else_refs);
            let mut elif_jsons = Vec::new();
            for (elif_cond, body) in elifs {
                let (body_json, mut body_refs) = lower_statements(fqn, body, program)?;
                refs.append(&mut body_refs);
                elif_jsons.push(json!({"cond": lower_expression(fqn, &elif_cond.node)?, "body": body_json}));
            }
            json!({
                "kind": "if",
                "cond": lower_expression(fqn, &cond.node)?,
                "then": then_json,
                "elifs": elif_jsons,
                "else": else_json,
            })
        }
        Statement::ForEach { var, collection, body } => {
            let (body_json, mut body_refs) = lower_statements(fqn, body, program)?;
            refs.append(&mut body_refs);
            json!({
                "kind": "for_each",
                "var": var.node,
                "collection": lower_expression(fqn, &collection.node)?,
                "body": body_json,
            })
        }
        Statement::UseSkill { name, args } => {
            let target = resolve_reference(program, "Skill", &name.node)
                .map_err(|_| LowerError::UnresolvedReference(format!("skill \"{}\"", name.node)))?;
            refs.push(target.clone());
            json!({
                "kind": "use_skill",
                "skill": target,
                "args": args.iter().map(|(k, v)| (k.clone(), v.node.clone())).collect::<BTreeMap<_, _>>(),
            })
        }
        Statement::DelegateTo { agent } => {
            let target = resolve_reference(program, "Agent", &agent.node)
                .map_err(|_| LowerError::UnresolvedReference(format!("agent \"{}\"", agent.node)))?;
            refs.push(target.clone());
            json!({"kind": "delegate_to", "agent": target})
        }
        Statement::Respond { literal } => json!({"kind": "respond", "literal": literal.node}),
    })
}

fn apply_environment(program: &Program, environment: &str, resources: &mut [IRResource]) -> Result<(), LowerError> {
    let env_resource = program
        .root_resources()
        .iter()
        .find(|r| r.name.node == environment && matches!(r.kind, ResourceKind::Environment(_)))
        .ok_or_else(|| LowerError::UnknownEnvironment(environment.to_string()))?;
    let ResourceKind::Environment(env) = &env_resource.kind else { unreachable!() };

    // Conflicts: two overlay entries targeting the same (fqn, attribute)
    // with different values. Applied in declaration order; a later entry
    // agreeing with the first is fine, disagreeing is an error (§4.7 step 2).
    let mut applied: BTreeMap<(String, String), Json> = BTreeMap::new();
    for entry in &env.overrides {
        apply_overlay_entry(program, environment, entry, resources, &mut applied)?;
    }
    Ok(())
}

fn apply_overlay_entry(
    program: &Program,
    environment: &str,
    entry: &OverlayEntry,
    resources: &mut [IRResource],
    applied: &mut BTreeMap<(String, String), Json>,
) -> Result<(), LowerError> {
    let kind_tag = capitalize_kind(&entry.target_kind);
    let fqn = resolve_reference(program, &kind_tag, &entry.target_name.node)
        .map_err(|_| LowerError::UnresolvedReference(format!("{} \"{}\"", kind_tag, entry.target_name.node)))?;
    let value = lower_value(&fqn, &entry.value.node)?;

    let key = (fqn.clone(), entry.attribute.node.clone());
    if let Some(previous) = applied.get(&key) {
        if previous != &value {
            return Err(LowerError::OverlayConflict {
                environment: environment.to_string(),
                fqn,
                attribute: entry.attribute.node.clone(),
                first: previous.to_string(),
                second: value.to_string(),
            });
        }
        return Ok(());
    }
    applied.insert(key, value.clone());

    if let Some(resource) = resources.iter_mut().find(|r| r.fqn == fqn) {
        resource.attributes.insert(entry.attribute.node.clone(), value);
    }
    Ok(())
}

fn capitalize_kind(word: &str) -> String {
    match word {
        "server" => "MCPServer".to_string(),
        "client" => "MCPClient".to_string(),
        "deploy" => "Binding".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}
