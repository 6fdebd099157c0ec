//! Canonical formatter (§4.12): AST → IntentLang source text.
//!
//! One resource per top-level block with a blank line between, two-space
//! indentation, and catch-all attributes in sorted-key order so that two
//! structurally-identical ASTs always format to the same text. The central
//! property this module exists to uphold is round-trip idempotence:
//! `format(parse(format(ast))) == format(ast)` (§8 invariant 1).

use crate::ast::*;
use indexmap::IndexMap;
use std::fmt::Write as _;

/// Format a parsed file back into canonical IntentLang source.
pub fn format(file: &IntentFile) -> String {
    let mut w = Writer::new();
    w.write_file(file);
    w.finish()
}

struct Writer {
    out: String,
    indent: usize,
}

impl Writer {
    fn new() -> Self {
        Self { out: String::new(), indent: 0 }
    }

    fn finish(self) -> String {
        self.out
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        let _ = writeln!(self.out, "{text}");
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn write_file(&mut self, file: &IntentFile) {
        if let Some(pkg) = &file.package {
            self.line(&format!(
                "package \"{}\" version \"{}\" lang \"{}\"",
                escape(&pkg.name.node),
                escape(&pkg.version.node),
                escape(&pkg.lang_version.node)
            ));
        }

        if !file.imports.is_empty() {
            self.blank();
            for import in &file.imports {
                self.write_import(import);
            }
        }

        for resource in &file.resources {
            self.blank();
            self.write_resource(resource);
        }
    }

    fn write_import(&mut self, import: &Import) {
        let mut line = format!("import \"{}\"", escape(&import.path.node));
        if let Some(version) = &import.version {
            let _ = write!(line, " version \"{}\"", escape(&version.node));
        }
        if let Some(alias) = &import.alias {
            let _ = write!(line, " as {}", alias.node);
        }
        self.line(&line);
    }

    fn write_resource(&mut self, resource: &Resource) {
        let name = escape(&resource.name.node);
        match &resource.kind {
            ResourceKind::Agent(def) => {
                self.line(&format!("agent \"{name}\" {{"));
                self.indent();
                self.write_agent_body(def);
                self.dedent();
                self.line("}");
            }
            ResourceKind::Prompt(def) => {
                self.line(&format!("prompt \"{name}\" {{"));
                self.indent();
                self.line(&format!("content \"{}\"", escape(&def.content.node)));
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::Skill(def) => {
                self.line(&format!("skill \"{name}\" {{"));
                self.indent();
                if let Some(reference) = &def.uses_tool {
                    self.line(&format!("uses tool \"{}\"", escape(&reference.name.node)));
                }
                if let Some(tool) = &def.inline_tool {
                    self.write_tool_spec("tool ", &tool.node);
                }
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::Tool(def) => {
                self.line(&format!("tool \"{name}\" {{"));
                self.indent();
                self.write_tool_spec("", &def.spec.node);
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::MCPServer(def) => {
                self.line(&format!("server \"{name}\" {{"));
                self.indent();
                self.write_transport(&def.transport.node);
                for exposed in &def.exposes_skills {
                    self.line(&format!("exposes skill \"{}\"", escape(&exposed.name.node)));
                }
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::MCPClient(def) => {
                self.line(&format!("client \"{name}\" {{"));
                self.indent();
                for server in &def.connects_to_servers {
                    self.line(&format!("connects to server \"{}\"", escape(&server.name.node)));
                }
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::Secret(def) => {
                self.line(&format!("secret \"{name}\" {{"));
                self.indent();
                match &def.source.node {
                    SecretSource::Env { var_name } => {
                        self.line(&format!("env \"{}\"", escape(&var_name.node)))
                    }
                    SecretSource::Store { store_name } => {
                        self.line(&format!("store \"{}\"", escape(&store_name.node)))
                    }
                }
                self.dedent();
                self.line("}");
            }
            ResourceKind::Policy(def) => {
                self.line(&format!("policy \"{name}\" {{"));
                self.indent();
                for rule in &def.rules {
                    let action = policy_action_text(rule.action);
                    let subject = policy_subject_text(&rule.subject_type);
                    match &rule.subject_name {
                        Some(subject_name) => self.line(&format!(
                            "rule {action} {subject} \"{}\"",
                            escape(&subject_name.node)
                        )),
                        None => self.line(&format!("rule {action} {subject}")),
                    }
                }
                self.dedent();
                self.line("}");
            }
            ResourceKind::Environment(def) => {
                self.line(&format!("environment \"{name}\" {{"));
                self.indent();
                for entry in &def.overrides {
                    self.line(&format!(
                        "override {} \"{}\" attribute \"{}\" {}",
                        entry.target_kind,
                        escape(&entry.target_name.node),
                        escape(&entry.attribute.node),
                        render_value(&entry.value.node)
                    ));
                }
                self.dedent();
                self.line("}");
            }
            ResourceKind::Pipeline(def) => {
                self.line(&format!("pipeline \"{name}\" {{"));
                self.indent();
                for step in &def.steps {
                    self.line(&format!("step \"{}\" {{", escape(&step.name.node)));
                    self.indent();
                    self.line(&format!("agent \"{}\"", escape(&step.agent.name.node)));
                    for dep in &step.depends_on {
                        self.line(&format!("depends_on \"{}\"", escape(&dep.node)));
                    }
                    if step.parallel {
                        self.line("parallel true");
                    }
                    self.dedent();
                    self.line("}");
                }
                self.dedent();
                self.line("}");
            }
            ResourceKind::Binding(def) => {
                self.line(&format!("deploy \"{name}\" target \"{}\" {{", escape(&def.target.node)));
                self.indent();
                if def.default {
                    self.line("default true");
                }
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::Plugin(def) => {
                self.line(&format!("plugin \"{name}\" {{"));
                self.indent();
                self.line(&format!("version \"{}\"", escape(&def.version.node)));
                self.write_attrs(&def.attributes);
                self.dedent();
                self.line("}");
            }
            ResourceKind::Type(def) => match def {
                TypeDef::Struct { fields } => {
                    self.line(&format!("type \"{name}\" struct {{"));
                    self.indent();
                    for (field_name, ty) in fields {
                        self.line(&format!(
                            "field \"{}\" {}",
                            escape(&field_name.node),
                            param_type_text(ty.node)
                        ));
                    }
                    self.dedent();
                    self.line("}");
                }
                TypeDef::Enum { variants } => {
                    self.line(&format!("type \"{name}\" enum {{"));
                    self.indent();
                    for variant in variants {
                        self.line(&format!("case \"{}\"", escape(&variant.node)));
                    }
                    self.dedent();
                    self.line("}");
                }
                TypeDef::List { element } => {
                    self.line(&format!("type \"{name}\" list {}", param_type_text(element.node)));
                }
            },
        }
    }

    fn write_agent_body(&mut self, def: &AgentDef) {
        if let Some(model) = &def.model {
            self.line(&format!("model \"{}\"", escape(&model.node)));
        }
        for prompt in &def.uses_prompts {
            self.line(&format!("uses prompt \"{}\"", escape(&prompt.name.node)));
        }
        for skill in &def.uses_skills {
            self.line(&format!("uses skill \"{}\"", escape(&skill.name.node)));
        }
        if !def.config_params.is_empty() {
            self.line("config {");
            self.indent();
            for param in &def.config_params {
                self.write_config_param(&param.node);
            }
            self.dedent();
            self.line("}");
        }
        if !def.validation_rules.is_empty() {
            self.line("validate {");
            self.indent();
            for rule in &def.validation_rules {
                self.write_validation_rule(&rule.node);
            }
            self.dedent();
            self.line("}");
        }
        if !def.on_input.is_empty() {
            self.line("on input {");
            self.indent();
            for stmt in &def.on_input {
                self.write_statement(&stmt.node);
            }
            self.dedent();
            self.line("}");
        }
        self.write_attrs(&def.attributes);
    }

    fn write_config_param(&mut self, param: &ConfigParam) {
        let mut line = format!(
            "param \"{}\" type {}",
            escape(&param.name.node),
            param_type_text(param.ty.node)
        );
        if param.required {
            line.push_str(" required");
        }
        if param.secret {
            line.push_str(" secret");
        }
        if let Some(default) = &param.default {
            let _ = write!(line, " default {}", render_value(&default.node));
        }
        self.line(&line);
    }

    fn write_validation_rule(&mut self, rule: &ValidationRule) {
        self.line(&format!("rule \"{}\" {{", escape(&rule.name.node)));
        self.indent();
        self.line(&format!("severity {}", severity_text(rule.severity)));
        self.line(&format!("message \"{}\"", escape(&rule.message.node)));
        self.line(&format!("when \"{}\"", escape(&rule.when_expression.node)));
        if let Some(max_retries) = rule.max_retries {
            self.line(&format!("max_retries {max_retries}"));
        }
        self.dedent();
        self.line("}");
    }

    fn write_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::If { cond, then_branch, elifs, else_branch } => {
                self.line(&format!("if \"{}\" {{", escape(&cond.node)));
                self.indent();
                for s in then_branch {
                    self.write_statement(&s.node);
                }
                self.dedent();
                self.line("}");
                for (econd, ebody) in elifs {
                    self.line(&format!("else if \"{}\" {{", escape(&econd.node)));
                    self.indent();
                    for s in ebody {
                        self.write_statement(&s.node);
                    }
                    self.dedent();
                    self.line("}");
                }
                if !else_branch.is_empty() {
                    self.line("else {");
                    self.indent();
                    for s in else_branch {
                        self.write_statement(&s.node);
                    }
                    self.dedent();
                    self.line("}");
                }
            }
            Statement::ForEach { var, collection, body } => {
                self.line(&format!("for each {} in \"{}\" {{", var.node, escape(&collection.node)));
                self.indent();
                for s in body {
                    self.write_statement(&s.node);
                }
                self.dedent();
                self.line("}");
            }
            Statement::UseSkill { name, args } => {
                if args.is_empty() {
                    self.line(&format!("use skill \"{}\"", escape(&name.node)));
                } else {
                    self.line(&format!("use skill \"{}\" with {{", escape(&name.node)));
                    self.indent();
                    self.write_with_args(args);
                    self.dedent();
                    self.line("}");
                }
            }
            Statement::DelegateTo { agent } => {
                self.line(&format!("delegate to \"{}\"", escape(&agent.node)));
            }
            Statement::Respond { literal } => {
                self.line(&format!("respond \"{}\"", escape(&literal.node)));
            }
        }
    }

    fn write_with_args(&mut self, args: &IndexMap<String, Spanned<String>>) {
        let mut keys: Vec<&String> = args.keys().collect();
        keys.sort();
        for key in keys {
            let value = &args[key];
            self.line(&format!("{key}: \"{}\",", escape(&value.node)));
        }
    }

    fn write_transport(&mut self, transport: &Transport) {
        match transport {
            Transport::Stdio { command } => {
                self.line("stdio {");
                self.indent();
                if let Some(command) = command {
                    self.line(&format!("command \"{}\"", escape(&command.node)));
                }
                self.dedent();
                self.line("}");
            }
            Transport::Sse { url, auth } => {
                self.line("sse {");
                self.indent();
                self.write_url_auth(url, auth);
                self.dedent();
                self.line("}");
            }
            Transport::StreamableHttp { url, auth } => {
                self.line("streamable_http {");
                self.indent();
                self.write_url_auth(url, auth);
                self.dedent();
                self.line("}");
            }
        }
    }

    fn write_url_auth(&mut self, url: &Option<Spanned<String>>, auth: &Option<Spanned<String>>) {
        if let Some(url) = url {
            self.line(&format!("url \"{}\"", escape(&url.node)));
        }
        if let Some(auth) = auth {
            self.line(&format!("auth \"{}\"", escape(&auth.node)));
        }
    }

    /// `prefix` is `"tool "` for a skill's inline tool (where the surrounding
    /// grammar is `tool <kind> { ... }`) and `""` for a standalone `Tool`
    /// resource (whose name already consumed the `tool` keyword).
    fn write_tool_spec(&mut self, prefix: &str, spec: &ToolSpec) {
        match spec {
            ToolSpec::Command { binary, args } => {
                self.line(&format!("{prefix}command {{"));
                self.indent();
                self.line(&format!("binary \"{}\"", escape(&binary.node)));
                if !args.is_empty() {
                    let rendered: Vec<String> = args.iter().map(|a| render_value(&a.node)).collect();
                    self.write_array_attr("args", &rendered);
                }
                self.dedent();
                self.line("}");
            }
            ToolSpec::Http { url, method } => {
                self.line(&format!("{prefix}http {{"));
                self.indent();
                self.line(&format!("url \"{}\"", escape(&url.node)));
                if let Some(method) = method {
                    self.line(&format!("method \"{}\"", escape(&method.node)));
                }
                self.dedent();
                self.line("}");
            }
            ToolSpec::Inline { body } => {
                self.line(&format!("{prefix}inline {{"));
                self.indent();
                self.line(&format!("body \"{}\"", escape(&body.node)));
                self.dedent();
                self.line("}");
            }
            ToolSpec::Mcp { transport } => {
                self.line(&format!("{prefix}mcp {{"));
                self.indent();
                self.write_transport(&transport.node);
                self.dedent();
                self.line("}");
            }
        }
    }

    /// Catch-all forward-compatible attributes, in sorted-key order so
    /// semantically identical resources always format identically (§4.12).
    fn write_attrs(&mut self, attributes: &[Attribute]) {
        let mut sorted: Vec<&Attribute> = attributes.iter().collect();
        sorted.sort_by(|a, b| a.key.node.cmp(&b.key.node));
        for attr in sorted {
            self.line(&format!("{} {}", attr.key.node, render_value(&attr.value.node)));
        }
    }

    /// Arrays break across lines iff any element's rendered text exceeds 40
    /// characters (§4.12).
    fn write_array_attr(&mut self, key: &str, rendered: &[String]) {
        if rendered.iter().any(|v| v.len() > 40) {
            self.line(&format!("{key} ["));
            self.indent();
            for item in rendered {
                self.line(&format!("{item},"));
            }
            self.dedent();
            self.line("]");
        } else {
            self.line(&format!("{key} [{}]", rendered.join(", ")));
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape(s)),
        Value::Number(n) => format_number(*n),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => {
            let rendered: Vec<String> = items.iter().map(|i| render_value(&i.node)).collect();
            if rendered.iter().any(|v| v.len() > 40) {
                format!("[\n  {}\n]", rendered.join(",\n  "))
            } else {
                format!("[{}]", rendered.join(", "))
            }
        }
        // Not produced by the current grammar (expressions are captured as
        // quoted strings on their owning AST field); kept for forward
        // compatibility with hand-built ASTs.
        Value::Expr(s) => format!("\"{}\"", escape(s)),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

fn severity_text(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

fn param_type_text(ty: ParamType) -> &'static str {
    match ty {
        ParamType::String => "string",
        ParamType::Int => "int",
        ParamType::Float => "float",
        ParamType::Bool => "bool",
    }
}

fn policy_action_text(action: PolicyAction) -> &'static str {
    match action {
        PolicyAction::Deny => "deny",
        PolicyAction::Require => "require",
        PolicyAction::Allow => "allow",
    }
}

fn policy_subject_text(subject: &PolicySubjectType) -> &'static str {
    match subject {
        PolicySubjectType::Model => "model",
        PolicySubjectType::Skill => "skill",
        PolicySubjectType::Secret => "secret",
        PolicySubjectType::PinnedImports => "pinned_imports",
        PolicySubjectType::SignedPackages => "signed_packages",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn roundtrip(source: &str) -> (String, String) {
        let ast = parse(source).expect("parse");
        let formatted = format(&ast);
        let reparsed = parse(&formatted).unwrap_or_else(|e| panic!("reparse failed: {e:?}\n{formatted}"));
        let formatted_again = format(&reparsed);
        (formatted, formatted_again)
    }

    #[test]
    fn idempotent_on_s1_happy_path() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

prompt "greet" {
  content "Hello"
}

skill "search" {
  tool command {
    binary "search"
  }
}

agent "bot" {
  model "m"
  uses prompt "greet"
  uses skill "search"
}

deploy "local" target "process" {
  default true
}
"#;
        let (first, second) = roundtrip(source);
        assert_eq!(first, second);
    }

    #[test]
    fn formats_policy_rules_and_types() {
        let source = r#"
package "demo" version "1.0.0" lang "2.0"

policy "guardrails" {
  rule deny skill "dangerous"
  rule require pinned_imports
}

type "Status" enum {
  case "ok"
  case "error"
}
"#;
        let (first, second) = roundtrip(source);
        assert_eq!(first, second);
        assert!(first.contains("rule deny skill \"dangerous\""));
        assert!(first.contains("rule require pinned_imports"));
    }

    #[test]
    fn sorts_catchall_attributes() {
        let source = r#"
package "demo" version "1.0.0" lang "2.0"

prompt "p" {
  content "hi"
  zeta 1
  alpha 2
}
"#;
        let ast = parse(source).expect("parse");
        let text = format(&ast);
        let alpha_pos = text.find("alpha").unwrap();
        let zeta_pos = text.find("zeta").unwrap();
        assert!(alpha_pos < zeta_pos);
    }
}
