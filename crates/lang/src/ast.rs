//! Abstract Syntax Tree types for IntentLang.
//!
//! Every node that can be the target of a diagnostic is wrapped in
//! [`Spanned`] so later stages (validation, IR lowering, the LSP-shaped
//! tooling a host embeds) can map back to exact source positions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A span in the source code represented as byte offsets.
pub type Span = Range<usize>;

/// A value with an associated source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned { node: f(self.node), span: self.span }
    }
}

/// A literal attribute value (the right-hand side of `key value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<Spanned<Value>>),
    /// A captured-but-uncompiled expression (see §4.11); compiled lazily.
    Expr(String),
}

/// A `{key: value}`-shaped attribute line, or a nested `key { ... }` block
/// represented recursively via `Value::List`/nested resource parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: Spanned<String>,
    pub value: Spanned<Value>,
}

/// `import "path" [as alias]` or `import "host/pkg" version "semver"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub path: Spanned<String>,
    pub version: Option<Spanned<String>>,
    pub alias: Option<Spanned<String>>,
    pub span: Span,
}

impl Import {
    /// Local imports are relative paths (`./` or `../`); everything else is
    /// a packaged import resolved through the host package fetcher.
    pub fn is_local(&self) -> bool {
        self.path.node.starts_with("./") || self.path.node.starts_with("../")
    }
}

/// `package "name" version "semver" lang "major.minor"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageHeader {
    pub name: Spanned<String>,
    pub version: Spanned<String>,
    pub lang_version: Spanned<String>,
    pub span: Span,
}

/// A reference written as `kind "name"` (e.g. `uses skill "search"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: String,
    pub name: Spanned<String>,
    pub span: Span,
}

/// ConfigParam entity (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParam {
    pub name: Spanned<String>,
    pub ty: Spanned<ParamType>,
    pub required: bool,
    pub default: Option<Spanned<Value>>,
    pub secret: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Int,
    Float,
    Bool,
}

/// ValidationRule entity (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub name: Spanned<String>,
    pub severity: Severity,
    pub message: Spanned<String>,
    pub when_expression: Spanned<String>,
    pub max_retries: Option<u32>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Control-flow tree parsed from an Agent's `on input { ... }` block (§6.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    If {
        cond: Spanned<String>,
        then_branch: Vec<Spanned<Statement>>,
        elifs: Vec<(Spanned<String>, Vec<Spanned<Statement>>)>,
        else_branch: Vec<Spanned<Statement>>,
    },
    ForEach {
        var: Spanned<String>,
        collection: Spanned<String>,
        body: Vec<Spanned<Statement>>,
    },
    UseSkill {
        name: Spanned<String>,
        args: IndexMap<String, Spanned<String>>,
    },
    DelegateTo {
        agent: Spanned<String>,
    },
    Respond {
        literal: Spanned<String>,
    },
}

/// Agent resource body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDef {
    pub model: Option<Spanned<String>>,
    pub uses_prompts: Vec<Reference>,
    pub uses_skills: Vec<Reference>,
    pub config_params: Vec<Spanned<ConfigParam>>,
    pub validation_rules: Vec<Spanned<ValidationRule>>,
    pub on_input: Vec<Spanned<Statement>>,
    pub attributes: Vec<Attribute>,
}

/// Prompt resource body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDef {
    pub content: Spanned<String>,
    pub attributes: Vec<Attribute>,
}

/// The executable shape a Tool (or inline skill tool) takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolSpec {
    Command { binary: Spanned<String>, args: Vec<Spanned<Value>> },
    Http { url: Spanned<String>, method: Option<Spanned<String>> },
    Inline { body: Spanned<String> },
    Mcp { transport: Spanned<Transport> },
}

/// Skill resource body. A skill either declares its tool inline or
/// references a standalone `Tool` resource by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub inline_tool: Option<Spanned<ToolSpec>>,
    pub uses_tool: Option<Reference>,
    pub attributes: Vec<Attribute>,
}

/// Standalone Tool resource body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    pub spec: Spanned<ToolSpec>,
    pub attributes: Vec<Attribute>,
}

/// Transport configuration shared by Tool(mcp), MCPServer and MCPClient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Transport {
    Stdio { command: Option<Spanned<String>> },
    Sse { url: Option<Spanned<String>>, auth: Option<Spanned<String>> },
    StreamableHttp { url: Option<Spanned<String>>, auth: Option<Spanned<String>> },
}

impl Transport {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Transport::Stdio { .. } => "stdio",
            Transport::Sse { .. } => "sse",
            Transport::StreamableHttp { .. } => "streamable-http",
        }
    }
}

/// MCPServer resource body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPServerDef {
    pub transport: Spanned<Transport>,
    pub exposes_skills: Vec<Reference>,
    pub attributes: Vec<Attribute>,
}

/// MCPClient resource body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPClientDef {
    pub connects_to_servers: Vec<Reference>,
    pub attributes: Vec<Attribute>,
}

/// Secret resource body: a literal value is only legal inside `env()`/`store()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecretSource {
    Env { var_name: Spanned<String> },
    Store { store_name: Spanned<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretDef {
    pub source: Spanned<SecretSource>,
}

/// Policy rule (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Deny,
    Require,
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicySubjectType {
    Model,
    Skill,
    Secret,
    PinnedImports,
    SignedPackages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub action: PolicyAction,
    pub subject_type: PolicySubjectType,
    pub subject_name: Option<Spanned<String>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDef {
    pub rules: Vec<PolicyRule>,
}

/// Environment overlay entry: `override <kind> "<name>" attribute "<attr>" <value>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayEntry {
    pub target_kind: String,
    pub target_name: Spanned<String>,
    pub attribute: Spanned<String>,
    pub value: Spanned<Value>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDef {
    pub overrides: Vec<OverlayEntry>,
}

/// Pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub name: Spanned<String>,
    pub agent: Reference,
    pub depends_on: Vec<Spanned<String>>,
    pub parallel: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
    pub steps: Vec<PipelineStep>,
}

/// Binding / deploy target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingDef {
    pub target: Spanned<String>,
    pub default: bool,
    pub attributes: Vec<Attribute>,
}

/// Plugin declaration (loads a WASM module pinned by semver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDef {
    pub version: Spanned<String>,
    pub attributes: Vec<Attribute>,
}

/// A `Type` resource: struct, enum, or list alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDef {
    Struct { fields: Vec<(Spanned<String>, Spanned<ParamType>)> },
    Enum { variants: Vec<Spanned<String>> },
    List { element: Spanned<ParamType> },
}

/// The tagged union of all resource kinds (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResourceKind {
    Agent(AgentDef),
    Prompt(PromptDef),
    Skill(SkillDef),
    Tool(ToolDef),
    MCPServer(MCPServerDef),
    MCPClient(MCPClientDef),
    Secret(SecretDef),
    Policy(PolicyDef),
    Environment(EnvironmentDef),
    Pipeline(PipelineDef),
    Binding(BindingDef),
    Plugin(PluginDef),
    Type(TypeDef),
}

impl ResourceKind {
    /// The kind tag used in FQNs (`package/Kind/name`) and diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            ResourceKind::Agent(_) => "Agent",
            ResourceKind::Prompt(_) => "Prompt",
            ResourceKind::Skill(_) => "Skill",
            ResourceKind::Tool(_) => "Tool",
            ResourceKind::MCPServer(_) => "MCPServer",
            ResourceKind::MCPClient(_) => "MCPClient",
            ResourceKind::Secret(_) => "Secret",
            ResourceKind::Policy(_) => "Policy",
            ResourceKind::Environment(_) => "Environment",
            ResourceKind::Pipeline(_) => "Pipeline",
            ResourceKind::Binding(_) => "Binding",
            ResourceKind::Plugin(_) => "Plugin",
            ResourceKind::Type(_) => "Type",
        }
    }
}

/// A single top-level resource block: `keyword "name" [modifiers] { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: Spanned<String>,
    pub kind: ResourceKind,
    pub span: Span,
}

impl Resource {
    pub fn fqn(&self, package: &str) -> String {
        format!("{}/{}/{}", package, self.kind.tag(), self.name.node)
    }
}

/// The root AST node: one parsed `.ias` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IntentFile {
    pub package: Option<PackageHeader>,
    pub imports: Vec<Import>,
    pub resources: Vec<Resource>,
}
