//! The plugin module contract (§6.5): every module exports `manifest()`
//! returning its declared capabilities, which the host reads once at load
//! time to decide what hooks to call it for and to detect conflicts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HookStage {
    Validator,
    Transform,
    PreDeploy,
}

impl HookStage {
    pub fn as_str(self) -> &'static str {
        match self {
            HookStage::Validator => "validator",
            HookStage::Transform => "transform",
            HookStage::PreDeploy => "pre_deploy",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Resource kinds this plugin's `validator` hook applies to.
    #[serde(default)]
    pub validators: Vec<String>,
    /// Compile stages this plugin's `transform` hook runs at (currently
    /// only `compile` is defined, §4.6).
    #[serde(default)]
    pub transforms: Vec<String>,
    #[serde(default)]
    pub hooks: Vec<HookStage>,
    /// Custom resource kinds this plugin introduces, if any.
    #[serde(default)]
    pub custom_kinds: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub code: String,
    pub message: String,
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidateResult {
    #[serde(default)]
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransformResult {
    #[serde(default)]
    pub resources: Vec<agentspec_ir::IRResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HookResult {
    #[serde(default)]
    pub log: String,
}
