//! Wires the sandboxed WASM plugin host (§4.6) into the pipeline at every
//! point the data flow in §2 names: a pre-validate hook right after the
//! structural validator (C4), a post-validate hook right after the
//! semantic validator (C5), a `transform` hook after IR lowering (§4.7),
//! and a `pre_deploy` hook before the Apply Engine emits its first action.
//! Loading is best-effort: a project with no `<home>/.agentspec/plugins/*.wasm`
//! files runs the pipeline exactly as if this module didn't exist.

use agentspec_ir::IRDocument;
use agentspec_lang::ast::{IntentFile, Resource};
use agentspec_plugin::{HookStage, PluginBudget, PluginError, PluginHost};
use std::path::PathBuf;
use std::time::Duration;

pub struct Plugins {
    host: PluginHost,
}

impl Plugins {
    /// Load every `*.wasm` file under the plugin directory. Returns `None`
    /// when the directory doesn't exist — the common case for a project
    /// that hasn't installed any plugins.
    pub fn load(plugin_timeout_secs: u64, memory_pages: u32) -> Result<Option<Self>, PluginError> {
        let Some(dir) = plugins_dir() else { return Ok(None) };
        if !dir.is_dir() {
            return Ok(None);
        }

        let budget = PluginBudget { memory_pages, timeout: Duration::from_secs(1) }.with_timeout(Duration::from_secs(plugin_timeout_secs));
        let mut host = PluginHost::new(budget)?;

        let entries = std::fs::read_dir(&dir).map_err(|e| PluginError::Load { path: dir.display().to_string(), message: e.to_string() })?;
        let mut any = false;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "wasm") {
                host.load(&path)?;
                any = true;
            }
        }

        Ok(if any { Some(Self { host }) } else { None })
    }

    /// Run every loaded plugin's `validator` hook against every resource it
    /// declares it applies to, collecting every violation rather than
    /// stopping at the first plugin (§7 propagation policy applies here
    /// too — plugin violations accumulate alongside the validator's own).
    pub fn run_validators(&self, file: &IntentFile) -> Result<Vec<String>, PluginError> {
        let mut messages = Vec::new();
        for plugin in self.host.plugins() {
            for resource in &file.resources {
                if !plugin.manifest.capabilities.validators.iter().any(|k| k == resource.kind.tag()) {
                    continue;
                }
                let json = resource_json(resource);
                let result = self.host.validate(&plugin.name, &json)?;
                for violation in result.violations {
                    messages.push(format!("[{}] {}: {}", plugin.name, violation.code, violation.message));
                }
            }
        }
        Ok(messages)
    }

    /// Run every loaded plugin's `transform(stage = "compile")` hook over
    /// the lowered IR (§4.6, §4.7 "the lowering is re-entrant: transform
    /// hooks run after step 5"), merging each plugin's returned resources
    /// back into the document and re-hashing everything once all plugins
    /// have run.
    pub fn run_transforms(&self, ir: &mut IRDocument) -> Result<(), PluginError> {
        for plugin in self.host.plugins() {
            if !plugin.manifest.capabilities.transforms.iter().any(|stage| stage == "compile") {
                continue;
            }
            let mut merged = Vec::with_capacity(ir.resources.len());
            for resource in &ir.resources {
                let json = serde_json::to_value(resource).unwrap_or(serde_json::Value::Null);
                let result = self.host.transform(&plugin.name, &json)?;
                if result.resources.is_empty() {
                    merged.push(resource.clone());
                } else {
                    merged.extend(result.resources);
                }
            }
            ir.resources = merged;
        }

        for resource in &mut ir.resources {
            resource.recompute_hash();
        }
        ir.resources.sort_by(|a, b| (a.kind.as_str(), a.name.as_str()).cmp(&(b.kind.as_str(), b.name.as_str())));
        Ok(())
    }

    /// Run every loaded plugin's `pre_deploy` hook (§4.6) before the Apply
    /// Engine emits any action, collecting each plugin's log output rather
    /// than stopping at the first one.
    pub fn run_pre_deploy(&self, context: &serde_json::Value) -> Result<Vec<String>, PluginError> {
        let mut logs = Vec::new();
        for plugin in self.host.plugins() {
            if !plugin.manifest.capabilities.hooks.contains(&HookStage::PreDeploy) {
                continue;
            }
            let result = self.host.hook(&plugin.name, "pre_deploy", context)?;
            if !result.log.is_empty() {
                logs.push(format!("[{}] {}", plugin.name, result.log));
            }
        }
        Ok(logs)
    }
}

fn resource_json(resource: &Resource) -> serde_json::Value {
    serde_json::to_value(resource).unwrap_or(serde_json::Value::Null)
}

fn plugins_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".agentspec").join("plugins"))
}
