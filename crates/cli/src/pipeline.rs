//! Drives the front-end pipeline (§2: C1 → C2 → C3 → C4 → C6(pre) → C5 →
//! C6(post)) for a single root `.ias` file, the shape every CLI command
//! needs before it can do its own work.

use crate::diagnostics::{self, Diag};
use crate::loader::FsPackageLoader;
use crate::plugins::Plugins;
use agentspec_ir::IRDocument;
use agentspec_semantic::{resolve_imports, validate, Program};
use std::path::Path;

pub struct Compiled {
    pub program: Program,
    pub source: String,
    pub plugins: Option<Plugins>,
}

/// Parse, resolve imports, and run both validator phases plus any loaded
/// plugin validator hooks for `path`. Returns every diagnostic collected
/// across all phases (§7: lexer/parser errors abort before validation;
/// validator errors accumulate fully).
pub fn compile(
    path: &Path,
    policy_mode: agentspec_semantic::PolicyMode,
    plugin_timeout_secs: u64,
    plugin_memory_pages: u32,
) -> Result<Compiled, Vec<Diag>> {
    let file_label = path.display().to_string();
    let source = std::fs::read_to_string(path)
        .map_err(|e| vec![Diag { file: file_label.clone(), line: 1, col: 1, code: "IoError".into(), message: format!("{e}"), hint: None }])?;

    let (ast, parse_errors) = agentspec_lang::parser::parse_with_structured_errors_all(&source);
    if !parse_errors.is_empty() {
        return Err(diagnostics::from_parse_errors(&file_label, &source, &parse_errors));
    }
    let ast = ast.expect("no parse errors implies a parsed AST");

    let structural_errors = agentspec_lang::validate(&ast);
    if !structural_errors.is_empty() {
        return Err(diagnostics::from_validation_errors(&file_label, &source, &structural_errors));
    }

    let plugins = Plugins::load(plugin_timeout_secs, plugin_memory_pages)
        .map_err(|e| plugin_diag(&file_label, &e))?;

    if let Some(plugins) = &plugins {
        run_plugin_validators(&file_label, plugins, &ast)?; // pre-validate hook, C6 before C5
    }

    let (root_name, root_version) = match &ast.package {
        Some(header) => (header.name.node.clone(), header.version.node.clone()),
        None => ("unnamed".to_string(), "0.0.0".to_string()),
    };

    let loader = FsPackageLoader::new(path);
    let (program, _lockfile) = resolve_imports(&root_name, &root_version, &ast, &loader).map_err(|e| {
        diagnostics::from_semantic_errors(&file_label, &source, std::slice::from_ref(&e))
    })?;

    let semantic_errors = validate(&program, policy_mode);
    let hard_errors: Vec<_> = semantic_errors.iter().filter(|e| !e.is_warning()).cloned().collect();
    if !hard_errors.is_empty() {
        return Err(diagnostics::from_semantic_errors(&file_label, &source, &hard_errors));
    }
    for warning in semantic_errors.iter().filter(|e| e.is_warning()) {
        tracing::warn!(%warning, "policy warning");
    }

    if let Some(plugins) = &plugins {
        run_plugin_validators(&file_label, plugins, &ast)?; // post-validate hook, C6 after C5
    }

    Ok(Compiled { program, source, plugins })
}

fn run_plugin_validators(file_label: &str, plugins: &Plugins, ast: &agentspec_lang::IntentFile) -> Result<(), Vec<Diag>> {
    let violations = plugins.run_validators(ast).map_err(|e| plugin_diag(file_label, &e))?;
    if violations.is_empty() {
        return Ok(());
    }
    Err(violations
        .into_iter()
        .map(|message| Diag { file: file_label.to_string(), line: 1, col: 1, code: "PluginError".into(), message, hint: None })
        .collect())
}

fn plugin_diag(file_label: &str, error: &agentspec_plugin::PluginError) -> Vec<Diag> {
    vec![Diag { file: file_label.to_string(), line: 1, col: 1, code: "PluginError".into(), message: error.to_string(), hint: None }]
}

/// Lower a compiled program to IR, optionally applying an environment
/// overlay (§4.7), then run every loaded plugin's `transform` hook over the
/// result (§4.6) — lowering itself stays a pure function of
/// `(program, environment)`; the plugin host lives in this crate, not in
/// `agentspec-ir` (which `agentspec-plugin` itself depends on), so this is
/// the seam where the re-entrant step happens.
pub fn lower(compiled: &Compiled, environment: Option<&str>) -> anyhow::Result<IRDocument> {
    let mut ir = agentspec_ir::lower(&compiled.program, environment).map_err(|e| anyhow::anyhow!("{e}"))?;
    if let Some(plugins) = &compiled.plugins {
        plugins.run_transforms(&mut ir)?;
    }
    Ok(ir)
}
