//! One function per CLI subcommand (§6.4). Each returns the process exit
//! code its command specifies rather than calling `std::process::exit`
//! itself, so `main` stays the single place that terminates the process.

use crate::adapter::adapter_for;
use crate::config::RuntimeConfig;
use crate::diagnostics::{self, render_json, render_text};
use crate::pipeline;
use agentspec_semantic::PolicyMode;
use agentspec_state::{apply as run_apply, plan as run_plan, verify_plan_freshness, Plan, StateLock, StateStore};
use anyhow::Context;
use std::io::Write;
use std::path::{Path, PathBuf};

pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("json") {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

// ---- fmt -------------------------------------------------------------

pub fn fmt(files: &[PathBuf], check: bool, diff: bool) -> anyhow::Result<i32> {
    let files = resolve_ias_files(files)?;
    let mut would_change = false;

    for file in &files {
        let source = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
        let ast = agentspec_lang::parse(&source).map_err(|errors| anyhow::anyhow!("{}: {}", file.display(), errors.join("; ")))?;
        let formatted = agentspec_lang::format(&ast);

        if formatted == source {
            continue;
        }
        would_change = true;

        if diff {
            print_line_diff(&file.display().to_string(), &source, &formatted);
        }
        if !check {
            std::fs::write(file, &formatted).with_context(|| format!("writing {}", file.display()))?;
        }
    }

    Ok(if would_change && check { 1 } else { 0 })
}

fn print_line_diff(label: &str, before: &str, after: &str) {
    println!("--- {label}");
    println!("+++ {label}");
    let before_lines: Vec<&str> = before.lines().collect();
    let after_lines: Vec<&str> = after.lines().collect();
    for line in before_lines.iter().filter(|l| !after_lines.contains(l)) {
        println!("-{line}");
    }
    for line in after_lines.iter().filter(|l| !before_lines.contains(l)) {
        println!("+{line}");
    }
}

// ---- validate ----------------------------------------------------------

pub fn validate(files: &[PathBuf], config: &RuntimeConfig, format: OutputFormat) -> anyhow::Result<i32> {
    let files = resolve_ias_files(files)?;
    let mut all_ok = true;

    for file in &files {
        match pipeline::compile(file, PolicyMode::Enforce, config.plugin_timeout_secs, config.plugin_memory_pages) {
            Ok(_) => {}
            Err(diags) => {
                all_ok = false;
                match format {
                    OutputFormat::Text => print!("{}", render_text(&diags)),
                    OutputFormat::Json => println!("{}", render_json(&diags)),
                }
            }
        }
    }

    Ok(if all_ok { 0 } else { 1 })
}

// ---- plan ----------------------------------------------------------------

pub fn plan(
    entry: &Path,
    config: &RuntimeConfig,
    target: Option<&str>,
    environment: Option<&str>,
    out: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    let compiled = match pipeline::compile(entry, PolicyMode::Enforce, config.plugin_timeout_secs, config.plugin_memory_pages) {
        Ok(c) => c,
        Err(diags) => {
            eprint!("{}", render_text(&diags));
            return Ok(1);
        }
    };
    let ir = pipeline::lower(&compiled, environment)?;

    // Binding selection validates `--target`/default-binding resolution
    // even though `plan` itself doesn't need an adapter.
    agentspec_state::select_binding(&ir.bindings, target)?;

    let state = StateStore::load(&config.state_file)?;
    let computed = run_plan(&ir, &state);

    match format {
        OutputFormat::Text => print!("{}", computed.to_text()),
        OutputFormat::Json => println!("{}", computed.to_canonical_json()?),
    }

    if let Some(out_path) = out {
        std::fs::write(out_path, computed.to_canonical_json()?).with_context(|| format!("writing {}", out_path.display()))?;
    }

    Ok(if computed.is_empty() { 0 } else { 2 })
}

// ---- apply -----------------------------------------------------------

#[allow(clippy::too_many_arguments)]
pub fn apply(
    entry: &Path,
    config: &RuntimeConfig,
    target: Option<&str>,
    environment: Option<&str>,
    auto_approve: bool,
    plan_file: Option<&Path>,
    policy_mode: PolicyMode,
) -> anyhow::Result<i32> {
    let compiled = match pipeline::compile(entry, policy_mode, config.plugin_timeout_secs, config.plugin_memory_pages) {
        Ok(c) => c,
        Err(diags) => {
            eprint!("{}", render_text(&diags));
            return Ok(1);
        }
    };
    let ir = pipeline::lower(&compiled, environment)?;
    let binding = agentspec_state::select_binding(&ir.bindings, target)?.clone();
    let adapter = adapter_for(&binding.target)?;

    let _lock = StateLock::acquire(&config.state_file)?;
    let mut state = StateStore::load(&config.state_file)?;

    let computed = match plan_file {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            let loaded: Plan = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
            verify_plan_freshness(&loaded, &ir)?;
            loaded
        }
        None => run_plan(&ir, &state),
    };

    if computed.is_empty() {
        println!("no changes");
        return Ok(0);
    }

    if !auto_approve {
        print!("{}\nApply these {} action(s)? [y/N] ", computed.to_text(), computed.actions.len());
        std::io::stdout().flush().ok();
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("aborted");
            return Ok(1);
        }
    }

    if let Some(plugins) = &compiled.plugins {
        let context = serde_json::json!({
            "binding": binding.fqn,
            "target": binding.target,
            "actions": computed.actions.iter().map(|a| &a.fqn).collect::<Vec<_>>(),
        });
        for log in plugins.run_pre_deploy(&context)? {
            tracing::info!(%log, "pre_deploy hook");
        }
    }

    let summary = run_apply(&computed, &ir.resources, &adapter, &mut state)?;
    print!("{}", summary.to_text());

    Ok(if summary.all_succeeded() { 0 } else { 1 })
}

// ---- diff --------------------------------------------------------------

pub fn diff(entry: &Path, config: &RuntimeConfig, target: Option<&str>) -> anyhow::Result<i32> {
    let compiled = match pipeline::compile(entry, PolicyMode::Enforce, config.plugin_timeout_secs, config.plugin_memory_pages) {
        Ok(c) => c,
        Err(diags) => {
            eprint!("{}", render_text(&diags));
            return Ok(1);
        }
    };
    let ir = pipeline::lower(&compiled, None)?;
    agentspec_state::select_binding(&ir.bindings, target)?;

    let state = StateStore::load(&config.state_file)?;
    let computed = run_plan(&ir, &state);
    print!("{}", computed.to_text());

    Ok(if computed.is_empty() { 0 } else { 2 })
}

// ---- migrate -----------------------------------------------------------

/// One-way 1.0 -> 2.0 AST rewrite (§6.4): `execution` resources become
/// `tool`, legacy `binding` blocks become `deploy`, and the package header's
/// `lang "1.0"` becomes `lang "2.0"`. Operates on source text rather than
/// the current AST, since the 1.0 grammar this reads is not the grammar
/// `agentspec-lang` parses (see DESIGN.md).
pub fn migrate(files: &[PathBuf]) -> anyhow::Result<i32> {
    let keyword_execution = regex::Regex::new(r"(?m)^(\s*)execution\b").unwrap();
    let keyword_binding = regex::Regex::new(r"(?m)^(\s*)binding\b").unwrap();
    let lang_header = regex::Regex::new(r#"lang\s+"1\.0""#).unwrap();

    for file in resolve_ias_files(files)? {
        let source = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
        let mut migrated = keyword_execution.replace_all(&source, "${1}tool").into_owned();
        migrated = keyword_binding.replace_all(&migrated, "${1}deploy").into_owned();
        migrated = lang_header.replace(&migrated, r#"lang "2.0""#).into_owned();

        if migrated != source {
            std::fs::write(&file, migrated).with_context(|| format!("writing {}", file.display()))?;
            println!("migrated {}", file.display());
        }
    }

    Ok(0)
}

// ---- shared --------------------------------------------------------------

/// Files passed explicitly, or every `*.ias` in the current directory —
/// plan/apply/diff always take a single entry file instead (not every
/// `.ias` in a tree is a root package).
fn resolve_ias_files(files: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files.to_vec());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(".").context("reading current directory")? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "ias") {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
