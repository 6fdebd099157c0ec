//! End-to-end coverage of the `agentspec` binary against the §8 scenarios.
//! S4 (partial failure recovery) is exercised at the `agentspec-state`
//! level (`crates/state/src/apply.rs`'s `partial_failure_marks_and_continues`)
//! since it needs a failing-then-succeeding `Adapter` test double, not a
//! CLI-observable condition. S6 (plugin timeout) needs a compiled `.wasm`
//! fixture this workspace has no toolchain access to produce, so it's
//! exercised at the `agentspec-plugin` host level instead.

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use tempfile::tempdir;

fn agentspec() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("agentspec").expect("binary `agentspec` should be built")
}

const HAPPY_PATH_SOURCE: &str = r#"
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

const UNRESOLVED_REFERENCE_SOURCE: &str = r#"
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
  uses skill "serch"
}
"#;

// ── S1: happy path ───────────────────────────────────────────────────────

#[test]
fn s1_validate_accepts_a_clean_package() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.ias"), HAPPY_PATH_SOURCE).unwrap();

    agentspec()
        .current_dir(dir.path())
        .args(["validate", "main.ias"])
        .assert()
        .success();
}

#[test]
fn s1_plan_against_empty_state_proposes_creates_for_every_resource() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.ias"), HAPPY_PATH_SOURCE).unwrap();

    agentspec()
        .current_dir(dir.path())
        .args(["plan", "main.ias"])
        .assert()
        .code(2)
        .stdout(contains("create"));
}

// ── S2: unresolved reference with a fuzzy suggestion ──────────────────────

#[test]
fn s2_validate_reports_unresolved_reference_with_a_hint() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.ias"), UNRESOLVED_REFERENCE_SOURCE).unwrap();

    agentspec()
        .current_dir(dir.path())
        .args(["validate", "main.ias"])
        .assert()
        .failure()
        .stdout(contains("serch"))
        .stdout(contains("did you mean \"search\""));
}

// ── S3: idempotent apply ─────────────────────────────────────────────────

#[test]
fn s3_second_apply_reports_no_changes() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.ias"), HAPPY_PATH_SOURCE).unwrap();

    agentspec()
        .current_dir(dir.path())
        .args(["apply", "main.ias", "--auto-approve"])
        .assert()
        .success();

    agentspec()
        .current_dir(dir.path())
        .args(["apply", "main.ias", "--auto-approve"])
        .assert()
        .success()
        .stdout(contains("no changes"));
}

#[test]
fn s3_apply_then_diff_reports_no_drift() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("main.ias"), HAPPY_PATH_SOURCE).unwrap();

    agentspec()
        .current_dir(dir.path())
        .args(["apply", "main.ias", "--auto-approve"])
        .assert()
        .success();

    agentspec()
        .current_dir(dir.path())
        .args(["diff", "main.ias"])
        .assert()
        .code(0);
}

// ── S5: formatter round-trip ──────────────────────────────────────────────

#[test]
fn s5_fmt_check_flags_unformatted_input_then_fmt_fixes_it() {
    let dir = tempdir().unwrap();
    let unformatted = "package \"demo\" version \"0.1.0\" lang \"2.0\"\nprompt \"greet\" { content \"Hello\" }\n";
    let file = dir.path().join("main.ias");
    fs::write(&file, unformatted).unwrap();

    agentspec().current_dir(dir.path()).args(["fmt", "--check", "main.ias"]).assert().code(1);

    agentspec().current_dir(dir.path()).args(["fmt", "main.ias"]).assert().success();

    agentspec().current_dir(dir.path()).args(["fmt", "--check", "main.ias"]).assert().success();
}

// ── migrate ────────────────────────────────────────────────────────────

#[test]
fn migrate_rewrites_legacy_keywords_and_version() {
    let dir = tempdir().unwrap();
    let legacy = "package \"demo\" version \"0.1.0\" lang \"1.0\"\n\nexecution \"old\" {\n}\n";
    let file = dir.path().join("main.ias");
    fs::write(&file, legacy).unwrap();

    agentspec().current_dir(dir.path()).args(["migrate", "main.ias"]).assert().success();

    let migrated = fs::read_to_string(&file).unwrap();
    assert!(migrated.contains("tool \"old\""));
    assert!(migrated.contains("lang \"2.0\""));
}

// ── help / version ────────────────────────────────────────────────────────

#[test]
fn help_flag_prints_usage() {
    agentspec().arg("--help").assert().success().stdout(contains("fmt")).stdout(contains("plan")).stdout(contains("apply"));
}
