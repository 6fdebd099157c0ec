//! End-to-end coverage of the parse → structural-validate → format pipeline
//! for what's in scope for this crate (§8 scenarios S1 and S5; reference
//! resolution in S2 requires cross-resource context and lives in
//! `agentspec-semantic`'s own test suite).

use agentspec_lang::{format, parse, validate};

const S1_SOURCE: &str = r#"
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

#[test]
fn s1_happy_path_parses_and_validates_clean() {
    let file = parse(S1_SOURCE).expect("S1 source parses");
    let errors = validate(&file);
    assert!(errors.is_empty(), "unexpected structural errors: {errors:?}");

    assert_eq!(file.resources.len(), 4);

    let package = file.package.as_ref().expect("package header present").name.node.clone();
    let fqns: Vec<String> = file.resources.iter().map(|r| r.fqn(&package)).collect();
    assert_eq!(
        fqns,
        vec![
            "demo/Prompt/greet".to_string(),
            "demo/Skill/search".to_string(),
            "demo/Agent/bot".to_string(),
            "demo/Binding/local".to_string(),
        ]
    );
}

#[test]
fn s5_format_is_byte_stable_on_a_second_pass() {
    let file = parse(S1_SOURCE).expect("S1 source parses");
    let formatted_once = format(&file);

    let reparsed = parse(&formatted_once).unwrap_or_else(|e| {
        panic!("formatted output failed to reparse: {e:?}\n---\n{formatted_once}")
    });
    let formatted_twice = format(&reparsed);

    assert_eq!(formatted_once, formatted_twice, "format(format(S)) must equal format(S)");
    assert!(formatted_once.contains("\n\n"), "blank line expected between top-level blocks");
    let binary_line = formatted_once.lines().find(|l| l.trim_start() == "binary \"search\"").unwrap();
    let indent = binary_line.len() - binary_line.trim_start().len();
    assert_eq!(indent, 4, "binary is nested two levels deep under 2-space indent");
}

#[test]
fn recovery_preserves_well_formed_siblings() {
    let source = r#"
package "demo" version "0.1.0" lang "2.0"

prompt "broken" {
  this is not a valid body {{{
}

agent "bot" {
  model "m"
}
"#;
    let (file, errors) = agentspec_lang::parse_with_errors(source);
    assert!(!errors.is_empty());
    let file = file.expect("partial AST recovered despite the broken prompt");
    assert!(file.resources.iter().any(|r| r.name.node == "bot"));
}

#[test]
fn rejects_client_with_no_connections_with_hint_free_error() {
    let source = r#"
package "demo" version "0.1.0" lang "2.0"

client "orphan" {
}
"#;
    let file = parse(source).expect("parses despite being structurally invalid");
    let errors = validate(&file);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, "StructuralError");
    assert!(errors[0].hint.is_some());
}
