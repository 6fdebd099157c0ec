//! §8 scenario S1 lowered through to the IR: four resources, sorted by
//! `(kind, name)`, each FQN exactly as the structural-validator test in
//! `agentspec-lang` already expects.

use agentspec_ir::lower;
use agentspec_lang::parse;
use agentspec_semantic::{Package, Program};

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

fn program() -> Program {
    let file = parse(S1_SOURCE).expect("S1 source parses");
    Program::new(Package { name: "demo".into(), version: "0.1.0".into(), file }, vec![])
}

#[test]
fn s1_lowers_to_four_sorted_resources() {
    let doc = lower(&program(), None).expect("S1 lowers cleanly");

    assert_eq!(doc.resources.len(), 3); // deploy -> bindings[], not resources[]
    assert_eq!(doc.bindings.len(), 1);

    let fqns: Vec<&str> = doc.resources.iter().map(|r| r.fqn.as_str()).collect();
    assert_eq!(fqns, vec!["demo/Agent/bot", "demo/Prompt/greet", "demo/Skill/search"]);
    assert_eq!(doc.bindings[0].fqn, "demo/Binding/local");
    assert!(doc.bindings[0].default);
}

#[test]
fn resource_hash_matches_sha256_of_canonical_attributes() {
    let doc = lower(&program(), None).unwrap();
    let greet = doc.resources.iter().find(|r| r.name == "greet").unwrap();
    let expected = agentspec_ir::canonical::content_hash(&agentspec_ir::canonical::to_canonical_string(
        &serde_json::json!(greet.attributes),
    ));
    assert_eq!(greet.hash, expected);
}

#[test]
fn identical_sources_lower_to_byte_identical_ir() {
    let a = lower(&program(), None).unwrap().to_canonical_json().unwrap();
    let b = lower(&program(), None).unwrap().to_canonical_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn unresolved_reference_after_validation_is_a_lowering_error() {
    let source = r#"
package "demo" version "0.1.0" lang "2.0"

agent "bot" {
  uses skill "missing"
}
"#;
    let file = parse(source).unwrap();
    let program = Program::new(Package { name: "demo".into(), version: "0.1.0".into(), file }, vec![]);
    assert!(lower(&program, None).is_err());
}
