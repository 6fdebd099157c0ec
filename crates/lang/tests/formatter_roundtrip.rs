//! Golden-style idempotence checks for the canonical formatter across every
//! resource kind (§8 S5: `format(format(S)) == format(S)`).

use agentspec_lang::{format, parse};

fn assert_idempotent(source: &str) -> String {
    let ast = parse(source).unwrap_or_else(|e| panic!("parse failed: {e:?}\n{source}"));
    let once = format(&ast);
    let reparsed = parse(&once).unwrap_or_else(|e| panic!("reparse of formatted output failed: {e:?}\n{once}"));
    let twice = format(&reparsed);
    assert_eq!(once, twice, "formatting is not idempotent");
    once
}

#[test]
fn mcp_server_and_client_roundtrip() {
    let source = r#"
package "mcp-demo" version "0.1.0" lang "2.0"

skill "lookup" {
  tool command {
    binary "lookup"
  }
}

server "docs" {
  sse {
    url "https://docs.example.com/mcp"
    auth "bearer"
  }
  exposes skill "lookup"
}

client "host" {
  connects to server "docs"
}
"#;
    let out = assert_idempotent(source);
    assert!(out.contains("sse {"));
    assert!(out.contains("connects to server \"docs\""));
}

#[test]
fn tool_variants_roundtrip() {
    let source = r#"
package "tools" version "0.1.0" lang "2.0"

tool "cmd" {
  command {
    binary "run"
    args ["a", "b"]
  }
}

tool "web" {
  http {
    url "https://example.com"
  }
}

tool "raw" {
  inline {
    body "return 1"
  }
}

tool "bridge" {
  mcp {
    stdio {
      command "run-mcp"
    }
  }
}
"#;
    assert_idempotent(source);
}

#[test]
fn pipeline_and_environment_roundtrip() {
    let source = r#"
package "pipe" version "0.1.0" lang "2.0"

agent "a" {
  model "m"
}

pipeline "release" {
  step "first" {
    agent "a"
    parallel true
  }
  step "second" {
    agent "a"
    depends_on "first"
  }
}

environment "staging" {
  override agent "a" attribute "model" "gpt-3.5"
}
"#;
    assert_idempotent(source);
}

#[test]
fn type_variants_roundtrip() {
    let source = r#"
package "types" version "0.1.0" lang "2.0"

type "Status" enum {
  case "ok"
  case "error"
}

type "Address" struct {
  field "street" string
  field "zip" string
}

type "Tags" list string
"#;
    assert_idempotent(source);
}

#[test]
fn agent_control_flow_roundtrip() {
    let source = r#"
package "flow" version "0.1.0" lang "2.0"

skill "a" {
  tool command {
    binary "a"
  }
}

skill "b" {
  tool command {
    binary "b"
  }
}

agent "router" {
  model "m"
  uses skill "a"
  uses skill "b"

  on input {
    if "input.kind == \"a\"" {
      use skill "a"
    }
    else if "input.kind == \"b\"" {
      use skill "b" with {
        verbose: "true",
      }
    }
    else {
      respond "I don't understand."
    }

    for each item in "input.items" {
      delegate to "router"
    }
  }
}
"#;
    assert_idempotent(source);
}

#[test]
fn config_and_validation_roundtrip() {
    let source = r#"
package "cfg" version "0.1.0" lang "2.0"

agent "bot" {
  model "m"

  config {
    param "retries" type int required default 3
    param "api_key" type string required secret
  }

  validate {
    rule "cap" {
      severity warning
      message "retries should stay low"
      when "config.retries > 5"
      max_retries 1
    }
  }
}
"#;
    assert_idempotent(source);
}
