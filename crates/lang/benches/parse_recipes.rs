//! Benchmarks for parsing IntentLang sources.
//!
//! Run with: cargo bench
//! Results are saved to target/criterion/

use agentspec_lang::{format, parse};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

const SMALL: &str = r#"
package "hello" version "0.1.0" lang "2.0"

prompt "greet" {
  content "Hello! How can I help you today?"
}

agent "bot" {
  model "gpt-4"
  uses prompt "greet"
}
"#;

const MEDIUM: &str = r#"
package "support" version "1.2.0" lang "2.0"

import "shared/prompts" version "1.0.0" as shared

secret "openai_key" {
  env "OPENAI_API_KEY"
}

prompt "triage" {
  content "Classify the customer's request and route it to the right skill."
}

tool "order_lookup" {
  http {
    url "https://api.example.com/orders"
    method "GET"
  }
}

skill "lookup_order" {
  uses tool "order_lookup"
}

skill "refund" {
  tool command {
    binary "refund-cli"
    args ["--dry-run"]
  }
}

agent "support_bot" {
  model "gpt-4"
  uses prompt "triage"
  uses skill "lookup_order"
  uses skill "refund"

  config {
    param "max_refund_usd" type float required
    param "api_key" type string required secret
  }

  validate {
    rule "refund_cap" {
      severity error
      message "refund exceeds configured cap"
      when "input.amount > config.max_refund_usd"
    }
  }

  on input {
    if "input.intent == \"refund\"" {
      use skill "refund" with {
        order_id: "input.order_id",
      }
    }
    else {
      use skill "lookup_order"
    }
  }
}

policy "guardrails" {
  rule deny skill "refund"
  rule require pinned_imports
}

deploy "prod" target "kubernetes" {
  default true
}
"#;

fn large_source() -> String {
    let mut out = String::from("package \"catalog\" version \"2.0.0\" lang \"2.0\"\n\n");
    for i in 0..40 {
        out.push_str(&format!(
            "prompt \"prompt_{i}\" {{\n  content \"Static prompt body number {i} used for benchmarking parser throughput.\"\n}}\n\n"
        ));
        out.push_str(&format!(
            "tool \"tool_{i}\" {{\n  command {{\n    binary \"worker-{i}\"\n    args [\"--id\", \"{i}\"]\n  }}\n}}\n\n"
        ));
        out.push_str(&format!(
            "skill \"skill_{i}\" {{\n  uses tool \"tool_{i}\"\n}}\n\n"
        ));
        out.push_str(&format!(
            "agent \"agent_{i}\" {{\n  model \"gpt-4\"\n  uses prompt \"prompt_{i}\"\n  uses skill \"skill_{i}\"\n}}\n\n"
        ));
    }
    out
}

fn recipes() -> Vec<(&'static str, String)> {
    vec![
        ("small", SMALL.to_string()),
        ("medium", MEDIUM.to_string()),
        ("large", large_source()),
    ]
}

fn bench_parse_all(c: &mut Criterion) {
    let recipes = recipes();
    let total_bytes: usize = recipes.iter().map(|(_, content)| content.len()).sum();

    let mut group = c.benchmark_group("parse_all_recipes");
    group.throughput(Throughput::Bytes(total_bytes as u64));

    group.bench_function("parse", |b| {
        b.iter(|| {
            for (_, content) in &recipes {
                let _ = black_box(parse(content));
            }
        });
    });

    group.bench_function("parse_and_serialize_json", |b| {
        b.iter(|| {
            for (_, content) in &recipes {
                if let Ok(ast) = parse(content) {
                    let _ = black_box(serde_json::to_string(&ast));
                }
            }
        });
    });

    group.finish();
}

fn bench_individual_recipes(c: &mut Criterion) {
    let recipes = recipes();

    let mut parse_group = c.benchmark_group("parse_individual");
    for (name, content) in &recipes {
        parse_group.throughput(Throughput::Bytes(content.len() as u64));
        parse_group.bench_with_input(BenchmarkId::new("parse", *name), content, |b, content| {
            b.iter(|| black_box(parse(content)));
        });
    }
    parse_group.finish();

    let mut format_group = c.benchmark_group("format_individual");
    for (name, content) in &recipes {
        if let Ok(ast) = parse(content) {
            format_group.throughput(Throughput::Bytes(content.len() as u64));
            format_group.bench_with_input(BenchmarkId::new("format", *name), &ast, |b, ast| {
                b.iter(|| black_box(format(ast)));
            });
        }
    }
    format_group.finish();
}

criterion_group!(benches, bench_parse_all, bench_individual_recipes);
criterion_main!(benches);
