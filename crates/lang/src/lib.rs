#![recursion_limit = "512"]

//! # agentspec-lang
//!
//! Lexer, parser, AST, structural validator and canonical formatter for
//! IntentLang, the declarative DSL AgentSpec compiles into deployable agent
//! systems. A `.ias` file is a sequence of brace-delimited resource blocks —
//! `keyword "name" [modifiers] { attribute_line* }` — drawn from a closed set
//! of thirteen kinds: Agent, Prompt, Skill, Tool, MCPServer, MCPClient,
//! Secret, Policy, Environment, Pipeline, Binding, Plugin, Type.
//!
//! This crate only covers what needs no cross-file context: lexing, parsing,
//! the AST, structural (per-resource) validation, and formatting. Reference
//! resolution, import graphs and policy evaluation live downstream in
//! `agentspec-semantic`; lowering to a content-addressed IR lives in
//! `agentspec-ir`.
//!
//! ## Quick start
//!
//! ```rust
//! use agentspec_lang::parse;
//!
//! let source = r#"
//! package "demo" version "0.1.0" lang "2.0"
//!
//! prompt "greet" {
//!   content "Hello! How can I help?"
//! }
//!
//! agent "bot" {
//!   model "gpt-4"
//!   uses prompt "greet"
//! }
//! "#;
//!
//! match agentspec_lang::parse(source) {
//!     Ok(file) => println!("parsed {} resources", file.resources.len()),
//!     Err(errors) => {
//!         for err in errors {
//!             eprintln!("{err}");
//!         }
//!     }
//! }
//! ```
//!
//! ## Module overview
//!
//! - [`ast`] — the typed tree a `.ias` file parses into.
//! - [`lexer`] — source text to a flat, brace-delimited token stream.
//! - [`parser`] — chumsky combinators turning tokens into an [`ast::IntentFile`].
//! - [`validation`] — structural checks that need no other file (§4.4).
//! - [`formatter`] — canonical AST-to-source rendering, `agentspec fmt`'s engine.
//! - [`error`] — shared diagnostic types and the ariadne-backed reporter.

pub mod ast;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod validation;

pub use ast::{IntentFile, Spanned};
pub use error::{AgentSpecError, Diagnostic, ErrorReporter, ValidationError};
pub use formatter::format;
pub use parser::{parse, parse_with_errors, parse_with_structured_errors};
pub use validation::validate;

/// Parse and structurally validate source in one call — the shape
/// `agentspec validate` needs: a clean parse with zero validation errors is
/// the only success case.
pub fn parse_and_validate(source: &str) -> Result<IntentFile, Vec<String>> {
    let file = parse(source)?;
    let errors = validate(&file);
    if errors.is_empty() {
        Ok(file)
    } else {
        Err(errors.into_iter().map(|e| e.message).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_validate_accepts_minimal_package() {
        let source = r#"package "demo" version "0.1.0" lang "2.0""#;
        assert!(parse_and_validate(source).is_ok());
    }

    #[test]
    fn parse_and_validate_surfaces_structural_errors() {
        let source = r#"
package "demo" version "0.1.0" lang "2.0"

client "orphan" {
}
"#;
        let result = parse_and_validate(source);
        assert!(result.is_err());
    }
}
