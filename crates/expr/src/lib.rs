//! # agentspec-expr
//!
//! The guard-expression sublanguage that powers `when`, `if`, `for each …
//! in`, validation-rule conditions and eval scoring thresholds (§4.11): a
//! small closed interpreter with no function definitions, no I/O, no loops,
//! and a termination guarantee by construction (the AST cannot reference
//! itself).
//!
//! Two phases, matching the rest of the compiler:
//! - **Compile** ([`compile`]): source text → [`ast::Expr`], rejecting
//!   syntax errors at the point the expression is authored.
//! - **Evaluate** ([`eval::eval`]): a compiled program against a
//!   [`context::Context`] snapshot (`input`/`output`/`session`/`steps`/`config`),
//!   producing a [`value::Value`]. Evaluation never fails: missing
//!   properties resolve to `Value::Missing`, and any comparison touching a
//!   missing value is `false`.

pub mod ast;
pub mod compiler;
pub mod context;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use compiler::{compile, static_check, CompiledExpression};
pub use context::Context;
pub use error::ExpressionError;
pub use eval::eval;
pub use value::Value;
