//! `agentspec` — a thin facade over the split crates, for downstream
//! consumers who want one dependency instead of six.
//!
//! The CLI (`agentspec-cli`, binary `agentspec`) depends on the split
//! crates directly; this facade exists for library consumers embedding
//! the compiler pipeline (§2) in their own tooling.

pub use agentspec_expr as expr;
pub use agentspec_ir as ir;
pub use agentspec_lang as lang;
pub use agentspec_semantic as semantic;
pub use agentspec_state as state;

pub use agentspec_lang::{format, parse, validate as validate_structural};
pub use agentspec_semantic::{resolve_imports, validate as validate_semantic};
