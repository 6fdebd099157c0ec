//! # agentspec-semantic
//!
//! The semantic layer (§4.3 Import Resolver / §4.5 Semantic Validator):
//! everything that needs cross-file context the structural validator in
//! `agentspec-lang` doesn't have. Walks import graphs, applies Minimal
//! Version Selection, resolves every `uses`/`connects to`/`exposes`/
//! `delegate to`/`depends_on` reference against the combined program,
//! checks resource-name uniqueness, flags plaintext secret literals, and
//! evaluates `policy` blocks.
//!
//! ## Pipeline
//!
//! 1. [`import_graph::resolve`] turns a root [`agentspec_lang::ast::IntentFile`]
//!    plus a caller-supplied [`import_graph::PackageLoader`] into a [`Program`]
//!    and a [`lockfile::Lockfile`].
//! 2. [`validate::validate`] runs uniqueness, reference resolution, secret
//!    discipline, expression compilation and policy evaluation over that
//!    `Program`, returning every [`SemanticError`] found rather than
//!    stopping at the first one.

pub mod error;
pub mod fuzzy;
pub mod import_graph;
pub mod lockfile;
pub mod policy;
pub mod program;
pub mod validate;

pub use error::SemanticError;
pub use import_graph::{resolve as resolve_imports, LoadedPackage, LockEntry, PackageLoader};
pub use lockfile::{Lockfile, LockfileEntry};
pub use policy::PolicyMode;
pub use program::{Package, Program};
pub use validate::{resolve_reference, validate};
