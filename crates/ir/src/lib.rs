//! # agentspec-ir
//!
//! The Intermediate Representation (§3, §4.7, §4.8): a platform-neutral,
//! content-hashed document every compilation target, adapter, and the
//! plan/apply engine consume. Two responsibilities:
//!
//! - [`lower`] turns a validated [`agentspec_semantic::Program`] into an
//!   [`IRDocument`] — resolving references, merging an optional
//!   environment overlay, compiling embedded expressions, and assigning
//!   FQNs and content hashes.
//! - [`canonical`] renders any JSON value as sorted-key, whitespace-free
//!   text and computes the `"sha256:"`-prefixed content hash over it —
//!   the determinism invariant the whole plan/apply pipeline rests on.

pub mod canonical;
pub mod document;
pub mod error;
pub mod lower;

pub use document::{IRBinding, IRDocument, IRPolicy, IRPolicyRule, IRResource, IR_VERSION};
pub use error::LowerError;
pub use lower::lower;
