//! IR document types (§3 DATA MODEL, §6.2): the platform-neutral,
//! content-hashed contract every compilation target and adapter consumes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const IR_VERSION: u32 = 1;

/// Top-level keys are serialized in this same sorted order by
/// [`crate::canonical`]: `bindings`, `ir_version`, `lang_version`,
/// `package`, `policies`, `resources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRDocument {
    pub ir_version: u32,
    pub lang_version: String,
    pub package: String,
    /// Sorted by `(kind, name)` ascending.
    pub resources: Vec<IRResource>,
    pub policies: Vec<IRPolicy>,
    pub bindings: Vec<IRBinding>,
}

impl IRDocument {
    /// SHA-256 over the canonical JSON of every resource hash concatenated
    /// in document order — the "hash-of-hashes" a plan file pins its input
    /// to (§4.9).
    pub fn hash_of_hashes(&self) -> String {
        let joined = self.resources.iter().map(|r| r.hash.as_str()).collect::<Vec<_>>().join(",");
        crate::canonical::content_hash(&joined)
    }

    pub fn to_canonical_json(&self) -> serde_json::Result<String> {
        let value = serde_json::to_value(self)?;
        Ok(crate::canonical::to_canonical_string(&value))
    }
}

/// One resource in the IR: attributes is a canonical map (sorted keys on
/// serialization), references are resolved FQNs, hash is over attributes
/// alone (§4.8) so unrelated resources moving around the document never
/// perturb an unrelated hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRResource {
    pub kind: String,
    pub name: String,
    pub fqn: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub references: Vec<String>,
    pub hash: String,
}

impl IRResource {
    pub fn recompute_hash(&mut self) {
        let json = crate::canonical::to_canonical_string(&serde_json::json!(self.attributes));
        self.hash = crate::canonical::content_hash(&json);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRPolicy {
    pub name: String,
    pub rules: Vec<IRPolicyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRPolicyRule {
    pub action: String,
    pub subject_type: String,
    pub subject_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRBinding {
    pub fqn: String,
    pub target: String,
    pub default: bool,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_of_hashes_ignores_resource_order_label_only() {
        let mut doc = IRDocument {
            ir_version: IR_VERSION,
            lang_version: "2.0".into(),
            package: "demo".into(),
            resources: vec![],
            policies: vec![],
            bindings: vec![],
        };
        let empty = doc.hash_of_hashes();
        doc.resources.push(IRResource {
            kind: "Prompt".into(),
            name: "greet".into(),
            fqn: "demo/Prompt/greet".into(),
            attributes: BTreeMap::new(),
            references: vec![],
            hash: "sha256:abc".into(),
        });
        assert_ne!(empty, doc.hash_of_hashes());
    }
}
