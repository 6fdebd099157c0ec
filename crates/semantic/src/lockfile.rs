//! On-disk lockfile recording `(package, version, content_hash)` for every
//! resolved import, so a rebuild with the same sources is reproducible
//! without re-walking the import graph's version selection (§4.3).

use crate::import_graph::LockEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Lockfile {
    pub version: u32,
    pub entries: Vec<LockfileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LockfileEntry {
    pub package: String,
    pub version: String,
    pub content_hash: String,
}

impl Lockfile {
    pub fn from_entries(entries: &[LockEntry]) -> Self {
        let mut entries: Vec<LockfileEntry> = entries
            .iter()
            .map(|e| LockfileEntry {
                package: e.package.clone(),
                version: e.version.clone(),
                content_hash: e.content_hash.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.package.cmp(&b.package));
        Self { version: 1, entries }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_sorted_entries() {
        let lock = Lockfile::from_entries(&[
            LockEntry { package: "z".into(), version: "1.0.0".into(), content_hash: "sha256:aa".into() },
            LockEntry { package: "a".into(), version: "2.0.0".into(), content_hash: "sha256:bb".into() },
        ]);
        assert_eq!(lock.entries[0].package, "a");
        let roundtrip = Lockfile::from_json(&lock.to_json()).unwrap();
        assert_eq!(roundtrip.entries, lock.entries);
    }
}
