//! `.agentspec.state.json` load/save/get/put/delete/list (§4.13). Saves
//! are atomic: write to a sibling tempfile, then rename over the target,
//! so a crash mid-write never leaves a half-written state file behind.

use crate::entry::{StateEntry, StateFile, STATE_VERSION};
use crate::error::StateError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub struct StateStore {
    path: PathBuf,
    file: StateFile,
}

impl StateStore {
    /// Load the state file at `path`, or start empty if it doesn't exist
    /// yet (a brand-new project has never applied anything).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();
        let file = match fs::read_to_string(&path) {
            Ok(text) => parse(&path, &text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StateFile::new(),
            Err(e) => return Err(StateError::Io { path: path.display().to_string(), message: e.to_string() }),
        };
        Ok(Self { path, file })
    }

    pub fn save(&self) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(&self.file)
            .map_err(|e| StateError::Io { path: self.path.display().to_string(), message: e.to_string() })?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| StateError::Io { path: self.path.display().to_string(), message: e.to_string() })?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| StateError::Io { path: self.path.display().to_string(), message: e.to_string() })?;
        tmp.persist(&self.path)
            .map_err(|e| StateError::Io { path: self.path.display().to_string(), message: e.to_string() })?;
        Ok(())
    }

    pub fn get(&self, fqn: &str) -> Option<&StateEntry> {
        self.file.entries.get(fqn)
    }

    pub fn put(&mut self, fqn: String, entry: StateEntry) {
        self.file.entries.insert(fqn, entry);
    }

    pub fn delete(&mut self, fqn: &str) {
        self.file.entries.remove(fqn);
    }

    pub fn list(&self) -> impl Iterator<Item = (&String, &StateEntry)> {
        self.file.entries.iter()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse(path: &Path, text: &str) -> Result<StateFile, StateError> {
    let file: StateFile = serde_json::from_str(text)
        .map_err(|e| StateError::Corrupt { path: path.display().to_string(), message: e.to_string() })?;
    if file.version != STATE_VERSION {
        return Err(StateError::VersionMismatch {
            path: path.display().to_string(),
            found: file.version,
            expected: STATE_VERSION.to_string(),
        });
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ResourceStatus;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        assert_eq!(store.list().count(), 0);
    }

    #[test]
    fn put_save_load_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".agentspec.state.json");
        let mut store = StateStore::load(&path).unwrap();
        store.put("demo/Agent/bot".into(), StateEntry::applied("sha256:aa".into(), "local".into(), Utc::now()));
        store.save().unwrap();

        let reloaded = StateStore::load(&path).unwrap();
        let entry = reloaded.get("demo/Agent/bot").unwrap();
        assert_eq!(entry.status, ResourceStatus::Applied);
        assert_eq!(entry.hash, "sha256:aa");
    }

    #[test]
    fn corrupted_json_fails_loudly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".agentspec.state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(StateStore::load(&path), Err(StateError::Corrupt { .. })));
    }

    #[test]
    fn version_mismatch_fails_loudly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".agentspec.state.json");
        fs::write(&path, r#"{"version":"99","entries":{}}"#).unwrap();
        assert!(matches!(StateStore::load(&path), Err(StateError::VersionMismatch { .. })));
    }

    #[test]
    fn delete_removes_entry() {
        let dir = tempdir().unwrap();
        let mut store = StateStore::load(dir.path().join(".agentspec.state.json")).unwrap();
        store.put("demo/Agent/bot".into(), StateEntry::pending("sha256:aa".into()));
        store.delete("demo/Agent/bot");
        assert!(store.get("demo/Agent/bot").is_none());
    }
}
