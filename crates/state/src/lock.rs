//! A sentinel-file advisory lock guarding the state file for the duration
//! of a plan+apply pair (§5 "Shared resources"). Exclusive-create is
//! atomic on every platform `tempfile`/`std::fs` target here, so two
//! processes racing to acquire never both succeed.

use crate::error::StateError;
use std::fs;
use std::path::{Path, PathBuf};

pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    pub fn acquire(state_path: &Path) -> Result<Self, StateError> {
        let path = lock_path(state_path);
        fs::OpenOptions::new().write(true).create_new(true).open(&path).map_err(|e| StateError::Locked {
            path: path.display().to_string(),
            message: format!("{e} (a prior run may have crashed; remove the lock file if you're sure nothing else is running)"),
        })?;
        Ok(Self { path })
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    state_path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_acquire_fails_while_first_held() {
        let dir = tempdir().unwrap();
        let state_path = dir.path().join(".agentspec.state.json");
        let guard = StateLock::acquire(&state_path).unwrap();
        assert!(StateLock::acquire(&state_path).is_err());
        drop(guard);
        assert!(StateLock::acquire(&state_path).is_ok());
    }
}
