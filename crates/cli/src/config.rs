//! Runtime configuration (§4.6, §5, SPEC_FULL §13): plugin timeout/memory
//! cap, per-adapter-action timeout, import-fetch timeout/concurrency, and
//! the state-file path. Resolved in precedence order: CLI flag >
//! `agentspec.toml` in the nearest ancestor directory > built-in default.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub state_file: Option<String>,
    #[serde(default)]
    pub plugin_timeout_secs: Option<u64>,
    #[serde(default)]
    pub plugin_memory_pages: Option<u32>,
    #[serde(default)]
    pub adapter_timeout_secs: Option<u64>,
    #[serde(default)]
    pub import_timeout_secs: Option<u64>,
    #[serde(default)]
    pub import_concurrency: Option<usize>,
}

/// Fully-resolved tunables, threaded from the CLI boundary into every
/// downstream crate as plain arguments (§13 — no crate below the CLI reads
/// environment or files except `agentspec-state`'s own lock file and the
/// semantic layer's package/plugin caches).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub state_file: PathBuf,
    pub plugin_timeout_secs: u64,
    pub plugin_memory_pages: u32,
    pub adapter_timeout_secs: u64,
    pub import_timeout_secs: u64,
    pub import_concurrency: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(".agentspec.state.json"),
            plugin_timeout_secs: 30,
            plugin_memory_pages: 256,
            adapter_timeout_secs: 60,
            import_timeout_secs: 30,
            import_concurrency: 8,
        }
    }
}

impl RuntimeConfig {
    /// Walk up from `start` looking for `agentspec.toml`, merge it under
    /// defaults, then apply `--state-file` last so the CLI flag always
    /// wins.
    pub fn resolve(start: &Path, state_file_flag: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(found) = find_config_file(start) {
            let text = std::fs::read_to_string(&found)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", found.display()))?;
            let file: FileConfig =
                toml::from_str(&text).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", found.display()))?;
            config.apply(file);
        }

        if let Some(path) = state_file_flag {
            config.state_file = path.to_path_buf();
        }

        Ok(config)
    }

    fn apply(&mut self, file: FileConfig) {
        if let Some(v) = file.state_file {
            self.state_file = PathBuf::from(v);
        }
        if let Some(v) = file.plugin_timeout_secs {
            self.plugin_timeout_secs = v;
        }
        if let Some(v) = file.plugin_memory_pages {
            self.plugin_memory_pages = v;
        }
        if let Some(v) = file.adapter_timeout_secs {
            self.adapter_timeout_secs = v;
        }
        if let Some(v) = file.import_timeout_secs {
            self.import_timeout_secs = v;
        }
        if let Some(v) = file.import_concurrency {
            self.import_concurrency = v;
        }
    }
}

fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        let candidate = d.join("agentspec.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = d.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn default_has_sane_timeouts() {
        let config = RuntimeConfig::default();
        assert_eq!(config.plugin_timeout_secs, 30);
        assert_eq!(config.adapter_timeout_secs, 60);
    }

    #[test]
    fn cli_flag_overrides_config_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("agentspec.toml"), r#"state_file = "from-toml.json""#).unwrap();

        let resolved = RuntimeConfig::resolve(dir.path(), Some(Path::new("from-flag.json"))).unwrap();
        assert_eq!(resolved.state_file, PathBuf::from("from-flag.json"));
    }

    #[test]
    fn config_file_overrides_default_when_no_flag() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("agentspec.toml"), r#"plugin_timeout_secs = 99"#).unwrap();

        let resolved = RuntimeConfig::resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.plugin_timeout_secs, 99);
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let resolved = RuntimeConfig::resolve(dir.path(), None).unwrap();
        assert_eq!(resolved.state_file, PathBuf::from(".agentspec.state.json"));
    }

    #[test]
    fn searches_ancestor_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("agentspec.toml"), r#"import_concurrency = 4"#).unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let resolved = RuntimeConfig::resolve(&nested, None).unwrap();
        assert_eq!(resolved.import_concurrency, 4);
    }
}
