//! Filesystem [`PackageLoader`] (§4.3): resolves `./`/`../`-relative local
//! imports. Packaged imports pinned to a host registry go through an
//! external fetcher out of this crate's scope (§1) — attempting one here
//! is reported as an unresolved-package `ImportError` rather than silently
//! skipped.

use agentspec_lang::ast::Import;
use agentspec_semantic::{LoadedPackage, PackageLoader, SemanticError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub struct FsPackageLoader {
    root_dir: PathBuf,
}

impl FsPackageLoader {
    pub fn new(root_file: &Path) -> Self {
        let root_dir = root_file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        Self { root_dir }
    }
}

impl PackageLoader for FsPackageLoader {
    fn load(&self, import: &Import) -> Result<LoadedPackage, SemanticError> {
        if !import.is_local() {
            return Err(SemanticError::Import {
                message: format!(
                    "packaged import \"{}\" requires a registry client, which is outside this tool's scope",
                    import.path.node
                ),
                chain: vec![import.path.node.clone()],
            });
        }

        let candidate = self.root_dir.join(&import.path.node);
        let path = if candidate.is_file() { candidate } else { candidate.with_extension("ias") };

        let source = std::fs::read_to_string(&path).map_err(|e| SemanticError::Import {
            message: format!("could not read imported file \"{}\": {e}", path.display()),
            chain: vec![import.path.node.clone()],
        })?;

        let file = agentspec_lang::parse(&source).map_err(|errors| SemanticError::Import {
            message: format!("imported file \"{}\" failed to parse: {}", path.display(), errors.join("; ")),
            chain: vec![import.path.node.clone()],
        })?;

        let (name, version) = match &file.package {
            Some(header) => (header.name.node.clone(), header.version.node.clone()),
            None => (path.display().to_string(), "0.0.0".to_string()),
        };

        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        let content_hash = format!("sha256:{:x}", hasher.finalize());

        Ok(LoadedPackage { name, version, file, content_hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_a_local_sibling_file() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("main.ias");
        fs::write(&root, r#"package "demo" version "0.1.0" lang "2.0""#).unwrap();
        fs::write(
            dir.path().join("shared.ias"),
            r#"package "shared" version "1.0.0" lang "2.0"

skill "search" {
  tool command { binary "search" }
}
"#,
        )
        .unwrap();

        let loader = FsPackageLoader::new(&root);
        let import = Import { path: spanned("./shared.ias"), version: None, alias: None, span: 0..0 };
        let loaded = loader.load(&import).unwrap();
        assert_eq!(loaded.name, "shared");
        assert_eq!(loaded.version, "1.0.0");
    }

    #[test]
    fn packaged_import_is_rejected() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("main.ias");
        fs::write(&root, "").unwrap();
        let loader = FsPackageLoader::new(&root);
        let import = Import { path: spanned("registry.host/pkg"), version: Some(spanned("1.0.0")), alias: None, span: 0..0 };
        assert!(loader.load(&import).is_err());
    }

    fn spanned(s: &str) -> agentspec_lang::Spanned<String> {
        agentspec_lang::Spanned { node: s.to_string(), span: 0..0 }
    }
}
