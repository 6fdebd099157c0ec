//! Import Resolver (§4.3 / C3): walks the import graph, detects cycles with
//! Tarjan's algorithm, and applies Minimal Version Selection across
//! multiple requested versions of the same package.
//!
//! Fetching package bytes off the local cache or a registry is an external
//! collaborator (§1 scope) — this module only needs a [`PackageLoader`] that
//! can turn one [`agentspec_lang::ast::Import`] into a parsed file, a
//! resolved version, and a content hash.

use crate::error::SemanticError;
use crate::program::{Package, Program};
use agentspec_lang::ast::{Import, IntentFile};
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::collections::{HashMap, HashSet};

/// External collaborator: resolves one import declaration to a loaded
/// package. Implementations live at the CLI boundary — a local one reads
/// `./`/`../` paths relative to the importing file; a packaged one goes
/// through the (out-of-scope) registry client and on-disk cache.
pub trait PackageLoader {
    /// Parse and return the package a single import resolves to, along with
    /// every import *that package itself* declares (so the walk can
    /// recurse), and a content hash used for lockfile + cache integrity.
    fn load(&self, import: &Import) -> Result<LoadedPackage, SemanticError>;
}

pub struct LoadedPackage {
    pub name: String,
    pub version: String,
    pub file: IntentFile,
    pub content_hash: String,
}

#[derive(Debug, Clone)]
pub struct LockEntry {
    pub package: String,
    pub version: String,
    pub content_hash: String,
}

/// Walk `root`'s import graph (recursively, through every transitively
/// imported package's own imports), detect import cycles, apply MVS for
/// packages requested at more than one version, and return the combined
/// [`Program`] plus the lockfile entries to persist.
pub fn resolve(
    root_name: &str,
    root_version: &str,
    root: &IntentFile,
    loader: &dyn PackageLoader,
) -> Result<(Program, Vec<LockEntry>), SemanticError> {
    let mut graph: DiGraph<String, ()> = DiGraph::new();
    let mut node_of: HashMap<String, petgraph::graph::NodeIndex> = HashMap::new();
    let mut loaded: HashMap<String, LoadedPackage> = HashMap::new();
    // package name -> every minimum version requested anywhere in the graph.
    let mut requested_versions: HashMap<String, Vec<semver::Version>> = HashMap::new();

    let root_key = format!("{root_name}@{root_version}");
    let root_node = *node_of.entry(root_key.clone()).or_insert_with(|| graph.add_node(root_key.clone()));

    let mut stack: Vec<(String, petgraph::graph::NodeIndex, Vec<Import>)> =
        vec![(root_key, root_node, root.imports.clone())];
    let mut visited_packages: HashSet<String> = HashSet::new();

    while let Some((from_key, from_node, imports)) = stack.pop() {
        if !visited_packages.insert(from_key.clone()) {
            continue;
        }
        for import in &imports {
            let loaded_pkg = loader.load(import)?;
            if let Some(version_str) = &import.version {
                if let Ok(v) = semver::Version::parse(&version_str.node) {
                    requested_versions.entry(loaded_pkg.name.clone()).or_default().push(v);
                }
            }
            let key = format!("{}@{}", loaded_pkg.name, loaded_pkg.version);
            let node = *node_of.entry(key.clone()).or_insert_with(|| graph.add_node(key.clone()));
            graph.update_edge(from_node, node, ());

            let child_imports = loaded_pkg.file.imports.clone();
            loaded.entry(key.clone()).or_insert(loaded_pkg);
            stack.push((key, node, child_imports));
        }
    }

    for scc in tarjan_scc(&graph) {
        if scc.len() > 1 {
            let chain: Vec<String> = scc.iter().map(|&idx| graph[idx].clone()).collect();
            return Err(SemanticError::Import {
                message: format!("import cycle detected: {}", chain.join(" -> ")),
                chain,
            });
        }
    }

    let selected = select_mvs(&requested_versions);
    for (name, version) in &selected {
        let key = format!("{name}@{version}");
        if !loaded.contains_key(&key) {
            // A constraint named a version no loaded package actually carries.
            return Err(SemanticError::Import {
                message: format!("no resolved package satisfies {name}@{version}"),
                chain: vec![key],
            });
        }
    }

    let mut dependencies = Vec::new();
    let mut lockfile = Vec::new();
    for (_key, pkg) in loaded {
        if let Some(selected_version) = selected.get(&pkg.name) {
            if pkg.version != selected_version.to_string() {
                continue; // superseded by MVS
            }
        }
        lockfile.push(LockEntry {
            package: pkg.name.clone(),
            version: pkg.version.clone(),
            content_hash: pkg.content_hash.clone(),
        });
        dependencies.push(Package { name: pkg.name, version: pkg.version, file: pkg.file });
    }
    dependencies.sort_by(|a, b| a.name.cmp(&b.name));
    lockfile.sort_by(|a, b| a.package.cmp(&b.package));

    let root_pkg = Package { name: root_name.to_string(), version: root_version.to_string(), file: root.clone() };
    Ok((Program::new(root_pkg, dependencies), lockfile))
}

/// Minimal Version Selection (§3 GLOSSARY): for each package requested at
/// more than one version, pick the smallest version that satisfies every
/// declared constraint. Every declared `version` is a minimum requirement,
/// so the smallest version satisfying all of them is the maximum of the
/// individually requested minimums.
pub fn select_mvs(requested: &HashMap<String, Vec<semver::Version>>) -> HashMap<String, semver::Version> {
    requested
        .iter()
        .filter_map(|(name, versions)| versions.iter().max().cloned().map(|v| (name.clone(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvs_picks_the_maximum_of_the_minimums() {
        let mut requested = HashMap::new();
        requested.insert(
            "shared".to_string(),
            vec![semver::Version::parse("1.0.0").unwrap(), semver::Version::parse("1.2.0").unwrap()],
        );
        let selected = select_mvs(&requested);
        assert_eq!(selected["shared"], semver::Version::parse("1.2.0").unwrap());
    }
}
