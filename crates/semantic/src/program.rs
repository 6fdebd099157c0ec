//! A [`Program`] is the combined view of a root `.ias` file plus every
//! package it transitively imports (§4.5 runs "after structural validation
//! on the combined AST, including imports"). `agentspec-semantic` does not
//! read files itself — [`crate::import_graph`] drives a caller-supplied
//! [`crate::import_graph::PackageLoader`] and hands the result here.

use agentspec_lang::ast::{IntentFile, Resource};
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub file: IntentFile,
}

/// The root package plus every resolved dependency, indexed by FQN for O(1)
/// reference resolution.
#[derive(Debug, Clone)]
pub struct Program {
    pub root: Package,
    pub dependencies: Vec<Package>,
    by_fqn: IndexMap<String, (usize, usize)>, // fqn -> (package index, resource index); 0 = root
}

impl Program {
    pub fn new(root: Package, dependencies: Vec<Package>) -> Self {
        let mut by_fqn = IndexMap::new();
        for (resource_idx, resource) in root.file.resources.iter().enumerate() {
            by_fqn.insert(resource.fqn(&root.name), (0, resource_idx));
        }
        for (pkg_idx, pkg) in dependencies.iter().enumerate() {
            for (resource_idx, resource) in pkg.file.resources.iter().enumerate() {
                by_fqn.entry(resource.fqn(&pkg.name)).or_insert((pkg_idx + 1, resource_idx));
            }
        }
        Self { root, dependencies, by_fqn }
    }

    pub fn package(&self, index: usize) -> &Package {
        if index == 0 {
            &self.root
        } else {
            &self.dependencies[index - 1]
        }
    }

    pub fn resolve(&self, fqn: &str) -> Option<&Resource> {
        let (pkg, res) = self.by_fqn.get(fqn)?;
        Some(&self.package(*pkg).file.resources[*res])
    }

    /// Every FQN present anywhere in the program, for uniqueness and
    /// fuzzy-suggestion lookups.
    pub fn all_fqns(&self) -> impl Iterator<Item = &str> {
        self.by_fqn.keys().map(|s| s.as_str())
    }

    /// Resources of a given kind tag (e.g. `"Skill"`) across the whole
    /// program, each paired with its FQN.
    pub fn resources_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = (String, &'a Resource)> + 'a {
        std::iter::once(&self.root)
            .chain(self.dependencies.iter())
            .flat_map(|pkg| pkg.file.resources.iter().map(move |r| (r.fqn(&pkg.name), r)))
            .filter(move |(_, r)| r.kind.tag() == kind)
    }

    /// All resources declared directly in the root package (imports are
    /// available for reference resolution but uniqueness/secret-discipline
    /// checks only apply to what this package itself declares).
    pub fn root_resources(&self) -> &[Resource] {
        &self.root.file.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentspec_lang::parse;

    #[test]
    fn resolves_fqn_across_root_and_dependency() {
        let root_src = r#"
package "demo" version "0.1.0" lang "2.0"

agent "bot" {
  uses skill "search"
}
"#;
        let dep_src = r#"
package "shared" version "1.0.0" lang "2.0"

skill "search" {
  tool command { binary "search" }
}
"#;
        let root = Package { name: "demo".into(), version: "0.1.0".into(), file: parse(root_src).unwrap() };
        let dep = Package { name: "shared".into(), version: "1.0.0".into(), file: parse(dep_src).unwrap() };
        let program = Program::new(root, vec![dep]);
        assert!(program.resolve("shared/Skill/search").is_some());
        assert!(program.resolve("demo/Agent/bot").is_some());
        assert!(program.resolve("demo/Skill/missing").is_none());
    }
}
