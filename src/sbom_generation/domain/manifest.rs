use super::package::DependencyDeclaration;
use crate::shared::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Workspace membership as npm and yarn accept it: a bare array of patterns
/// or an object carrying a `packages` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Patterns(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    pub fn patterns(&self) -> &[String] {
        match self {
            Workspaces::Patterns(patterns) => patterns,
            Workspaces::Object { packages } => packages,
        }
    }
}

/// The subset of `package.json` the analysis needs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub workspaces: Option<Workspaces>,
}

impl ProjectManifest {
    /// Parses manifest JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn workspace_patterns(&self) -> &[String] {
        self.workspaces.as_ref().map_or(&[], |w| w.patterns())
    }

    /// Production and (optionally) development declarations in manifest order.
    ///
    /// Entries whose name fails validation are returned separately so the
    /// caller can record them instead of losing them.
    pub fn declarations(&self, include_dev: bool) -> (Vec<DependencyDeclaration>, Vec<(String, String)>) {
        let mut valid = Vec::new();
        let mut rejected = Vec::new();

        let dev_iter = self
            .dev_dependencies
            .iter()
            .filter(|_| include_dev)
            .map(|(n, r)| (n, r, true));

        for (name, range, is_dev) in self.dependencies.iter().map(|(n, r)| (n, r, false)).chain(dev_iter) {
            match DependencyDeclaration::new(name.clone(), range.clone(), is_dev) {
                Ok(decl) => valid.push(decl),
                Err(_) => rejected.push((name.clone(), range.clone())),
            }
        }

        (valid, rejected)
    }
}

/// One analyzed manifest: the root project or a monorepo member
#[derive(Debug, Clone)]
pub struct PackageManifest {
    /// Member path relative to the project root; `None` for the root itself
    pub path: Option<String>,
    pub manifest: ProjectManifest,
}
