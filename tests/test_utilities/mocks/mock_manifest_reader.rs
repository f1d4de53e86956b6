use npm_sbom::prelude::*;
use npm_sbom::sbom_generation::domain::{PackageManifest, ProjectManifest};
use std::path::Path;

/// Mock ManifestReader for testing
pub struct MockManifestReader {
    pub root: Option<ProjectManifest>,
    pub members: Vec<PackageManifest>,
}

impl MockManifestReader {
    pub fn new(root_json: &str) -> Self {
        Self {
            root: Some(ProjectManifest::from_json(root_json).unwrap()),
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, path: &str, member_json: &str) -> Self {
        self.members.push(PackageManifest {
            path: Some(path.to_string()),
            manifest: ProjectManifest::from_json(member_json).unwrap(),
        });
        self
    }

    /// A reader for a directory without package.json
    pub fn missing() -> Self {
        Self {
            root: None,
            members: Vec::new(),
        }
    }
}

impl ManifestReader for MockManifestReader {
    fn read_manifest(&self, project_path: &Path) -> Result<ProjectManifest> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => anyhow::bail!("package.json not found: {}", project_path.display()),
        }
    }

    fn read_workspace_members(
        &self,
        _project_path: &Path,
        _patterns: &[String],
    ) -> Result<Vec<PackageManifest>> {
        Ok(self.members.clone())
    }
}
