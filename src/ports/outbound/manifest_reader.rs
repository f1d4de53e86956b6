use crate::sbom_generation::domain::{PackageManifest, ProjectManifest};
use crate::shared::Result;
use std::path::Path;

/// ManifestReader port for reading `package.json` files
///
/// This port abstracts the file system operations needed to load the root
/// manifest and discover monorepo members.
pub trait ManifestReader {
    /// Reads and parses `package.json` in the project directory
    ///
    /// # Errors
    /// Returns `ManifestNotFound` or `ManifestParseError`; both abort the run
    fn read_manifest(&self, project_path: &Path) -> Result<ProjectManifest>;

    /// Resolves workspace patterns (literal paths or a trailing `/*`) to
    /// member manifests, sorted by path
    fn read_workspace_members(
        &self,
        project_path: &Path,
        patterns: &[String],
    ) -> Result<Vec<PackageManifest>>;
}
