use super::npm_feed_parser::{parse_audit, parse_outdated};
use crate::ports::outbound::{FeedReader, ManifestReader};
use crate::sbom_generation::domain::{AuditFeed, OutdatedInfo, PackageManifest, ProjectManifest};
use crate::shared::error::SbomError;
use crate::shared::security::read_checked;
use crate::shared::Result;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

const MANIFEST_FILE: &str = "package.json";

/// FileSystemReader adapter for reading manifests and feeds from disk
///
/// This adapter implements both ManifestReader and FeedReader ports. Every
/// read goes through `read_checked`, which rejects symlinks and oversized
/// files.
pub struct FileSystemReader;

impl FileSystemReader {
    pub fn new() -> Self {
        Self
    }

    fn parse_manifest_at(&self, manifest_path: &Path) -> Result<ProjectManifest> {
        let content = read_checked(manifest_path, MANIFEST_FILE)?;
        ProjectManifest::from_json(&content).map_err(|e| {
            SbomError::ManifestParseError {
                path: manifest_path.to_path_buf(),
                details: e.to_string(),
            }
            .into()
        })
    }

    /// Directories a single workspace pattern names, relative to the root
    fn expand_pattern(&self, project_path: &Path, pattern: &str) -> Result<Vec<String>> {
        let pattern = pattern.trim().trim_start_matches("./").trim_end_matches('/');

        // Security: workspace members must stay inside the project
        let escapes = Path::new(pattern)
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
        if escapes {
            return Err(SbomError::SecurityError {
                path: project_path.join(pattern),
                reason: "workspace pattern points outside the project".to_string(),
                hint: "Use workspace paths relative to the project root".to_string(),
            }
            .into());
        }

        let Some(parent) = pattern.strip_suffix("/*") else {
            return Ok(vec![pattern.to_string()]);
        };

        let dir = project_path.join(parent);
        if !dir.is_dir() {
            debug!(pattern, "workspace pattern matches no directory");
            return Ok(Vec::new());
        }

        let mut members = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("Failed to list workspace directory {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                members.push(format!("{}/{}", parent, entry.file_name().to_string_lossy()));
            }
        }
        Ok(members)
    }
}

impl Default for FileSystemReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestReader for FileSystemReader {
    fn read_manifest(&self, project_path: &Path) -> Result<ProjectManifest> {
        if !project_path.is_dir() {
            return Err(SbomError::InvalidProjectPath {
                path: project_path.to_path_buf(),
                reason: "not a directory".to_string(),
            }
            .into());
        }

        let manifest_path = project_path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(SbomError::ManifestNotFound {
                path: manifest_path,
                suggestion: format!(
                    "package.json does not exist in project directory \"{}\".\n   \
                     Please run in the root directory of an npm project, or specify the correct path with the --path option.",
                    project_path.display()
                ),
            }
            .into());
        }

        self.parse_manifest_at(&manifest_path)
    }

    fn read_workspace_members(
        &self,
        project_path: &Path,
        patterns: &[String],
    ) -> Result<Vec<PackageManifest>> {
        let mut paths = Vec::new();
        for pattern in patterns {
            paths.extend(self.expand_pattern(project_path, pattern)?);
        }
        paths.sort();
        paths.dedup();

        let mut members = Vec::new();
        for path in paths {
            let manifest_path = project_path.join(&path).join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                warn!(member = %path, "workspace member has no package.json, skipping");
                continue;
            }
            members.push(PackageManifest {
                manifest: self.parse_manifest_at(&manifest_path)?,
                path: Some(path),
            });
        }
        Ok(members)
    }
}

impl FeedReader for FileSystemReader {
    fn read_outdated(&self, path: &Path) -> Result<BTreeMap<String, OutdatedInfo>> {
        let content = read_checked(path, "outdated feed")?;
        parse_outdated(&content)
            .with_context(|| format!("Failed to parse outdated feed {}", path.display()))
    }

    fn read_audit(&self, path: &Path) -> Result<AuditFeed> {
        let content = read_checked(path, "audit feed")?;
        parse_audit(&content)
            .with_context(|| format!("Failed to parse audit feed {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_read_manifest_success() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "package.json",
            r#"{"name": "app", "dependencies": {"lodash": "^4.17.21"}}"#,
        );

        let reader = FileSystemReader::new();
        let manifest = reader.read_manifest(temp_dir.path()).unwrap();

        assert_eq!(manifest.name.as_deref(), Some("app"));
        assert_eq!(manifest.dependencies["lodash"], "^4.17.21");
    }

    #[test]
    fn test_read_manifest_not_found() {
        let temp_dir = TempDir::new().unwrap();

        let reader = FileSystemReader::new();
        let err_string = format!("{}", reader.read_manifest(temp_dir.path()).unwrap_err());

        assert!(err_string.contains("package.json does not exist"));
    }

    #[test]
    fn test_read_manifest_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "package.json", "{ not json");

        let reader = FileSystemReader::new();
        let err_string = format!("{}", reader.read_manifest(temp_dir.path()).unwrap_err());

        assert!(err_string.contains("Failed to parse package.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_manifest_rejects_symlink() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "real.json", r#"{"name": "app"}"#);
        std::os::unix::fs::symlink(
            temp_dir.path().join("real.json"),
            temp_dir.path().join("package.json"),
        )
        .unwrap();

        let reader = FileSystemReader::new();
        let err_string = format!("{}", reader.read_manifest(temp_dir.path()).unwrap_err());

        assert!(err_string.contains("symbolic link"));
    }

    #[test]
    fn test_read_workspace_members_expands_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "packages/web/package.json", r#"{"name": "web"}"#);
        write(temp_dir.path(), "packages/api/package.json", r#"{"name": "api"}"#);
        write(temp_dir.path(), "packages/docs/README.md", "no manifest");
        write(temp_dir.path(), "tools/cli/package.json", r#"{"name": "cli"}"#);

        let reader = FileSystemReader::new();
        let members = reader
            .read_workspace_members(
                temp_dir.path(),
                &["packages/*".to_string(), "./tools/cli".to_string()],
            )
            .unwrap();

        let paths: Vec<_> = members.iter().map(|m| m.path.clone().unwrap()).collect();
        assert_eq!(paths, vec!["packages/api", "packages/web", "tools/cli"]);
        assert_eq!(members[0].manifest.name.as_deref(), Some("api"));
    }

    #[test]
    fn test_read_workspace_members_rejects_escape() {
        let temp_dir = TempDir::new().unwrap();

        let reader = FileSystemReader::new();
        let result = reader.read_workspace_members(temp_dir.path(), &["../other".to_string()]);

        assert!(result.is_err());
    }

    #[test]
    fn test_read_outdated_feed() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "outdated.json",
            r#"{"react": {"current": "18.2.0", "wanted": "18.3.1", "latest": "19.0.0"}}"#,
        );

        let reader = FileSystemReader::new();
        let outdated = reader
            .read_outdated(&temp_dir.path().join("outdated.json"))
            .unwrap();

        assert_eq!(outdated["react"].latest, "19.0.0");
    }
}
