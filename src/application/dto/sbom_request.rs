use super::AnalysisOptions;
use std::path::PathBuf;
use std::time::Duration;

/// SbomRequest - Internal request DTO for the SBOM generation use case
#[derive(Debug, Clone)]
pub struct SbomRequest {
    /// Directory containing the root package.json
    pub project_path: PathBuf,
    pub options: AnalysisOptions,
    /// Extra monorepo member directories, on top of the manifest's `workspaces`
    pub workspaces: Vec<String>,
    /// `npm outdated --json` output to merge after analysis
    pub outdated_feed: Option<PathBuf>,
    /// `npm audit --json` output to merge after analysis
    pub audit_feed: Option<PathBuf>,
    /// Wall-clock budget for the fetch phase
    pub timeout: Option<Duration>,
}

impl SbomRequest {
    pub fn new(project_path: PathBuf, options: AnalysisOptions) -> Self {
        Self {
            project_path,
            options,
            workspaces: Vec::new(),
            outdated_feed: None,
            audit_feed: None,
            timeout: None,
        }
    }

    pub fn with_workspaces(mut self, workspaces: Vec<String>) -> Self {
        self.workspaces = workspaces;
        self
    }

    pub fn with_outdated_feed(mut self, path: Option<PathBuf>) -> Self {
        self.outdated_feed = path;
        self
    }

    pub fn with_audit_feed(mut self, path: Option<PathBuf>) -> Self {
        self.audit_feed = path;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
