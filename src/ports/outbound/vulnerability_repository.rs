use crate::sbom_generation::domain::VulnerabilityRecord;
use crate::shared::Result;
use async_trait::async_trait;

/// The ecosystem identifier vulnerability databases use for npm packages
pub const NPM_ECOSYSTEM: &str = "npm";

/// VulnerabilityRepository port for known vulnerabilities of one package version
///
/// This port abstracts the external vulnerability database (e.g., OSV).
#[async_trait]
pub trait VulnerabilityRepository: Send + Sync {
    /// Fetches vulnerabilities affecting `package_name@version` in the npm ecosystem
    ///
    /// # Returns
    /// Zero or more records; severity, CWE ids and fix versions are filled in
    /// when the database provides them
    async fn fetch_vulnerabilities(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Vec<VulnerabilityRecord>>;
}
