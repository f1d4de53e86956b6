use crate::sbom_generation::domain::RegistryMetadata;
use crate::shared::Result;
use async_trait::async_trait;

/// RegistryClient port for fetching package metadata (the packument)
///
/// This is the primary provider: when it fails after retries the declaration
/// becomes a known unknown.
///
/// # Async Support
/// Implementations must be `Send + Sync` so one client can serve every
/// in-flight declaration.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetches registry metadata for a package
    ///
    /// # Errors
    /// Returns an error if the request fails, the registry answers with a
    /// non-success status, or the body is not a packument
    async fn fetch_metadata(&self, package_name: &str) -> Result<RegistryMetadata>;
}
