use crate::sbom_generation::domain::BundleSizeBytes;
use crate::shared::Result;
use async_trait::async_trait;

/// BundleSizeProvider port for minified and gzipped byte counts
#[async_trait]
pub trait BundleSizeProvider: Send + Sync {
    /// Returns `Ok(None)` when the provider knows the package but has no size
    async fn fetch_bundle_size(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Option<BundleSizeBytes>>;
}
