use crate::ports::outbound::RegistryClient;
use crate::sbom_generation::domain::RegistryMetadata;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// CachingRegistryClient wraps a RegistryClient and adds in-memory caching.
///
/// Packuments are keyed by package name only, since one document covers
/// every version. Monorepo members that share a dependency therefore cost
/// a single request. Failures are not cached so a later attempt can retry.
///
/// The cache lives as long as the client; construct one per analysis run.
pub struct CachingRegistryClient<R: RegistryClient> {
    inner: R,
    cache: Arc<DashMap<String, RegistryMetadata>>,
}

impl<R: RegistryClient> CachingRegistryClient<R> {
    /// Creates a new caching client wrapping the given inner client
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Returns the current cache size (for testing/monitoring)
    #[cfg(test)]
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

#[async_trait]
impl<R: RegistryClient> RegistryClient for CachingRegistryClient<R> {
    async fn fetch_metadata(&self, package_name: &str) -> Result<RegistryMetadata> {
        if let Some(cached) = self.cache.get(package_name) {
            debug!(package = package_name, "registry cache hit");
            return Ok(cached.clone());
        }

        let metadata = self.inner.fetch_metadata(package_name).await?;
        self.cache
            .insert(package_name.to_string(), metadata.clone());

        Ok(metadata)
    }
}
