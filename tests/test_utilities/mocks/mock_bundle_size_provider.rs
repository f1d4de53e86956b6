use async_trait::async_trait;
use npm_sbom::prelude::*;
use npm_sbom::sbom_generation::domain::BundleSizeBytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock BundleSizeProvider for testing
#[derive(Default)]
pub struct MockBundleSizeProvider {
    pub sizes: HashMap<String, BundleSizeBytes>,
    calls: AtomicUsize,
}

impl MockBundleSizeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, package: &str, minified: u64, gzipped: u64) -> Self {
        self.sizes
            .insert(package.to_string(), BundleSizeBytes { minified, gzipped });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BundleSizeProvider for MockBundleSizeProvider {
    async fn fetch_bundle_size(
        &self,
        package_name: &str,
        _version: &str,
    ) -> Result<Option<BundleSizeBytes>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sizes.get(package_name).copied())
    }
}
