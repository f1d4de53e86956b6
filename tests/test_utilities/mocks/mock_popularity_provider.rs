use async_trait::async_trait;
use npm_sbom::prelude::*;
use std::collections::HashMap;

/// Mock PopularityProvider for testing
pub struct MockPopularityProvider {
    pub downloads: HashMap<String, u64>,
    pub default_downloads: u64,
}

impl MockPopularityProvider {
    pub fn new(default_downloads: u64) -> Self {
        Self {
            downloads: HashMap::new(),
            default_downloads,
        }
    }

    pub fn with_downloads(mut self, package: &str, weekly: u64) -> Self {
        self.downloads.insert(package.to_string(), weekly);
        self
    }
}

#[async_trait]
impl PopularityProvider for MockPopularityProvider {
    async fn fetch_weekly_downloads(&self, package_name: &str) -> Result<u64> {
        Ok(self
            .downloads
            .get(package_name)
            .copied()
            .unwrap_or(self.default_downloads))
    }
}
