use crate::shared::Result;
use async_trait::async_trait;

/// PopularityProvider port for recent download counts
#[async_trait]
pub trait PopularityProvider: Send + Sync {
    /// Downloads over the last week
    async fn fetch_weekly_downloads(&self, package_name: &str) -> Result<u64>;
}
