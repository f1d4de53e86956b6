use crate::shared::Result;
use async_trait::async_trait;

/// SecurityScoreProvider port for a 0-100 package health score
#[async_trait]
pub trait SecurityScoreProvider: Send + Sync {
    /// Returns the score, or an error the orchestrator turns into "unavailable"
    async fn fetch_security_score(&self, package_name: &str) -> Result<u8>;
}
