use async_trait::async_trait;
use npm_sbom::prelude::*;
use std::collections::HashMap;

/// Mock SecurityScoreProvider for testing
pub struct MockSecurityScoreProvider {
    pub scores: HashMap<String, u8>,
    pub default_score: Option<u8>,
}

impl MockSecurityScoreProvider {
    pub fn new(default_score: u8) -> Self {
        Self {
            scores: HashMap::new(),
            default_score: Some(default_score),
        }
    }

    pub fn with_score(mut self, package: &str, score: u8) -> Self {
        self.scores.insert(package.to_string(), score);
        self
    }

    /// A provider that never produces a score
    pub fn unavailable() -> Self {
        Self {
            scores: HashMap::new(),
            default_score: None,
        }
    }
}

#[async_trait]
impl SecurityScoreProvider for MockSecurityScoreProvider {
    async fn fetch_security_score(&self, package_name: &str) -> Result<u8> {
        self.scores
            .get(package_name)
            .copied()
            .or(self.default_score)
            .ok_or_else(|| anyhow::anyhow!("no security score for {}", package_name))
    }
}
