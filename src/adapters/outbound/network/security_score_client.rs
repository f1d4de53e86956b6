use super::build_http_client;
use crate::ports::outbound::SecurityScoreProvider;
use crate::shared::error::SbomError;
use crate::shared::security::validate_package_name_for_url;
use crate::shared::Result;
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;

pub const DEFAULT_HEALTH_URL: &str = "https://snyk.io/advisor";

/// SecurityScoreClient scrapes the package-health page for its 0-100 score
///
/// The page renders the score as `NN/100`. A page without one (or with a
/// value out of range) is treated the same as a transport failure.
pub struct SecurityScoreClient {
    client: reqwest::Client,
    base_url: String,
    score_pattern: Regex,
}

impl SecurityScoreClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_HEALTH_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(15))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            score_pattern: Regex::new(r"\b(\d{1,3})\s*/\s*100\b")?,
        })
    }

    /// Extracts the first `NN/100` figure from a page body
    fn extract_score(&self, body: &str) -> Option<u8> {
        self.score_pattern
            .captures(body)
            .and_then(|captures| captures.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .filter(|score| *score <= 100)
    }
}

#[async_trait]
impl SecurityScoreProvider for SecurityScoreClient {
    async fn fetch_security_score(&self, package_name: &str) -> Result<u8> {
        validate_package_name_for_url(package_name)?;

        let url = format!("{}/npm-package/{}", self.base_url, package_name);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Package health page returned status code {}",
                response.status()
            );
        }

        let body = response.text().await?;
        self.extract_score(&body).ok_or_else(|| {
            SbomError::ProviderError {
                provider: "security score".to_string(),
                package: package_name.to_string(),
                details: "no score found on package health page".to_string(),
            }
            .into()
        })
    }
}
