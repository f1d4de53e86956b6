use super::build_http_client;
use crate::ports::outbound::PopularityProvider;
use crate::shared::security::validate_package_name_for_url;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_DOWNLOADS_URL: &str = "https://api.npmjs.org";

#[derive(Debug, Deserialize)]
struct DownloadsPoint {
    downloads: u64,
}

/// NpmDownloadsClient adapter for last-week download counts
pub struct NpmDownloadsClient {
    client: reqwest::Client,
    base_url: String,
}

impl NpmDownloadsClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_DOWNLOADS_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(10))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PopularityProvider for NpmDownloadsClient {
    async fn fetch_weekly_downloads(&self, package_name: &str) -> Result<u64> {
        validate_package_name_for_url(package_name)?;

        // The downloads API takes scoped names with a literal slash
        let url = format!(
            "{}/downloads/point/last-week/{}",
            self.base_url, package_name
        );
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!(
                "npm downloads API returned status code {}",
                response.status()
            );
        }

        let point: DownloadsPoint = response.json().await?;
        Ok(point.downloads)
    }
}
