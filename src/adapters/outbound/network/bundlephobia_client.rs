use super::build_http_client;
use crate::ports::outbound::BundleSizeProvider;
use crate::sbom_generation::domain::BundleSizeBytes;
use crate::shared::security::validate_package_name_for_url;
use crate::shared::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BUNDLEPHOBIA_URL: &str = "https://bundlephobia.com";

#[derive(Debug, Deserialize)]
struct SizeResponse {
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    gzip: Option<u64>,
}

/// BundlephobiaClient adapter for minified/gzipped bundle sizes
pub struct BundlephobiaClient {
    client: reqwest::Client,
    base_url: String,
}

impl BundlephobiaClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BUNDLEPHOBIA_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(30))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BundleSizeProvider for BundlephobiaClient {
    async fn fetch_bundle_size(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Option<BundleSizeBytes>> {
        validate_package_name_for_url(package_name)?;

        let url = format!("{}/api/size", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("package", format!("{}@{}", package_name, version))])
            .send()
            .await?;

        // Packages that cannot be bundled (CLIs, native addons) are reported as 404
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("Bundlephobia API returned status code {}", response.status());
        }

        let body: SizeResponse = response.json().await?;
        Ok(match (body.size, body.gzip) {
            (Some(minified), Some(gzipped)) => Some(BundleSizeBytes { minified, gzipped }),
            (Some(minified), None) => Some(BundleSizeBytes {
                minified,
                gzipped: 0,
            }),
            _ => None,
        })
    }
}
