/// Network adapters for the upstream data providers
mod bundlephobia_client;
mod caching_registry_client;
mod npm_downloads_client;
mod npm_registry_client;
mod osv_client;
mod security_score_client;

pub use bundlephobia_client::BundlephobiaClient;
pub use caching_registry_client::CachingRegistryClient;
pub use npm_downloads_client::NpmDownloadsClient;
pub use npm_registry_client::{parse_packument, NpmRegistryClient, DEFAULT_REGISTRY_URL};
pub use osv_client::OsvClient;
pub use security_score_client::SecurityScoreClient;

use crate::shared::Result;
use std::time::Duration;

/// Builds the HTTP client every provider adapter shares its settings with
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let version = env!("CARGO_PKG_VERSION");
    let user_agent = format!("npm-sbom/{}", version);

    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()?)
}
