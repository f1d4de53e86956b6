use async_trait::async_trait;
use chrono::{Duration, Utc};
use npm_sbom::prelude::*;
use npm_sbom::sbom_generation::domain::{DistInfo, RegistryMetadata, VersionMetadata};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock RegistryClient for testing
///
/// Unknown packages and packages marked as failing return an error on
/// every call; the call counter covers both.
#[derive(Default)]
pub struct MockRegistryClient {
    pub packages: HashMap<String, RegistryMetadata>,
    calls: AtomicUsize,
}

impl MockRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A package whose latest version is `latest`, published `days_ago` days ago
    pub fn with_package(mut self, name: &str, latest: &str, license: &str, days_ago: i64) -> Self {
        let version = VersionMetadata {
            license: Some(license.to_string()),
            dist: DistInfo {
                integrity: Some(format!("sha512-{}", name)),
                shasum: None,
                tarball: Some(format!("https://registry.npmjs.org/{0}/-/{0}-{1}.tgz", name, latest)),
            },
            ..Default::default()
        };
        let mut versions = BTreeMap::new();
        versions.insert(latest.to_string(), version);
        let mut time = BTreeMap::new();
        time.insert(latest.to_string(), Utc::now() - Duration::days(days_ago));

        self.packages.insert(
            name.to_string(),
            RegistryMetadata {
                name: name.to_string(),
                description: Some(format!("{} package", name)),
                license: Some(license.to_string()),
                latest_version: Some(latest.to_string()),
                versions,
                time,
                ..Default::default()
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryClient for MockRegistryClient {
    async fn fetch_metadata(&self, package_name: &str) -> Result<RegistryMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.packages
            .get(package_name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("registry returned 503 for {}", package_name))
    }
}
