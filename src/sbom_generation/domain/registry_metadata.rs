use super::dependency_record::Supplier;
use super::vulnerability::VulnerabilityRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Tarball distribution info for one published version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistInfo {
    pub integrity: Option<String>,
    pub shasum: Option<String>,
    pub tarball: Option<String>,
}

/// The parts of one version's manifest the analysis reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMetadata {
    pub author: Option<Supplier>,
    pub license: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub peer_dependencies: BTreeMap<String, String>,
    pub deprecated: Option<String>,
    pub dist: DistInfo,
}

/// Registry packument reduced to typed, defaulted fields. Every field may be
/// absent; consumers never see raw registry JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryMetadata {
    pub name: String,
    pub description: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
    pub repository_url: Option<String>,
    pub author: Option<Supplier>,
    pub maintainers: Vec<Supplier>,
    pub latest_version: Option<String>,
    pub versions: BTreeMap<String, VersionMetadata>,
    /// Publish times keyed by version, plus the registry's `created`/`modified` keys
    pub time: BTreeMap<String, DateTime<Utc>>,
}

impl RegistryMetadata {
    pub fn version(&self, version: &str) -> Option<&VersionMetadata> {
        self.versions.get(version)
    }

    pub fn latest(&self) -> Option<&VersionMetadata> {
        self.latest_version
            .as_deref()
            .and_then(|latest| self.versions.get(latest))
    }

    /// Publish time of the latest version, falling back to the last modification
    pub fn last_publish(&self) -> Option<DateTime<Utc>> {
        self.latest_version
            .as_deref()
            .and_then(|latest| self.time.get(latest))
            .or_else(|| self.time.get("modified"))
            .copied()
    }
}

/// Bundle size in bytes as reported by the size provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleSizeBytes {
    pub minified: u64,
    pub gzipped: u64,
}

/// Settled outputs of every provider call for one declaration.
///
/// `None` means the provider stayed unavailable after retries (or was not
/// asked because the feature is switched off).
#[derive(Debug, Clone)]
pub struct ProviderOutputs {
    pub registry: std::result::Result<RegistryMetadata, String>,
    pub security_score: Option<u8>,
    pub bundle_size: Option<BundleSizeBytes>,
    pub weekly_downloads: Option<u64>,
    pub vulnerabilities: Option<Vec<VulnerabilityRecord>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_last_publish_prefers_latest_version_time() {
        let mut metadata = RegistryMetadata {
            latest_version: Some("2.0.0".to_string()),
            ..Default::default()
        };
        let modified = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        metadata.time.insert("modified".to_string(), modified);
        assert_eq!(metadata.last_publish(), Some(modified));

        metadata.time.insert("2.0.0".to_string(), published);
        assert_eq!(metadata.last_publish(), Some(published));
    }

    #[test]
    fn test_latest_lookup() {
        let mut metadata = RegistryMetadata::default();
        assert!(metadata.latest().is_none());
        metadata.latest_version = Some("1.0.0".to_string());
        metadata
            .versions
            .insert("1.0.0".to_string(), VersionMetadata::default());
        assert!(metadata.latest().is_some());
    }
}
