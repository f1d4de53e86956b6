use super::known_unknown::KnownUnknown;
use super::risk::RiskAssessment;
use super::vulnerability::{Severity, VulnerabilityRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Security score from the package-health provider, or the "unavailable"
/// sentinel when the provider never answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u8>", into = "Option<u8>")]
pub enum SecurityScore {
    Available(u8),
    #[default]
    Unavailable,
}

impl SecurityScore {
    pub fn new(value: u8) -> Self {
        SecurityScore::Available(value.min(100))
    }

    /// Zero stands in for an unavailable score wherever a number is required
    pub fn value_or_zero(&self) -> u8 {
        match self {
            SecurityScore::Available(value) => *value,
            SecurityScore::Unavailable => 0,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SecurityScore::Available(_))
    }
}

impl From<Option<u8>> for SecurityScore {
    fn from(value: Option<u8>) -> Self {
        value.map_or(SecurityScore::Unavailable, SecurityScore::new)
    }
}

impl From<SecurityScore> for Option<u8> {
    fn from(value: SecurityScore) -> Self {
        match value {
            SecurityScore::Available(v) => Some(v),
            SecurityScore::Unavailable => None,
        }
    }
}

/// Minified and gzipped bundle size, in kilobytes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BundleSize {
    pub minified_kb: f64,
    pub gzipped_kb: f64,
}

impl BundleSize {
    pub fn from_bytes(minified: u64, gzipped: u64) -> Self {
        Self {
            minified_kb: bytes_to_kb(minified),
            gzipped_kb: bytes_to_kb(gzipped),
        }
    }
}

fn bytes_to_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

/// Cryptographic digests published by the registry for the resolved tarball
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hashes {
    /// Subresource-integrity string, e.g. `sha512-<base64>`
    pub integrity: Option<String>,
    /// Legacy hex SHA-1 (`dist.shasum`)
    pub sha1: Option<String>,
}

impl Hashes {
    pub fn is_empty(&self) -> bool {
        self.integrity.is_none() && self.sha1.is_none()
    }
}

/// Best-effort supplier identity taken from the author or first maintainer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Supplier {
    pub name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

impl Supplier {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.url.is_none()
    }
}

/// The normalized, scored result for one declared dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyRecord {
    pub name: String,
    pub version_range: String,
    pub current_version: String,
    pub latest_version: String,
    pub is_dev: bool,
    pub description: String,
    pub license: Option<String>,
    pub license_problematic: bool,
    pub homepage: Option<String>,
    pub download_url: Option<String>,
    pub security_score: SecurityScore,
    pub maintenance_score: u8,
    pub popularity_score: u8,
    pub weekly_downloads: u64,
    pub days_since_update: i64,
    pub last_publish: Option<DateTime<Utc>>,
    pub bundle_size: Option<BundleSize>,
    pub hashes: Hashes,
    pub supplier: Option<Supplier>,
    pub deprecated: Option<String>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
    pub transitive_dependencies: Option<Vec<String>>,
    pub peer_dependencies: BTreeMap<String, String>,
    pub dependency_count: usize,
    pub risk: RiskAssessment,
}

impl DependencyRecord {
    pub fn has_vulnerabilities(&self) -> bool {
        !self.vulnerabilities.is_empty()
    }

    pub fn is_outdated(&self) -> bool {
        self.current_version != self.latest_version
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    /// Worst severity among known vulnerabilities
    pub fn highest_severity(&self) -> Option<Severity> {
        self.vulnerabilities
            .iter()
            .map(|v| v.severity)
            .max_by_key(|s| s.rank())
    }

    pub fn minified_kb(&self) -> f64 {
        self.bundle_size.map(|b| b.minified_kb).unwrap_or(0.0)
    }

    pub fn purl(&self) -> String {
        npm_purl(&self.name, &self.current_version)
    }
}

/// What analysis produced for one declaration: a scored record, or an
/// explicit known unknown
#[derive(Debug, Clone, PartialEq)]
pub enum DependencyOutcome {
    Record(Box<DependencyRecord>),
    Unknown(KnownUnknown),
}

/// Package URL for an npm package; the scope's `@` is percent-encoded as the
/// purl specification requires.
pub fn npm_purl(name: &str, version: &str) -> String {
    match name.strip_prefix('@') {
        Some(scoped) => format!("pkg:npm/%40{}@{}", scoped, version),
        None => format!("pkg:npm/{}@{}", name, version),
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_record;
    use super::*;

    #[test]
    fn test_security_score_sentinel_serde() {
        assert_eq!(serde_json::to_string(&SecurityScore::new(80)).unwrap(), "80");
        assert_eq!(
            serde_json::to_string(&SecurityScore::Unavailable).unwrap(),
            "null"
        );
        let parsed: SecurityScore = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, SecurityScore::Unavailable);
    }

    #[test]
    fn test_security_score_clamped() {
        assert_eq!(SecurityScore::new(150).value_or_zero(), 100);
        assert_eq!(SecurityScore::Unavailable.value_or_zero(), 0);
    }

    #[test]
    fn test_bundle_size_from_bytes() {
        let size = BundleSize::from_bytes(71_168, 25_600);
        assert_eq!(size.minified_kb, 69.5);
        assert_eq!(size.gzipped_kb, 25.0);
    }

    #[test]
    fn test_npm_purl() {
        assert_eq!(npm_purl("lodash", "4.17.21"), "pkg:npm/lodash@4.17.21");
        assert_eq!(
            npm_purl("@types/node", "20.1.0"),
            "pkg:npm/%40types/node@20.1.0"
        );
    }

    #[test]
    fn test_highest_severity() {
        let mut record = sample_record("lodash", "4.17.20");
        assert_eq!(record.highest_severity(), None);
        record.vulnerabilities = vec![
            VulnerabilityRecord::new("A".to_string(), Severity::Low).unwrap(),
            VulnerabilityRecord::new("B".to_string(), Severity::Critical).unwrap(),
            VulnerabilityRecord::new("C".to_string(), Severity::High).unwrap(),
        ];
        assert_eq!(record.highest_severity(), Some(Severity::Critical));
        assert!(record.has_vulnerabilities());
    }

    #[test]
    fn test_is_outdated() {
        let mut record = sample_record("react", "18.2.0");
        assert!(!record.is_outdated());
        record.latest_version = "18.3.1".to_string();
        assert!(record.is_outdated());
    }
}
