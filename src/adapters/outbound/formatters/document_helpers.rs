use crate::sbom_generation::domain::{DependencyRecord, SbomAggregate};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashSet;
use std::hash::Hash;

/// A digest decoded from an npm integrity string
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Digest {
    /// Upper-case algorithm name without separators: `SHA512`, `SHA1`
    pub algorithm: &'static str,
    pub hex: String,
}

/// Records across every package, keeping only the first record for each
/// identity `key` produces. Production records of a package come before its
/// development records, packages in aggregate order.
pub(crate) fn unique_records<K, F>(aggregate: &SbomAggregate, key: F) -> Vec<&DependencyRecord>
where
    K: Eq + Hash,
    F: Fn(&DependencyRecord) -> K,
{
    let mut seen = HashSet::new();
    aggregate
        .all_records()
        .filter(|record| seen.insert(key(*record)))
        .collect()
}

/// Hands out identifiers unique within one document. The first request for
/// a base gets it verbatim, later requests get `-2`, `-3` and so on.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    used: HashSet<String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an identifier as taken without handing it out
    pub fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    pub fn allocate(&mut self, base: String) -> String {
        if self.used.insert(base.clone()) {
            return base;
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Decodes `sha512-<base64> sha1-<base64>` integrity strings plus the legacy
/// hex shasum. Unknown algorithms and undecodable digests are skipped.
pub(crate) fn decode_digests(record: &DependencyRecord) -> Vec<Digest> {
    let mut digests: Vec<Digest> = record
        .hashes
        .integrity
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .filter_map(|entry| {
            let (algorithm, encoded) = entry.split_once('-')?;
            let algorithm = match algorithm.to_ascii_lowercase().as_str() {
                "sha512" => "SHA512",
                "sha384" => "SHA384",
                "sha256" => "SHA256",
                "sha1" => "SHA1",
                _ => return None,
            };
            // Integrity entries may carry `?opts` after the digest
            let encoded = encoded.split('?').next().unwrap_or(encoded);
            let bytes = STANDARD.decode(encoded).ok()?;
            Some(Digest {
                algorithm,
                hex: to_hex(&bytes),
            })
        })
        .collect();

    if let Some(sha1) = record.hashes.sha1.as_deref() {
        let valid = sha1.len() == 40 && sha1.chars().all(|c| c.is_ascii_hexdigit());
        if valid && !digests.iter().any(|d| d.algorithm == "SHA1") {
            digests.push(Digest {
                algorithm: "SHA1",
                hex: sha1.to_ascii_lowercase(),
            });
        }
    }

    digests
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Replaces NaN and infinities so a number always serializes
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Whether a license string is a compound SPDX expression
pub(crate) fn is_license_expression(license: &str) -> bool {
    license.contains(" OR ") || license.contains(" AND ") || license.contains(" WITH ") || license.contains('(')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::aggregate::test_support::empty_aggregate;
    use crate::sbom_generation::domain::dependency_record::test_support::sample_record;
    use crate::sbom_generation::domain::PackageAnalysis;

    #[test]
    fn test_decode_digests_integrity_and_shasum() {
        let mut record = sample_record("lodash", "4.17.21");
        record.hashes.integrity = Some("sha512-v2kDEe57lecTulaDIuNTPy3Ry4gLGJ6Z1O3vE1krgXZNrsQ+LFTGHVxVjcXPs17LhbZVGedAJv8XZ1tvj5FvSg==".to_string());
        record.hashes.sha1 = Some("679591C564C3BFFAAE8454CF0B3DF370C3D6911C".to_string());

        let digests = decode_digests(&record);

        assert_eq!(digests.len(), 2);
        assert_eq!(digests[0].algorithm, "SHA512");
        assert_eq!(digests[0].hex.len(), 128);
        assert!(digests[0].hex.starts_with("bf690311ee"));
        assert_eq!(digests[1].algorithm, "SHA1");
        assert_eq!(digests[1].hex, "679591c564c3bffaae8454cf0b3df370c3d6911c");
    }

    #[test]
    fn test_decode_digests_skips_garbage() {
        let mut record = sample_record("a", "1.0.0");
        record.hashes.integrity = Some("md5-abc sha512-!!!notbase64".to_string());
        record.hashes.sha1 = Some("xyz".to_string());

        assert!(decode_digests(&record).is_empty());
    }

    #[test]
    fn test_unique_records_first_occurrence_wins() {
        let mut first = sample_record("react", "18.2.0");
        first.description = "first".to_string();
        let mut second = sample_record("react", "18.2.0");
        second.description = "second".to_string();

        let mut aggregate = empty_aggregate();
        aggregate.packages = vec![
            PackageAnalysis {
                dependencies: vec![first],
                ..Default::default()
            },
            PackageAnalysis {
                dependencies: vec![second, sample_record("vue", "3.4.0")],
                ..Default::default()
            },
        ];

        let records = unique_records(&aggregate, |r| r.name.clone());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].description, "first");
    }

    #[test]
    fn test_id_allocator_suffixes_collisions() {
        let mut ids = IdAllocator::new();
        ids.reserve("root");

        assert_eq!(ids.allocate("a-b".to_string()), "a-b");
        assert_eq!(ids.allocate("a-b".to_string()), "a-b-2");
        assert_eq!(ids.allocate("a-b-2".to_string()), "a-b-2-2");
        assert_eq!(ids.allocate("root".to_string()), "root-2");
    }

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(1.5), 1.5);
    }

    #[test]
    fn test_is_license_expression() {
        assert!(is_license_expression("MIT OR Apache-2.0"));
        assert!(is_license_expression("(MIT AND BSD-3-Clause)"));
        assert!(!is_license_expression("MIT"));
    }
}
