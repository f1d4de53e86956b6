use crate::sbom_generation::domain::SbomAggregate;
use crate::shared::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};

const SHA256_PREFIX: &str = "sha256:";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordProjection<'a> {
    name: &'a str,
    version: &'a str,
    license: Option<&'a str>,
    integrity: Option<&'a str>,
    risk_score: u8,
    dev: bool,
}

#[derive(Serialize)]
struct PackageProjection<'a> {
    name: String,
    records: Vec<RecordProjection<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateProjection<'a> {
    packages: Vec<PackageProjection<'a>>,
    generated_at: String,
    total_dependencies: usize,
}

/// IntegrityHasher produces the tamper-evidence digest of an aggregate
///
/// Only a sorted projection is hashed, so record arrival order never changes
/// the digest.
pub struct IntegrityHasher;

impl IntegrityHasher {
    /// Returns `sha256:<hex>` over the canonical projection
    pub fn hash(aggregate: &SbomAggregate) -> Result<String> {
        let bytes = serde_json::to_vec(&Self::projection(aggregate))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{}{:x}", SHA256_PREFIX, hasher.finalize()))
    }

    /// Re-derives the digest and compares; unknown algorithms never verify
    pub fn verify(aggregate: &SbomAggregate, expected: &str) -> bool {
        if !expected.starts_with(SHA256_PREFIX) {
            return false;
        }
        match Self::hash(aggregate) {
            Ok(actual) => actual.eq_ignore_ascii_case(expected),
            Err(_) => false,
        }
    }

    fn projection(aggregate: &SbomAggregate) -> AggregateProjection<'_> {
        let mut packages: Vec<PackageProjection<'_>> = aggregate
            .packages
            .iter()
            .map(|package| {
                let mut records: Vec<RecordProjection<'_>> = package
                    .records()
                    .map(|r| RecordProjection {
                        name: &r.name,
                        version: &r.current_version,
                        license: r.license.as_deref(),
                        integrity: r.hashes.integrity.as_deref(),
                        risk_score: r.risk.score,
                        dev: r.is_dev,
                    })
                    .collect();
                records.sort_by(|a, b| (a.name, a.version, a.dev).cmp(&(b.name, b.version, b.dev)));
                PackageProjection {
                    name: package.display_name(),
                    records,
                }
            })
            .collect();
        packages.sort_by(|a, b| a.name.cmp(&b.name));

        AggregateProjection {
            packages,
            generated_at: aggregate.metadata.timestamp(),
            total_dependencies: aggregate.total_dependencies,
        }
    }
}
