use crate::sbom_generation::domain::version::{compare_versions, strip_range};
use crate::sbom_generation::domain::{
    BundleSize, DependencyDeclaration, DependencyOutcome, DependencyRecord, Hashes, KnownUnknown,
    ProviderOutputs, RegistryMetadata, RiskAssessment, SecurityScore, VexStatus,
    VulnerabilityRecord,
};
use crate::sbom_generation::policies::LicensePolicy;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Settings that change what the normalizer extracts
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub include_transitive: bool,
    /// Reference instant for "days since update"
    pub now: DateTime<Utc>,
}

/// Normalizer merges the settled provider outputs of one declaration into a
/// canonical record
pub struct Normalizer;

impl Normalizer {
    /// Returns a record, or a known unknown when registry metadata never arrived.
    ///
    /// The returned record carries a placeholder assessment; callers score it
    /// with `RiskScorer::attach`.
    pub fn normalize(
        declaration: &DependencyDeclaration,
        outputs: ProviderOutputs,
        options: NormalizeOptions,
    ) -> DependencyOutcome {
        let metadata = match outputs.registry {
            Ok(metadata) => metadata,
            Err(reason) => {
                return DependencyOutcome::Unknown(KnownUnknown::fetch_failed(
                    declaration.name(),
                    declaration.version_range(),
                    reason,
                ))
            }
        };

        let current_version = strip_range(declaration.version_range());
        let latest_version = metadata
            .latest_version
            .clone()
            .unwrap_or_else(|| current_version.clone());

        let version_metadata = metadata
            .version(&current_version)
            .or_else(|| metadata.latest())
            .cloned()
            .unwrap_or_default();

        let last_publish = metadata.last_publish();
        let days_since_update = last_publish
            .map(|published| (options.now - published).num_days().max(0))
            .unwrap_or(0);

        let license = LicensePolicy::select_license(
            version_metadata.license.clone().or_else(|| metadata.license.clone()),
            &[],
        );
        let license_problematic = license
            .as_deref()
            .map(LicensePolicy::is_problematic)
            .unwrap_or(false);

        let supplier = version_metadata
            .author
            .clone()
            .or_else(|| metadata.author.clone())
            .or_else(|| metadata.maintainers.first().cloned())
            .filter(|s| !s.is_empty());

        let weekly_downloads = outputs.weekly_downloads.unwrap_or(0);

        let vulnerabilities = outputs
            .vulnerabilities
            .unwrap_or_default()
            .into_iter()
            .map(|v| with_vex_status(v, &current_version))
            .collect();

        let transitive_dependencies = options
            .include_transitive
            .then(|| version_metadata.dependencies.keys().cloned().collect());

        let homepage = metadata
            .homepage
            .clone()
            .or_else(|| metadata.repository_url.clone());

        DependencyOutcome::Record(Box::new(DependencyRecord {
            name: declaration.name().to_string(),
            version_range: declaration.version_range().to_string(),
            current_version,
            latest_version,
            is_dev: declaration.is_dev(),
            description: metadata.description.clone().unwrap_or_default(),
            license,
            license_problematic,
            homepage,
            download_url: version_metadata.dist.tarball.clone(),
            security_score: SecurityScore::from(outputs.security_score),
            maintenance_score: maintenance_score(days_since_update, &metadata),
            popularity_score: popularity_score(weekly_downloads),
            weekly_downloads,
            days_since_update,
            last_publish,
            bundle_size: outputs
                .bundle_size
                .map(|b| BundleSize::from_bytes(b.minified, b.gzipped)),
            hashes: Hashes {
                integrity: version_metadata.dist.integrity.clone(),
                sha1: version_metadata.dist.shasum.clone(),
            },
            supplier,
            deprecated: version_metadata.deprecated.clone(),
            vulnerabilities,
            transitive_dependencies,
            dependency_count: version_metadata.dependencies.len(),
            peer_dependencies: version_metadata.peer_dependencies,
            risk: RiskAssessment::new(0, Vec::new()),
        }))
    }
}

/// Starts at 100 and loses points for staleness, gains a few for a long
/// release history
pub fn maintenance_score(days_since_update: i64, metadata: &RegistryMetadata) -> u8 {
    let mut score: i64 = 100;

    if days_since_update > 365 {
        score -= 20;
    } else if days_since_update > 180 {
        score -= 10;
    } else if days_since_update > 90 {
        score -= 5;
    }

    let version_count = metadata.versions.len();
    if version_count > 50 {
        score += 10;
    } else if version_count > 20 {
        score += 5;
    }

    score.clamp(0, 100) as u8
}

/// Step function over weekly downloads
pub fn popularity_score(weekly_downloads: u64) -> u8 {
    match weekly_downloads {
        d if d > 1_000_000 => 100,
        d if d > 100_000 => 90,
        d if d > 10_000 => 70,
        d if d > 1_000 => 50,
        d if d > 100 => 30,
        _ => 10,
    }
}

/// Establishes VEX status from the fix version; left unset when no fix is
/// known or either version does not parse
pub fn with_vex_status(mut vulnerability: VulnerabilityRecord, current: &str) -> VulnerabilityRecord {
    if let Some(fixed_in) = vulnerability.fixed_in.as_deref() {
        vulnerability.vex_status = compare_versions(current, fixed_in).map(|ordering| match ordering {
            Ordering::Less => VexStatus::Affected,
            Ordering::Equal | Ordering::Greater => VexStatus::Fixed,
        });
    }
    vulnerability
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::{
        BundleSizeBytes, DistInfo, Severity, Supplier, VersionMetadata,
    };
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            include_transitive: false,
            now: now(),
        }
    }

    fn declaration(name: &str, range: &str) -> DependencyDeclaration {
        DependencyDeclaration::new(name.to_string(), range.to_string(), false).unwrap()
    }

    fn metadata(latest: &str, published_days_ago: i64) -> RegistryMetadata {
        let mut metadata = RegistryMetadata {
            name: "lodash".to_string(),
            description: Some("Lodash modular utilities.".to_string()),
            license: Some("MIT".to_string()),
            homepage: None,
            repository_url: Some("https://github.com/lodash/lodash".to_string()),
            latest_version: Some(latest.to_string()),
            ..Default::default()
        };
        metadata.versions.insert(
            latest.to_string(),
            VersionMetadata {
                dist: DistInfo {
                    integrity: Some("sha512-abc".to_string()),
                    shasum: Some("deadbeef".to_string()),
                    tarball: Some("https://registry.npmjs.org/lodash/-/lodash.tgz".to_string()),
                },
                ..Default::default()
            },
        );
        metadata
            .time
            .insert(latest.to_string(), now() - Duration::days(published_days_ago));
        metadata
    }

    fn outputs(metadata: RegistryMetadata) -> ProviderOutputs {
        ProviderOutputs {
            registry: Ok(metadata),
            security_score: Some(95),
            bundle_size: Some(BundleSizeBytes {
                minified: 71_168,
                gzipped: 25_600,
            }),
            weekly_downloads: Some(40_000_000),
            vulnerabilities: Some(vec![]),
        }
    }

    fn record(outcome: DependencyOutcome) -> DependencyRecord {
        match outcome {
            DependencyOutcome::Record(record) => *record,
            DependencyOutcome::Unknown(ku) => panic!("unexpected known unknown: {:?}", ku),
        }
    }

    #[test]
    fn test_normalize_healthy_package() {
        let record = record(Normalizer::normalize(
            &declaration("lodash", "^4.17.21"),
            outputs(metadata("4.17.21", 10)),
            options(),
        ));

        assert_eq!(record.current_version, "4.17.21");
        assert!(!record.is_outdated());
        assert_eq!(record.days_since_update, 10);
        assert_eq!(record.maintenance_score, 100);
        assert_eq!(record.popularity_score, 100);
        assert_eq!(record.security_score, SecurityScore::Available(95));
        assert_eq!(record.license.as_deref(), Some("MIT"));
        assert!(!record.license_problematic);
        assert_eq!(record.hashes.integrity.as_deref(), Some("sha512-abc"));
        assert_eq!(record.hashes.sha1.as_deref(), Some("deadbeef"));
        assert_eq!(
            record.homepage.as_deref(),
            Some("https://github.com/lodash/lodash")
        );
        assert_eq!(record.bundle_size.unwrap().minified_kb, 69.5);
        assert!(record.transitive_dependencies.is_none());
    }

    #[test]
    fn test_registry_failure_becomes_fetch_failed() {
        let mut failed = outputs(RegistryMetadata::default());
        failed.registry = Err("registry unavailable after 3 attempts".to_string());

        match Normalizer::normalize(&declaration("ghost", "^1.0.0"), failed, options()) {
            DependencyOutcome::Unknown(ku) => {
                assert_eq!(ku.name, "ghost");
                assert_eq!(ku.version, "^1.0.0");
                assert_eq!(
                    ku.category,
                    crate::sbom_generation::domain::KnownUnknownCategory::FetchFailed
                );
            }
            DependencyOutcome::Record(_) => panic!("expected a known unknown"),
        }
    }

    #[test]
    fn test_secondary_failures_degrade_fields() {
        let mut degraded = outputs(metadata("1.0.0", 10));
        degraded.security_score = None;
        degraded.bundle_size = None;
        degraded.weekly_downloads = None;
        degraded.vulnerabilities = None;

        let record = record(Normalizer::normalize(
            &declaration("pkg", "1.0.0"),
            degraded,
            options(),
        ));
        assert_eq!(record.security_score, SecurityScore::Unavailable);
        assert!(record.bundle_size.is_none());
        assert_eq!(record.weekly_downloads, 0);
        assert_eq!(record.popularity_score, 10);
        assert!(record.vulnerabilities.is_empty());
    }

    #[test]
    fn test_outdated_when_latest_differs() {
        let record = record(Normalizer::normalize(
            &declaration("react", "~18.2.0"),
            outputs(metadata("18.3.1", 30)),
            options(),
        ));
        assert_eq!(record.current_version, "18.2.0");
        assert_eq!(record.latest_version, "18.3.1");
        assert!(record.is_outdated());
    }

    #[test]
    fn test_maintenance_score_steps() {
        let mut meta = RegistryMetadata::default();
        assert_eq!(maintenance_score(10, &meta), 100);
        assert_eq!(maintenance_score(91, &meta), 95);
        assert_eq!(maintenance_score(181, &meta), 90);
        assert_eq!(maintenance_score(366, &meta), 80);

        for i in 0..21 {
            meta.versions
                .insert(format!("1.0.{}", i), VersionMetadata::default());
        }
        assert_eq!(maintenance_score(366, &meta), 85);
        for i in 0..30 {
            meta.versions
                .insert(format!("2.0.{}", i), VersionMetadata::default());
        }
        assert_eq!(maintenance_score(366, &meta), 90);
        assert_eq!(maintenance_score(0, &meta), 100);
    }

    #[test]
    fn test_popularity_score_steps() {
        assert_eq!(popularity_score(2_000_000), 100);
        assert_eq!(popularity_score(1_000_000), 90);
        assert_eq!(popularity_score(100_001), 90);
        assert_eq!(popularity_score(10_001), 70);
        assert_eq!(popularity_score(1_001), 50);
        assert_eq!(popularity_score(101), 30);
        assert_eq!(popularity_score(100), 10);
        assert_eq!(popularity_score(0), 10);
    }

    #[test]
    fn test_vex_status_from_fixed_in() {
        let mut critical = VulnerabilityRecord::new("GHSA-x".to_string(), Severity::Critical).unwrap();
        critical.fixed_in = Some("2.0.0".to_string());
        let mut no_fix = VulnerabilityRecord::new("GHSA-y".to_string(), Severity::Low).unwrap();
        no_fix.fixed_in = None;

        let mut out = outputs(metadata("2.0.0", 10));
        out.vulnerabilities = Some(vec![critical, no_fix]);

        let record = record(Normalizer::normalize(
            &declaration("pkg", "1.9.0"),
            out,
            options(),
        ));
        assert_eq!(record.vulnerabilities[0].vex_status, Some(VexStatus::Affected));
        assert_eq!(record.vulnerabilities[1].vex_status, None);

        let patched = with_vex_status(record.vulnerabilities[0].clone(), "2.0.0");
        assert_eq!(patched.vex_status, Some(VexStatus::Fixed));
    }

    #[test]
    fn test_vex_status_prerelease_fix() {
        let mut vuln = VulnerabilityRecord::new("GHSA-z".to_string(), Severity::High).unwrap();
        vuln.fixed_in = Some("1.0.0-beta.10".to_string());

        let before_fix = with_vex_status(vuln.clone(), "1.0.0-beta.2");
        assert_eq!(before_fix.vex_status, Some(VexStatus::Affected));

        let at_fix = with_vex_status(vuln.clone(), "1.0.0-beta.10");
        assert_eq!(at_fix.vex_status, Some(VexStatus::Fixed));

        let unparseable = with_vex_status(vuln, "next");
        assert_eq!(unparseable.vex_status, None);
    }

    #[test]
    fn test_supplier_precedence() {
        let mut meta = metadata("1.0.0", 10);
        meta.maintainers = vec![Supplier {
            name: Some("maintainer".to_string()),
            ..Default::default()
        }];
        let record_a = record(Normalizer::normalize(
            &declaration("pkg", "1.0.0"),
            outputs(meta.clone()),
            options(),
        ));
        assert_eq!(
            record_a.supplier.and_then(|s| s.name).as_deref(),
            Some("maintainer")
        );

        meta.author = Some(Supplier {
            name: Some("author".to_string()),
            ..Default::default()
        });
        let record_b = record(Normalizer::normalize(
            &declaration("pkg", "1.0.0"),
            outputs(meta),
            options(),
        ));
        assert_eq!(record_b.supplier.and_then(|s| s.name).as_deref(), Some("author"));
    }

    #[test]
    fn test_absent_hashes_are_not_fabricated() {
        let mut meta = metadata("1.0.0", 10);
        meta.versions.insert("1.0.0".to_string(), VersionMetadata::default());
        let record = record(Normalizer::normalize(
            &declaration("pkg", "1.0.0"),
            outputs(meta),
            options(),
        ));
        assert!(record.hashes.is_empty());
        assert!(record.supplier.is_none());
        assert!(record.download_url.is_none());
    }

    #[test]
    fn test_transitive_names_only_when_enabled() {
        let mut meta = metadata("1.0.0", 10);
        if let Some(v) = meta.versions.get_mut("1.0.0") {
            v.dependencies.insert("dep-a".to_string(), "^1.0.0".to_string());
            v.peer_dependencies.insert("react".to_string(), ">=17".to_string());
        }
        let opts = NormalizeOptions {
            include_transitive: true,
            now: now(),
        };
        let record = record(Normalizer::normalize(
            &declaration("pkg", "1.0.0"),
            outputs(meta),
            opts,
        ));
        assert_eq!(record.transitive_dependencies, Some(vec!["dep-a".to_string()]));
        assert_eq!(record.dependency_count, 1);
        assert_eq!(record.peer_dependencies.get("react").map(String::as_str), Some(">=17"));
    }

    #[test]
    fn test_problematic_license_flagged() {
        let mut meta = metadata("1.0.0", 10);
        meta.license = Some("GPL-3.0".to_string());
        let record = record(Normalizer::normalize(
            &declaration("pkg", "1.0.0"),
            outputs(meta),
            options(),
        ));
        assert!(record.license_problematic);
    }
}
