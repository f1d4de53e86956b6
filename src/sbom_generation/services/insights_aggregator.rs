use crate::sbom_generation::domain::insights::{
    AbandonedEntry, DeprecatedEntry, LicenseIssue, Metrics, QuickWin, RiskEntry, SizeEntry,
    VulnerabilitySummary, INSIGHT_LIST_LIMIT,
};
use crate::sbom_generation::domain::risk::LOW_RISK_THRESHOLD;
use crate::sbom_generation::domain::{DependencyRecord, Insights, OutdatedInfo, PackageAnalysis};
use std::collections::{BTreeMap, HashSet};

/// Days without a publish after which a package counts as abandoned
pub const ABANDONED_AFTER_DAYS: i64 = 730;

/// InsightsAggregator derives the cross-cutting summaries of a run
///
/// Pure and idempotent: calling it again after outdated or audit data changes
/// replaces the previous insights entirely. All sorts are stable, so records
/// with equal keys keep their package order.
pub struct InsightsAggregator;

impl InsightsAggregator {
    pub fn aggregate(
        packages: &[PackageAnalysis],
        outdated: Option<&BTreeMap<String, OutdatedInfo>>,
    ) -> Insights {
        let records: Vec<&DependencyRecord> = packages.iter().flat_map(|p| p.records()).collect();

        Insights {
            top_risks: Self::top_risks(&records),
            heaviest_dependencies: Self::heaviest(&records),
            quick_wins: outdated
                .map(|map| Self::quick_wins(&records, map))
                .unwrap_or_default(),
            total_bundle_size_kb: records.iter().map(|r| r.minified_kb()).sum(),
            license_issues: records
                .iter()
                .filter(|r| r.license_problematic)
                .map(|r| LicenseIssue {
                    name: r.name.clone(),
                    version: r.current_version.clone(),
                    license: r.license.clone().unwrap_or_default(),
                    is_dev: r.is_dev,
                })
                .collect(),
            abandoned_packages: Self::abandoned(&records),
            deprecated_packages: records
                .iter()
                .filter_map(|r| {
                    r.deprecated.as_ref().map(|message| DeprecatedEntry {
                        name: r.name.clone(),
                        version: r.current_version.clone(),
                        message: message.clone(),
                    })
                })
                .collect(),
            vulnerability_summary: Self::vulnerability_summary(&records),
            metrics: Self::metrics(&records),
        }
    }

    fn top_risks(records: &[&DependencyRecord]) -> Vec<RiskEntry> {
        let mut risky: Vec<&&DependencyRecord> = records
            .iter()
            .filter(|r| r.risk.score < LOW_RISK_THRESHOLD)
            .collect();
        risky.sort_by_key(|r| r.risk.score);

        risky
            .into_iter()
            .take(INSIGHT_LIST_LIMIT)
            .map(|r| RiskEntry {
                name: r.name.clone(),
                version: r.current_version.clone(),
                score: r.risk.score,
                risk_level: r.risk.risk_level,
                factors: r.risk.factors.clone(),
                is_dev: r.is_dev,
            })
            .collect()
    }

    fn heaviest(records: &[&DependencyRecord]) -> Vec<SizeEntry> {
        let mut sized: Vec<&&DependencyRecord> =
            records.iter().filter(|r| r.minified_kb() > 0.0).collect();
        sized.sort_by(|a, b| b.minified_kb().total_cmp(&a.minified_kb()));

        sized
            .into_iter()
            .take(INSIGHT_LIST_LIMIT)
            .filter_map(|r| {
                r.bundle_size.map(|size| SizeEntry {
                    name: r.name.clone(),
                    version: r.current_version.clone(),
                    minified_kb: size.minified_kb,
                    gzipped_kb: size.gzipped_kb,
                })
            })
            .collect()
    }

    fn quick_wins(
        records: &[&DependencyRecord],
        outdated: &BTreeMap<String, OutdatedInfo>,
    ) -> Vec<QuickWin> {
        let mut candidates: Vec<(&&DependencyRecord, &OutdatedInfo)> = records
            .iter()
            .filter_map(|r| outdated.get(&r.name).map(|info| (r, info)))
            .collect();
        candidates.sort_by_key(|(r, _)| (r.security_score.value_or_zero(), r.risk.score));

        // the outdated map is keyed by name, so a name shared by several
        // monorepo members is listed once
        let mut seen = HashSet::new();
        candidates
            .into_iter()
            .filter(|(r, _)| seen.insert(r.name.clone()))
            .take(INSIGHT_LIST_LIMIT)
            .map(|(r, info)| QuickWin {
                name: r.name.clone(),
                current: info.current.clone(),
                latest: info.latest.clone(),
                security_score: r.security_score.value_or_zero(),
                risk_score: r.risk.score,
            })
            .collect()
    }

    fn abandoned(records: &[&DependencyRecord]) -> Vec<AbandonedEntry> {
        let mut stale: Vec<&&DependencyRecord> = records
            .iter()
            .filter(|r| r.days_since_update > ABANDONED_AFTER_DAYS)
            .collect();
        stale.sort_by(|a, b| b.days_since_update.cmp(&a.days_since_update));

        stale
            .into_iter()
            .take(INSIGHT_LIST_LIMIT)
            .map(|r| AbandonedEntry {
                name: r.name.clone(),
                version: r.current_version.clone(),
                days_since_update: r.days_since_update,
            })
            .collect()
    }

    fn vulnerability_summary(records: &[&DependencyRecord]) -> VulnerabilitySummary {
        let mut summary = VulnerabilitySummary::default();
        for record in records {
            for vulnerability in &record.vulnerabilities {
                summary.record(vulnerability.severity);
            }
        }
        summary.packages_affected = records
            .iter()
            .filter(|r| r.has_vulnerabilities())
            .map(|r| (r.name.as_str(), r.current_version.as_str()))
            .collect::<HashSet<_>>()
            .len();
        summary
    }

    fn metrics(records: &[&DependencyRecord]) -> Metrics {
        let total = records.len();
        let dev = records.iter().filter(|r| r.is_dev).count();
        let average_security_score = if total == 0 {
            0.0
        } else {
            records
                .iter()
                .map(|r| f64::from(r.security_score.value_or_zero()))
                .sum::<f64>()
                / total as f64
        };

        Metrics {
            total_dependencies: total,
            production_dependencies: total - dev,
            dev_dependencies: dev,
            average_security_score,
            outdated_count: records.iter().filter(|r| r.is_outdated()).count(),
            vulnerable_count: records.iter().filter(|r| r.has_vulnerabilities()).count(),
        }
    }
}

/// Outdated map derived from the records themselves (current differs from latest)
pub fn derive_outdated(packages: &[PackageAnalysis]) -> BTreeMap<String, OutdatedInfo> {
    let mut map = BTreeMap::new();
    for record in packages.iter().flat_map(|p| p.records()) {
        if record.is_outdated() {
            map.entry(record.name.clone()).or_insert_with(|| OutdatedInfo {
                current: record.current_version.clone(),
                wanted: record.current_version.clone(),
                latest: record.latest_version.clone(),
            });
        }
    }
    map
}
