use super::risk::RiskLevel;
use super::vulnerability::Severity;
use serde::{Deserialize, Serialize};

/// How many entries the ranked insight lists keep
pub const INSIGHT_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskEntry {
    pub name: String,
    pub version: String,
    pub score: u8,
    pub risk_level: RiskLevel,
    pub factors: Vec<String>,
    pub is_dev: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeEntry {
    pub name: String,
    pub version: String,
    pub minified_kb: f64,
    pub gzipped_kb: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickWin {
    pub name: String,
    pub current: String,
    pub latest: String,
    pub security_score: u8,
    pub risk_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedEntry {
    pub name: String,
    pub version: String,
    pub days_since_update: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedEntry {
    pub name: String,
    pub version: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseIssue {
    pub name: String,
    pub version: String,
    pub license: String,
    pub is_dev: bool,
}

/// Vulnerability counts by severity plus how many packages carry at least one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilitySummary {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
    pub none: usize,
    pub unknown: usize,
    pub total: usize,
    pub packages_affected: usize,
}

impl VulnerabilitySummary {
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Moderate => self.moderate += 1,
            Severity::Low => self.low += 1,
            Severity::None => self.none += 1,
            Severity::Unknown => self.unknown += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_dependencies: usize,
    pub production_dependencies: usize,
    pub dev_dependencies: usize,
    pub average_security_score: f64,
    pub outdated_count: usize,
    pub vulnerable_count: usize,
}

/// Cross-cutting summaries over every record of every analyzed package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub top_risks: Vec<RiskEntry>,
    pub heaviest_dependencies: Vec<SizeEntry>,
    pub quick_wins: Vec<QuickWin>,
    pub total_bundle_size_kb: f64,
    pub license_issues: Vec<LicenseIssue>,
    pub abandoned_packages: Vec<AbandonedEntry>,
    pub deprecated_packages: Vec<DeprecatedEntry>,
    pub vulnerability_summary: VulnerabilitySummary,
    pub metrics: Metrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulnerability_summary_record() {
        let mut summary = VulnerabilitySummary::default();
        summary.record(Severity::Critical);
        summary.record(Severity::Moderate);
        summary.record(Severity::Moderate);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.moderate, 2);
        assert_eq!(summary.total, 3);
    }

    #[test]
    fn test_insights_serialize_camel_case() {
        let json = serde_json::to_value(Insights::default()).unwrap();
        assert!(json.get("topRisks").is_some());
        assert!(json.get("quickWins").is_some());
        assert_eq!(json["metrics"]["averageSecurityScore"], 0.0);
    }
}
