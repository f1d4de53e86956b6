use crate::sbom_generation::domain::{DependencyRecord, RiskAssessment, SecurityScore, Severity};

const SECURITY_WEIGHT: f64 = 0.35;
const MAINTENANCE_WEIGHT: f64 = 0.25;
const POPULARITY_WEIGHT: f64 = 0.15;
const LICENSE_WEIGHT: f64 = 0.10;
const VULNERABILITY_WEIGHT: f64 = 0.15;

/// Component values below this (on the 0-100 scale) produce a factor line
const LOW_SIGNAL_THRESHOLD: u8 = 50;
const STALE_AFTER_DAYS: i64 = 365;

/// RiskScorer computes the weighted health score of a dependency record
///
/// The score is a pure function of the record, so re-scoring after new
/// vulnerability data arrives always starts from scratch.
pub struct RiskScorer;

impl RiskScorer {
    pub fn score(record: &DependencyRecord) -> RiskAssessment {
        let sum = Self::weighted_sum(record);
        let score = (sum * 100.0).round().clamp(0.0, 100.0) as u8;
        RiskAssessment::new(score, Self::factors(record))
    }

    /// Replaces the record's assessment with a freshly computed one
    pub fn attach(mut record: DependencyRecord) -> DependencyRecord {
        record.risk = Self::score(&record);
        record
    }

    /// The weighted [0, 1] sum before rounding, halved for deprecated packages
    pub fn weighted_sum(record: &DependencyRecord) -> f64 {
        let security = f64::from(record.security_score.value_or_zero()) / 100.0;
        let maintenance = f64::from(record.maintenance_score.min(100)) / 100.0;
        let popularity = f64::from(record.popularity_score.min(100)) / 100.0;
        let license = if record.license_problematic { 0.5 } else { 1.0 };

        let sum = SECURITY_WEIGHT * security
            + MAINTENANCE_WEIGHT * maintenance
            + POPULARITY_WEIGHT * popularity
            + LICENSE_WEIGHT * license
            + VULNERABILITY_WEIGHT * Self::vulnerability_component(record);

        if record.is_deprecated() {
            sum / 2.0
        } else {
            sum
        }
    }

    /// 1.0 without vulnerabilities, 0.0 with any critical, 0.3 with any high,
    /// 0.6 otherwise
    pub fn vulnerability_component(record: &DependencyRecord) -> f64 {
        if record.vulnerabilities.is_empty() {
            return 1.0;
        }
        let severities = || record.vulnerabilities.iter().map(|v| v.severity);
        if severities().any(|s| s == Severity::Critical) {
            0.0
        } else if severities().any(|s| s == Severity::High) {
            0.3
        } else {
            0.6
        }
    }

    fn factors(record: &DependencyRecord) -> Vec<String> {
        let mut factors = Vec::new();

        match record.security_score {
            SecurityScore::Unavailable => factors.push("Security score unavailable".to_string()),
            SecurityScore::Available(score) if score < LOW_SIGNAL_THRESHOLD => {
                factors.push(format!("Low security score ({}/100)", score))
            }
            SecurityScore::Available(_) => {}
        }

        if record.days_since_update > STALE_AFTER_DAYS {
            factors.push(format!(
                "Not updated in {} months",
                record.days_since_update / 30
            ));
        }

        if record.popularity_score < LOW_SIGNAL_THRESHOLD {
            factors.push(format!(
                "Low popularity ({} weekly downloads)",
                record.weekly_downloads
            ));
        }

        if record.license_problematic {
            factors.push(format!(
                "Restrictive license ({})",
                record.license.as_deref().unwrap_or("unknown")
            ));
        }

        if let Some(highest) = record.highest_severity() {
            let count = record.vulnerabilities.len();
            factors.push(format!(
                "{} known {} (highest: {})",
                count,
                if count == 1 { "vulnerability" } else { "vulnerabilities" },
                highest
            ));
        }

        if let Some(message) = &record.deprecated {
            factors.push(format!("Deprecated: {}", message));
        }

        factors
    }
}
