use super::insights_aggregator::ABANDONED_AFTER_DAYS;
use crate::sbom_generation::domain::{
    ComplianceControl, ComplianceReport, ControlStatus, CoverageDepth, SbomAggregate,
};

pub const COMPLIANCE_STANDARD: &str = "ISO/IEC 27001:2022";

const HASH_COVERAGE_PASS: f64 = 0.9;
const HASH_COVERAGE_WARN: f64 = 0.5;
const SUPPLIER_COVERAGE_PASS: f64 = 0.8;
const SUPPLIER_COVERAGE_WARN: f64 = 0.5;
const KNOWN_UNKNOWN_FAIL_RATIO: f64 = 0.1;

/// ComplianceEvaluator runs the fixed control battery over an aggregate
pub struct ComplianceEvaluator;

impl ComplianceEvaluator {
    pub fn evaluate(aggregate: &SbomAggregate) -> ComplianceReport {
        let controls = vec![
            Self::asset_inventory(aggregate),
            Self::vulnerability_management(aggregate),
            Self::supplier_relationships(aggregate),
            Self::intellectual_property(aggregate),
            Self::supply_chain_coverage(aggregate),
        ];
        ComplianceReport::new(
            COMPLIANCE_STANDARD.to_string(),
            aggregate.generated_at(),
            controls,
        )
    }

    /// A.5.9: every component is inventoried and (ideally) carries a hash
    fn asset_inventory(aggregate: &SbomAggregate) -> ComplianceControl {
        let total = aggregate.total_dependencies;
        let hashed = aggregate
            .all_records()
            .filter(|r| r.hashes.integrity.is_some() || r.hashes.sha1.is_some())
            .count();

        let mut findings = vec![format!("{} components inventoried", total)];
        let status = if total == 0 {
            findings.push("No components could be inventoried".to_string());
            ControlStatus::Warning
        } else {
            let coverage = ratio(hashed, total);
            findings.push(format!(
                "Hash coverage: {:.0}% ({}/{})",
                coverage * 100.0,
                hashed,
                total
            ));
            if coverage >= HASH_COVERAGE_PASS {
                ControlStatus::Pass
            } else if coverage >= HASH_COVERAGE_WARN {
                ControlStatus::Warning
            } else {
                ControlStatus::Fail
            }
        };

        control(
            "A.5.9",
            "Inventory of information and other associated assets",
            "Components are inventoried with integrity hashes for tamper evidence",
            status,
            findings,
            "Regenerate the lockfile so every package carries registry integrity data",
        )
    }

    /// A.8.8: no critical vulnerabilities, and ideally no high ones
    fn vulnerability_management(aggregate: &SbomAggregate) -> ComplianceControl {
        let summary = &aggregate.insights.vulnerability_summary;
        let findings = vec![
            format!("{} known vulnerabilities", summary.total),
            format!(
                "Critical: {}, High: {}, Moderate: {}, Low: {}",
                summary.critical, summary.high, summary.moderate, summary.low
            ),
            format!("{} packages affected", summary.packages_affected),
        ];
        let status = if summary.critical > 0 {
            ControlStatus::Fail
        } else if summary.high > 0 {
            ControlStatus::Warning
        } else {
            ControlStatus::Pass
        };

        control(
            "A.8.8",
            "Management of technical vulnerabilities",
            "Known vulnerabilities in dependencies are identified and remediated",
            status,
            findings,
            "Upgrade affected packages to their fixed versions, starting with critical findings",
        )
    }

    /// A.5.19: suppliers are identifiable and still active
    fn supplier_relationships(aggregate: &SbomAggregate) -> ComplianceControl {
        let total = aggregate.total_dependencies;
        let with_supplier = aggregate.all_records().filter(|r| r.supplier.is_some()).count();
        let deprecated = aggregate.all_records().filter(|r| r.is_deprecated()).count();
        let abandoned = aggregate
            .all_records()
            .filter(|r| r.days_since_update > ABANDONED_AFTER_DAYS)
            .count();
        let coverage = if total == 0 { 1.0 } else { ratio(with_supplier, total) };

        let findings = vec![
            format!(
                "Supplier identified for {:.0}% of components ({}/{})",
                coverage * 100.0,
                with_supplier,
                total
            ),
            format!("{} deprecated packages", deprecated),
            format!("{} abandoned packages (no release in over 2 years)", abandoned),
        ];
        let status = if coverage < SUPPLIER_COVERAGE_WARN {
            ControlStatus::Fail
        } else if coverage < SUPPLIER_COVERAGE_PASS || deprecated > 0 || abandoned > 0 {
            ControlStatus::Warning
        } else {
            ControlStatus::Pass
        };

        control(
            "A.5.19",
            "Information security in supplier relationships",
            "Component suppliers are known and actively maintaining their packages",
            status,
            findings,
            "Replace deprecated or abandoned packages and review packages without a known maintainer",
        )
    }

    /// A.5.32: no restrictive licenses ship in production
    fn intellectual_property(aggregate: &SbomAggregate) -> ComplianceControl {
        let restrictive_prod = aggregate
            .all_records()
            .filter(|r| r.license_problematic && !r.is_dev)
            .count();
        let restrictive_dev = aggregate
            .all_records()
            .filter(|r| r.license_problematic && r.is_dev)
            .count();
        let unknown = aggregate.all_records().filter(|r| r.license.is_none()).count();

        let findings = vec![
            format!(
                "{} restrictive licenses in production dependencies",
                restrictive_prod
            ),
            format!(
                "{} restrictive licenses in development dependencies",
                restrictive_dev
            ),
            format!("{} packages without a declared license", unknown),
        ];
        let status = if restrictive_prod > 0 {
            ControlStatus::Fail
        } else if restrictive_dev > 0 || unknown > 0 {
            ControlStatus::Warning
        } else {
            ControlStatus::Pass
        };

        control(
            "A.5.32",
            "Intellectual property rights",
            "Dependency licenses are known and compatible with distribution",
            status,
            findings,
            "Obtain legal review for copyleft licenses or replace the affected packages",
        )
    }

    /// A.5.21: the SBOM itself is complete and its scope declared
    fn supply_chain_coverage(aggregate: &SbomAggregate) -> ComplianceControl {
        let unknowns = aggregate.known_unknowns.len();
        let declared = aggregate.declared_count();
        let unknown_ratio = if declared == 0 { 0.0 } else { ratio(unknowns, declared) };
        let depth = aggregate.coverage.depth;

        let findings = vec![
            format!("{} known unknowns out of {} declared dependencies", unknowns, declared),
            format!("Coverage depth: {}", depth.as_str()),
        ];
        let status = if unknown_ratio > KNOWN_UNKNOWN_FAIL_RATIO {
            ControlStatus::Fail
        } else if unknowns > 0 || depth == CoverageDepth::TopLevel {
            ControlStatus::Warning
        } else {
            ControlStatus::Pass
        };

        control(
            "A.5.21",
            "Managing information security in the ICT supply chain",
            "The SBOM covers every declared dependency and states its analysis depth",
            status,
            findings,
            "Re-run with transitive analysis enabled and resolve the known unknowns",
        )
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64
}

fn control(
    id: &str,
    name: &str,
    description: &str,
    status: ControlStatus,
    findings: Vec<String>,
    recommendation: &str,
) -> ComplianceControl {
    ComplianceControl {
        id: id.to_string(),
        name: name.to_string(),
        status,
        description: description.to_string(),
        findings,
        recommendation: (status != ControlStatus::Pass).then(|| recommendation.to_string()),
    }
}
