use super::aggregate::AuditSummary;
use super::vulnerability::VulnerabilityRecord;

/// One advisory from an audit feed, attributed to the package it affects
#[derive(Debug, Clone, PartialEq)]
pub struct AuditFinding {
    pub package: String,
    pub vulnerability: VulnerabilityRecord,
}

/// A parsed audit feed: per-package advisories plus the feed's own tallies
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFeed {
    pub findings: Vec<AuditFinding>,
    pub summary: AuditSummary,
}

impl AuditFeed {
    pub fn findings_for<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a VulnerabilityRecord> {
        self.findings
            .iter()
            .filter(move |f| f.package == package)
            .map(|f| &f.vulnerability)
    }
}
