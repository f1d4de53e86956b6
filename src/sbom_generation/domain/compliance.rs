use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlStatus {
    Pass,
    Warning,
    Fail,
}

impl ControlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlStatus::Pass => "pass",
            ControlStatus::Warning => "warning",
            ControlStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceVerdict {
    Compliant,
    PartiallyCompliant,
    NonCompliant,
}

impl ComplianceVerdict {
    /// Worst status wins: any fail is non-compliant, otherwise any warning is partial
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a ControlStatus>) -> Self {
        let mut verdict = ComplianceVerdict::Compliant;
        for status in statuses {
            match status {
                ControlStatus::Fail => return ComplianceVerdict::NonCompliant,
                ControlStatus::Warning => verdict = ComplianceVerdict::PartiallyCompliant,
                ControlStatus::Pass => {}
            }
        }
        verdict
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceVerdict::Compliant => "compliant",
            ComplianceVerdict::PartiallyCompliant => "partially_compliant",
            ComplianceVerdict::NonCompliant => "non_compliant",
        }
    }
}

impl std::fmt::Display for ComplianceVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceControl {
    pub id: String,
    pub name: String,
    pub status: ControlStatus,
    pub description: String,
    pub findings: Vec<String>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub standard: String,
    pub generated_at: DateTime<Utc>,
    pub overall: ComplianceVerdict,
    pub controls: Vec<ComplianceControl>,
    pub passed: usize,
    pub warnings: usize,
    pub failed: usize,
}

impl ComplianceReport {
    /// Tallies the controls and derives the overall verdict
    pub fn new(standard: String, generated_at: DateTime<Utc>, controls: Vec<ComplianceControl>) -> Self {
        let count = |wanted: ControlStatus| controls.iter().filter(|c| c.status == wanted).count();
        let passed = count(ControlStatus::Pass);
        let warnings = count(ControlStatus::Warning);
        let failed = count(ControlStatus::Fail);
        let overall = ComplianceVerdict::from_statuses(controls.iter().map(|c| &c.status));

        Self {
            standard,
            generated_at,
            overall,
            controls,
            passed,
            warnings,
            failed,
        }
    }
}
