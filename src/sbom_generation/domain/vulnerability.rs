use crate::shared::Result;
use serde::{Deserialize, Serialize};

/// Vulnerability severity as reported by advisory databases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    None,
    Low,
    Moderate,
    High,
    Critical,
    #[default]
    Unknown,
}

impl Severity {
    /// Maps a CVSS v3 base score onto the qualitative scale
    pub fn from_cvss_score(score: CvssScore) -> Self {
        match score.value() {
            s if s >= 9.0 => Severity::Critical,
            s if s >= 7.0 => Severity::High,
            s if s >= 4.0 => Severity::Moderate,
            s if s > 0.0 => Severity::Low,
            _ => Severity::None,
        }
    }

    /// Parses advisory severity labels; "MEDIUM" is accepted as a synonym of MODERATE
    pub fn parse(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MODERATE" | "MEDIUM" => Severity::Moderate,
            "LOW" => Severity::Low,
            "NONE" | "INFO" => Severity::None,
            _ => Severity::Unknown,
        }
    }

    /// Ordering weight, higher is worse. Unknown ranks below every real rating.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 5,
            Severity::High => 4,
            Severity::Moderate => 3,
            Severity::Low => 2,
            Severity::None => 1,
            Severity::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "NONE",
            Severity::Low => "LOW",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CVSS base score, guaranteed to lie in [0.0, 10.0]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct CvssScore(f32);

impl CvssScore {
    pub fn new(value: f32) -> Result<Self> {
        if !value.is_finite() || !(0.0..=10.0).contains(&value) {
            anyhow::bail!("CVSS score must be between 0.0 and 10.0, got {}", value);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl TryFrom<f32> for CvssScore {
    type Error = anyhow::Error;

    fn try_from(value: f32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CvssScore> for f32 {
    fn from(value: CvssScore) -> Self {
        value.0
    }
}

/// VEX (Vulnerability Exploitability eXchange) status of one vulnerability
/// against the resolved component version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VexStatus {
    NotAffected,
    Affected,
    Fixed,
    UnderInvestigation,
}

impl VexStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VexStatus::NotAffected => "not_affected",
            VexStatus::Affected => "affected",
            VexStatus::Fixed => "fixed",
            VexStatus::UnderInvestigation => "under_investigation",
        }
    }
}

/// A known vulnerability affecting one dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub cvss_score: Option<CvssScore>,
    #[serde(default)]
    pub cvss_vector: Option<String>,
    #[serde(default)]
    pub cwe_ids: Vec<String>,
    #[serde(default)]
    pub fixed_in: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub vex_status: Option<VexStatus>,
}

impl VulnerabilityRecord {
    pub fn new(id: String, severity: Severity) -> Result<Self> {
        if id.trim().is_empty() {
            anyhow::bail!("Vulnerability id cannot be empty");
        }
        Ok(Self {
            id,
            aliases: Vec::new(),
            summary: String::new(),
            severity,
            cvss_score: None,
            cvss_vector: None,
            cwe_ids: Vec::new(),
            fixed_in: None,
            url: None,
            vex_status: None,
        })
    }

    /// Numeric part of each CWE identifier ("CWE-79" -> 79); malformed ids are skipped
    pub fn cwe_numbers(&self) -> Vec<u32> {
        self.cwe_ids
            .iter()
            .filter_map(|cwe| {
                cwe.trim()
                    .trim_start_matches("CWE-")
                    .trim_start_matches("cwe-")
                    .parse()
                    .ok()
            })
            .collect()
    }
}
