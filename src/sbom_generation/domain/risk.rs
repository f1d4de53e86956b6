use serde::{Deserialize, Serialize};

/// Scores strictly above this are `Low` risk
pub const LOW_RISK_THRESHOLD: u8 = 70;

/// Scores strictly above this (and not above `LOW_RISK_THRESHOLD`) are `Medium` risk
pub const MEDIUM_RISK_THRESHOLD: u8 = 40;

/// Discrete risk level derived from a 0-100 health score (higher score = safer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// The single place score thresholds are applied. Every consumer that
    /// re-derives a badge from a score must go through here.
    pub fn from_score(score: u8) -> Self {
        if score > LOW_RISK_THRESHOLD {
            RiskLevel::Low
        } else if score > MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted risk score, its level and the human-readable reasons behind it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub risk_level: RiskLevel,
    pub factors: Vec<String>,
}

impl RiskAssessment {
    /// Builds an assessment, clamping the score and deriving the level from it
    pub fn new(score: u8, factors: Vec<String>) -> Self {
        let score = score.min(100);
        Self {
            score,
            risk_level: RiskLevel::from_score(score),
            factors,
        }
    }
}
