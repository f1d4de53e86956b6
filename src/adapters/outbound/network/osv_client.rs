use super::build_http_client;
use crate::ports::outbound::{VulnerabilityRepository, NPM_ECOSYSTEM};
use crate::sbom_generation::domain::{CvssScore, Severity, VulnerabilityRecord};
use crate::shared::security::validate_package_name_for_url;
use crate::shared::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_OSV_URL: &str = "https://api.osv.dev";

/// OSV API client for fetching vulnerability data
///
/// Uses the single-package query endpoint, which already returns complete
/// records, so no follow-up detail requests are needed.
///
/// # Security
/// - Implements timeout (30 seconds)
/// - Does not retry; the orchestrator owns the retry policy
pub struct OsvClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsvClient {
    const TIMEOUT_SECONDS: u64 = 30;

    /// Creates a new OSV API client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_OSV_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(Self::TIMEOUT_SECONDS))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VulnerabilityRepository for OsvClient {
    async fn fetch_vulnerabilities(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<Vec<VulnerabilityRecord>> {
        validate_package_name_for_url(package_name)?;

        let query = OsvQuery {
            package: OsvPackage {
                name: package_name,
                ecosystem: NPM_ECOSYSTEM,
            },
            version,
        };

        let url = format!("{}/v1/query", self.base_url);
        let response = self.client.post(&url).json(&query).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("OSV API returned status code {}", response.status());
        }

        let result: OsvResult = response.json().await?;
        let records: Vec<VulnerabilityRecord> = result
            .vulns
            .into_iter()
            .filter_map(|vuln| convert_to_vulnerability(vuln).ok())
            .collect();

        debug!(
            package = package_name,
            version,
            count = records.len(),
            "OSV query settled"
        );
        Ok(records)
    }
}

// OSV API request/response structures

#[derive(Debug, Serialize)]
struct OsvQuery<'a> {
    package: OsvPackage<'a>,
    version: &'a str,
}

#[derive(Debug, Serialize)]
struct OsvPackage<'a> {
    name: &'a str,
    ecosystem: &'a str,
}

#[derive(Debug, Deserialize)]
struct OsvResult {
    #[serde(default)]
    vulns: Vec<OsvVulnerability>,
}

#[derive(Debug, Deserialize)]
struct OsvVulnerability {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Option<DatabaseSpecific>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
    #[serde(default)]
    references: Vec<OsvReference>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String, // "CVSS_V3"
    score: String, // e.g., "CVSS:3.1/AV:N/AC:L/..."
}

#[derive(Debug, Deserialize)]
struct DatabaseSpecific {
    #[serde(default)]
    severity: Option<String>, // "CRITICAL", "HIGH", "MODERATE", "LOW"
    #[serde(default)]
    cwe_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    #[serde(default)]
    fixed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvReference {
    #[serde(rename = "type", default)]
    reference_type: String,
    url: String,
}

/// Converts a single OSV vulnerability to the domain record
fn convert_to_vulnerability(osv_vuln: OsvVulnerability) -> Result<VulnerabilityRecord> {
    let cvss_vector = osv_vuln
        .severity
        .iter()
        .find(|s| s.severity_type == "CVSS_V3")
        .map(|s| s.score.clone());
    let cvss_score = cvss_vector.as_deref().and_then(parse_cvss_score);

    let database_specific = osv_vuln.database_specific;

    // Severity: CVSS base score first, then the database label, else unknown
    let severity = match (cvss_score, database_specific.as_ref()) {
        (Some(score), _) => Severity::from_cvss_score(score),
        (None, Some(db)) => db
            .severity
            .as_deref()
            .map(Severity::parse)
            .unwrap_or_default(),
        (None, None) => Severity::Unknown,
    };

    let fixed_in = osv_vuln.affected.iter().find_map(|affected| {
        affected
            .ranges
            .iter()
            .find_map(|r| r.events.iter().find_map(|e| e.fixed.clone()))
    });

    let url = osv_vuln
        .references
        .iter()
        .find(|r| r.reference_type == "ADVISORY")
        .or_else(|| osv_vuln.references.first())
        .map(|r| r.url.clone())
        .unwrap_or_else(|| format!("https://osv.dev/vulnerability/{}", osv_vuln.id));

    let mut record = VulnerabilityRecord::new(osv_vuln.id, severity)?;
    record.aliases = osv_vuln.aliases;
    record.summary = osv_vuln
        .summary
        .or(osv_vuln.details)
        .unwrap_or_default();
    record.cvss_score = cvss_score;
    record.cvss_vector = cvss_vector;
    record.cwe_ids = database_specific.map(|db| db.cwe_ids).unwrap_or_default();
    record.fixed_in = fixed_in;
    record.url = Some(url);
    Ok(record)
}

/// CVSS v3.1 "Roundup": smallest one-decimal number >= input, robust to
/// floating point noise
fn round_up(value: f64) -> f64 {
    let int_input = (value * 100_000.0).round() as i64;
    if int_input % 10_000 == 0 {
        int_input as f64 / 100_000.0
    } else {
        ((int_input / 10_000) + 1) as f64 / 10.0
    }
}

/// Computes the CVSS v3 base score from a vector string
///
/// Example: "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H" -> Some(9.8)
fn parse_cvss_score(cvss_vector: &str) -> Option<CvssScore> {
    if !cvss_vector.starts_with("CVSS:3") {
        return None;
    }

    let metrics: HashMap<&str, &str> = cvss_vector
        .split('/')
        .skip(1) // Skip "CVSS:3.1" or "CVSS:3.0"
        .filter_map(|part| part.split_once(':'))
        .collect();

    let scope_changed = match *metrics.get("S")? {
        "U" => false,
        "C" => true,
        _ => return None,
    };

    let av = match *metrics.get("AV")? {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => return None,
    };
    let ac = match *metrics.get("AC")? {
        "L" => 0.77,
        "H" => 0.44,
        _ => return None,
    };
    let pr = match (*metrics.get("PR")?, scope_changed) {
        ("N", _) => 0.85,
        ("L", false) => 0.62,
        ("L", true) => 0.68,
        ("H", false) => 0.27,
        ("H", true) => 0.5,
        _ => return None,
    };
    let ui = match *metrics.get("UI")? {
        "N" => 0.85,
        "R" => 0.62,
        _ => return None,
    };
    let cia = |key: &str| -> Option<f64> {
        match *metrics.get(key)? {
            "N" => Some(0.0),
            "L" => Some(0.22),
            "H" => Some(0.56),
            _ => None,
        }
    };
    let (c, i, a) = (cia("C")?, cia("I")?, cia("A")?);

    let iss = 1.0_f64 - ((1.0 - c) * (1.0 - i) * (1.0 - a));
    let impact = if scope_changed {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02_f64).powi(15)
    } else {
        6.42 * iss
    };
    let exploitability = 8.22 * av * ac * pr * ui;

    let base_score = if impact <= 0.0 {
        0.0
    } else if scope_changed {
        round_up(f64::min(1.08 * (impact + exploitability), 10.0))
    } else {
        round_up(f64::min(impact + exploitability, 10.0))
    };

    CvssScore::new(base_score as f32).ok()
}
