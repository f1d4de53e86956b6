//! Parsers for the JSON the npm CLI prints with `outdated --json` and
//! `audit --json`.

use crate::sbom_generation::domain::{
    AuditFeed, AuditFinding, AuditSummary, CvssScore, OutdatedInfo, Severity, VulnerabilityRecord,
};
use crate::shared::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct RawOutdated {
    #[serde(default)]
    current: Option<String>,
    #[serde(default)]
    wanted: Option<String>,
    #[serde(default)]
    latest: Option<String>,
}

/// Parses `npm outdated --json`. Workspaces make npm print an array per
/// package; the first entry is taken.
pub fn parse_outdated(content: &str) -> Result<BTreeMap<String, OutdatedInfo>> {
    let raw: BTreeMap<String, Value> = serde_json::from_str(content)?;

    let mut outdated = BTreeMap::new();
    for (name, value) in raw {
        let value = match value {
            Value::Array(mut entries) if !entries.is_empty() => entries.swap_remove(0),
            other => other,
        };
        let Ok(entry) = serde_json::from_value::<RawOutdated>(value) else {
            continue;
        };
        let latest = entry.latest.unwrap_or_default();
        outdated.insert(
            name,
            OutdatedInfo {
                current: entry.current.unwrap_or_default(),
                wanted: entry.wanted.unwrap_or_else(|| latest.clone()),
                latest,
            },
        );
    }
    Ok(outdated)
}

#[derive(Debug, Deserialize)]
struct RawAuditReport {
    #[serde(rename = "auditReportVersion", default)]
    version: Option<u32>,
    #[serde(default)]
    vulnerabilities: BTreeMap<String, RawAuditEntry>,
    #[serde(default)]
    metadata: Option<RawAuditMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawAuditMetadata {
    #[serde(default)]
    vulnerabilities: AuditSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAuditEntry {
    #[serde(default)]
    via: Vec<Value>,
    #[serde(default)]
    fix_available: Value,
}

/// An advisory object inside `via`. String entries only point at other
/// vulnerable packages and carry no advisory of their own.
#[derive(Debug, Deserialize)]
struct RawAdvisory {
    #[serde(default)]
    source: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    cwe: Vec<String>,
    #[serde(default)]
    cvss: Option<RawCvss>,
    #[serde(default)]
    range: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCvss {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    vector_string: Option<String>,
}

/// Parses an `npm audit --json` report (version 2)
pub fn parse_audit(content: &str) -> Result<AuditFeed> {
    let report: RawAuditReport = serde_json::from_str(content)?;
    if let Some(version) = report.version {
        if version != 2 {
            anyhow::bail!("Unsupported audit report version {}", version);
        }
    }

    let mut findings = Vec::new();
    for (package, entry) in &report.vulnerabilities {
        let fix_version = fix_version_for(package, &entry.fix_available);

        for via in &entry.via {
            let Ok(advisory) = serde_json::from_value::<RawAdvisory>(via.clone()) else {
                continue;
            };
            if advisory.name.as_deref().is_some_and(|name| name != package) {
                continue;
            }
            if let Some(vulnerability) = convert_advisory(advisory, fix_version.as_deref()) {
                findings.push(AuditFinding {
                    package: package.clone(),
                    vulnerability,
                });
            }
        }
    }

    Ok(AuditFeed {
        findings,
        summary: report.metadata.map(|m| m.vulnerabilities).unwrap_or_default(),
    })
}

/// `fixAvailable` is `true`, `false` or `{name, version, isSemVerMajor}`
fn fix_version_for(package: &str, fix_available: &Value) -> Option<String> {
    let fix = fix_available.as_object()?;
    if fix.get("name").and_then(Value::as_str) != Some(package) {
        return None;
    }
    fix.get("version").and_then(Value::as_str).map(str::to_string)
}

fn convert_advisory(advisory: RawAdvisory, fix_version: Option<&str>) -> Option<VulnerabilityRecord> {
    // GitHub advisory URLs end in the GHSA id, which is the stable identifier
    let id = advisory
        .url
        .as_deref()
        .and_then(|url| url.rsplit('/').next())
        .filter(|segment| segment.starts_with("GHSA-"))
        .map(str::to_string)
        .or_else(|| advisory.source.map(|source| format!("NPM-{}", source)))?;

    let severity = advisory
        .severity
        .as_deref()
        .map(Severity::parse)
        .unwrap_or_default();

    let mut record = VulnerabilityRecord::new(id, severity).ok()?;
    record.summary = advisory.title.unwrap_or_default();
    record.url = advisory.url;
    record.cwe_ids = advisory.cwe;
    if let Some(cvss) = advisory.cvss.filter(|c| c.score > 0.0) {
        record.cvss_score = CvssScore::new(cvss.score).ok();
        record.cvss_vector = cvss.vector_string;
    }
    record.fixed_in = advisory
        .range
        .as_deref()
        .and_then(upper_bound_of_range)
        .or_else(|| fix_version.map(str::to_string));
    Some(record)
}

/// `"<4.17.21"` and `">=1.0.0 <1.2.6"` have an exclusive upper bound that is
/// the first fixed version
fn upper_bound_of_range(range: &str) -> Option<String> {
    if range.contains("||") {
        return None;
    }
    range
        .split_whitespace()
        .find_map(|comparator| comparator.strip_prefix('<'))
        .filter(|bound| !bound.starts_with('='))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_outdated_object_and_array_forms() {
        let content = json!({
            "react": {"current": "18.2.0", "wanted": "18.3.1", "latest": "19.0.0", "location": "node_modules/react"},
            "typescript": [{"current": "5.3.3", "wanted": "5.3.3", "latest": "5.6.2", "dependent": "web"}],
            "uninstalled": {"wanted": "1.0.0", "latest": "1.1.0"},
            "garbage": 7
        })
        .to_string();

        let outdated = parse_outdated(&content).unwrap();

        assert_eq!(outdated.len(), 3);
        assert_eq!(outdated["react"].wanted, "18.3.1");
        assert_eq!(outdated["typescript"].latest, "5.6.2");
        assert_eq!(outdated["uninstalled"].current, "");
    }

    #[test]
    fn test_parse_outdated_rejects_non_object() {
        assert!(parse_outdated("[1, 2]").is_err());
    }

    fn audit_report() -> String {
        json!({
            "auditReportVersion": 2,
            "vulnerabilities": {
                "lodash": {
                    "name": "lodash",
                    "severity": "critical",
                    "isDirect": true,
                    "via": [{
                        "source": 1096305,
                        "name": "lodash",
                        "dependency": "lodash",
                        "title": "Prototype Pollution in lodash",
                        "url": "https://github.com/advisories/GHSA-jf85-cpcp-j695",
                        "severity": "critical",
                        "cwe": ["CWE-20", "CWE-1321"],
                        "cvss": {"score": 9.1, "vectorString": "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:N"},
                        "range": "<4.17.12"
                    }],
                    "fixAvailable": {"name": "lodash", "version": "4.17.21", "isSemVerMajor": false}
                },
                "webpack-dev-server": {
                    "name": "webpack-dev-server",
                    "severity": "moderate",
                    "via": ["sockjs"],
                    "fixAvailable": true
                },
                "sockjs": {
                    "name": "sockjs",
                    "severity": "moderate",
                    "via": [{
                        "source": 1094000,
                        "name": "sockjs",
                        "title": "Improper Input Validation in SocksJS-Node",
                        "url": "https://example.com/advisory",
                        "severity": "moderate",
                        "cwe": [],
                        "cvss": {"score": 0, "vectorString": null},
                        "range": "<0.3.20 || >=1.0.0 <1.0.1"
                    }],
                    "fixAvailable": {"name": "webpack-dev-server", "version": "4.7.3"}
                }
            },
            "metadata": {
                "vulnerabilities": {"info": 0, "low": 0, "moderate": 2, "high": 0, "critical": 1, "total": 3}
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_audit_maps_direct_advisories() {
        let feed = parse_audit(&audit_report()).unwrap();

        assert_eq!(feed.findings.len(), 2);
        assert_eq!(feed.summary.critical, 1);
        assert_eq!(feed.summary.total, 3);

        let lodash: Vec<_> = feed.findings_for("lodash").collect();
        assert_eq!(lodash.len(), 1);
        assert_eq!(lodash[0].id, "GHSA-jf85-cpcp-j695");
        assert_eq!(lodash[0].severity, Severity::Critical);
        assert_eq!(lodash[0].fixed_in.as_deref(), Some("4.17.12"));
        assert_eq!(lodash[0].cwe_numbers(), vec![20, 1321]);
        assert!(lodash[0].cvss_score.is_some());

        let sockjs: Vec<_> = feed.findings_for("sockjs").collect();
        assert_eq!(sockjs[0].id, "NPM-1094000");
        assert!(sockjs[0].cvss_score.is_none());
        // Disjoint range and a fix living in another package: no fix version
        assert!(sockjs[0].fixed_in.is_none());

        assert_eq!(feed.findings_for("webpack-dev-server").count(), 0);
    }

    #[test]
    fn test_parse_audit_rejects_v1_reports() {
        let content = json!({"auditReportVersion": 1, "advisories": {}}).to_string();
        assert!(parse_audit(&content).is_err());
    }

    #[test]
    fn test_upper_bound_of_range() {
        assert_eq!(upper_bound_of_range("<4.17.21").as_deref(), Some("4.17.21"));
        assert_eq!(upper_bound_of_range(">=1.0.0 <1.2.6").as_deref(), Some("1.2.6"));
        assert_eq!(upper_bound_of_range("<=2.0.0"), None);
        assert_eq!(upper_bound_of_range("*"), None);
    }
}
