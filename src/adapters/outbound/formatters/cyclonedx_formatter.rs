use super::document_helpers::{
    decode_digests, is_license_expression, unique_records, IdAllocator,
};
use crate::ports::outbound::SbomFormatter;
use crate::sbom_generation::domain::{
    npm_purl, DependencyRecord, PackageAnalysis, SbomAggregate, Severity, VexStatus,
    VulnerabilityRecord,
};
use crate::shared::Result;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

const PROPERTY_PREFIX: &str = "npm-sbom";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Bom {
    bom_format: &'static str,
    spec_version: &'static str,
    serial_number: String,
    version: u32,
    metadata: Metadata,
    components: Vec<Component>,
    dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: String,
    tools: Tools,
    component: Component,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<Property>,
}

#[derive(Debug, Serialize)]
struct Tools {
    components: Vec<ToolComponent>,
}

#[derive(Debug, Serialize)]
struct ToolComponent {
    #[serde(rename = "type")]
    component_type: &'static str,
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Component {
    #[serde(rename = "type")]
    component_type: &'static str,
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supplier: Option<OrganizationalEntity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hashes: Vec<Hash>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<LicenseChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_references: Vec<ExternalReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<Property>,
}

#[derive(Debug, Serialize)]
struct OrganizationalEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    url: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    contact: Vec<Contact>,
}

#[derive(Debug, Serialize)]
struct Contact {
    email: String,
}

#[derive(Debug, Serialize)]
struct Hash {
    alg: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum LicenseChoice {
    License { license: License },
    Expression { expression: String },
}

#[derive(Debug, Serialize)]
struct License {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExternalReference {
    #[serde(rename = "type")]
    reference_type: &'static str,
    url: String,
}

#[derive(Debug, Serialize)]
struct Property {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dependency {
    #[serde(rename = "ref")]
    bom_ref: String,
    depends_on: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Vulnerability {
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<VulnerabilitySource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    references: Vec<VulnerabilityReference>,
    ratings: Vec<Rating>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cwes: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recommendation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<Analysis>,
    affects: Vec<Affect>,
}

#[derive(Debug, Serialize)]
struct VulnerabilitySource {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    url: String,
}

#[derive(Debug, Serialize)]
struct VulnerabilityReference {
    id: String,
    source: VulnerabilitySource,
}

#[derive(Debug, Serialize)]
struct Rating {
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
    severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<String>,
}

#[derive(Debug, Serialize)]
struct Analysis {
    state: &'static str,
}

#[derive(Debug, Serialize)]
struct Affect {
    #[serde(rename = "ref")]
    bom_ref: String,
    versions: Vec<AffectedVersion>,
}

#[derive(Debug, Serialize)]
struct AffectedVersion {
    version: String,
    status: &'static str,
}

/// CycloneDxFormatter adapter for generating CycloneDX 1.5 JSON format
///
/// This adapter implements the SbomFormatter port for CycloneDX format.
/// Components are keyed by purl, so the same name at two versions yields
/// two components while a dependency shared by monorepo members yields one.
pub struct CycloneDxFormatter {
    include_transitive: bool,
}

impl CycloneDxFormatter {
    pub fn new() -> Self {
        Self {
            include_transitive: false,
        }
    }

    /// Adds component-to-component edges from each record's own dependency list
    pub fn with_transitive_edges(mut self, include: bool) -> Self {
        self.include_transitive = include;
        self
    }
}

impl Default for CycloneDxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomFormatter for CycloneDxFormatter {
    fn format(&self, aggregate: &SbomAggregate) -> Result<String> {
        let records = unique_records(aggregate, DependencyRecord::purl);
        let root_ref = root_bom_ref(aggregate);
        let member_refs = member_bom_refs(aggregate, &root_ref, &records);

        let mut components: Vec<Component> =
            records.iter().map(|r| self.build_component(r)).collect();
        components.extend(
            aggregate
                .packages
                .iter()
                .zip(&member_refs)
                .map(|(package, bom_ref)| self.build_member_component(package, bom_ref)),
        );

        let bom = Bom {
            bom_format: "CycloneDX",
            spec_version: "1.5",
            serial_number: aggregate.metadata.serial_number().to_string(),
            version: 1,
            metadata: self.build_metadata(aggregate, &root_ref),
            components,
            dependencies: self.build_dependencies(aggregate, &root_ref, &member_refs, &records),
            vulnerabilities: self.build_vulnerabilities(aggregate),
        };

        serde_json::to_string_pretty(&bom).map_err(Into::into)
    }
}

fn root_bom_ref(aggregate: &SbomAggregate) -> String {
    let project = &aggregate.project;
    if project.name.is_empty() {
        "root-component".to_string()
    } else if project.version.is_empty() {
        format!("pkg:npm/{}", project.name.replace('@', "%40"))
    } else {
        npm_purl(&project.name, &project.version)
    }
}

/// One `workspace:<member>` bom-ref per monorepo member, in aggregate order.
/// Members sharing a display name get a numeric suffix. Empty outside a monorepo.
fn member_bom_refs(
    aggregate: &SbomAggregate,
    root_ref: &str,
    records: &[&DependencyRecord],
) -> Vec<String> {
    if !aggregate.is_monorepo {
        return Vec::new();
    }
    let mut allocator = IdAllocator::new();
    allocator.reserve(root_ref);
    for record in records {
        allocator.reserve(&record.purl());
    }
    aggregate
        .packages
        .iter()
        .map(|package| allocator.allocate(format!("workspace:{}", package.display_name())))
        .collect()
}

/// CycloneDX affected-version status for one component
fn affected_status(status: Option<VexStatus>) -> &'static str {
    match status {
        Some(VexStatus::Affected) => "affected",
        Some(VexStatus::Fixed) | Some(VexStatus::NotAffected) => "unaffected",
        Some(VexStatus::UnderInvestigation) | None => "unknown",
    }
}

fn affect(record: &DependencyRecord, vuln: &VulnerabilityRecord) -> Affect {
    Affect {
        bom_ref: record.purl(),
        versions: vec![AffectedVersion {
            version: record.current_version.clone(),
            status: affected_status(vuln.vex_status),
        }],
    }
}

/// The VEX state shared by every affected component, if they all agree
fn agreed_state(states: &[Option<VexStatus>]) -> Option<VexStatus> {
    let first = states.first().copied().flatten()?;
    states.iter().all(|s| *s == Some(first)).then_some(first)
}

fn sorted_refs<'a>(records: impl Iterator<Item = &'a DependencyRecord>) -> Vec<String> {
    records
        .map(DependencyRecord::purl)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn property(key: &str, value: impl ToString) -> Property {
    Property {
        name: format!("{}:{}", PROPERTY_PREFIX, key),
        value: value.to_string(),
    }
}

/// CycloneDX severity vocabulary
fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "critical",
        Severity::High => "high",
        Severity::Moderate => "medium",
        Severity::Low => "low",
        Severity::None => "none",
        Severity::Unknown => "unknown",
    }
}

fn hash_alg(algorithm: &str) -> &'static str {
    match algorithm {
        "SHA512" => "SHA-512",
        "SHA384" => "SHA-384",
        "SHA256" => "SHA-256",
        _ => "SHA-1",
    }
}

fn licenses(license: Option<&str>) -> Vec<LicenseChoice> {
    let Some(license) = license.map(str::trim).filter(|l| !l.is_empty()) else {
        return Vec::new();
    };
    let choice = if is_license_expression(license) {
        LicenseChoice::Expression {
            expression: license.to_string(),
        }
    } else if license
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'))
    {
        LicenseChoice::License {
            license: License {
                id: Some(license.to_string()),
                name: None,
            },
        }
    } else {
        LicenseChoice::License {
            license: License {
                id: None,
                name: Some(license.to_string()),
            },
        }
    };
    vec![choice]
}

impl CycloneDxFormatter {
    fn build_metadata(&self, aggregate: &SbomAggregate, root_ref: &str) -> Metadata {
        let project = &aggregate.project;
        let mut properties = vec![property("coverage-depth", aggregate.coverage.depth.as_str())];
        if let Some(hash) = &aggregate.integrity_hash {
            properties.push(property("integrity-hash", hash));
        }
        if let Some(compliance) = &aggregate.compliance {
            properties.push(property("compliance-verdict", compliance.overall));
        }
        properties.push(property("known-unknowns", aggregate.known_unknowns.len()));

        Metadata {
            timestamp: aggregate.metadata.timestamp(),
            tools: Tools {
                components: vec![ToolComponent {
                    component_type: "application",
                    name: aggregate.metadata.tool_name().to_string(),
                    version: aggregate.metadata.tool_version().to_string(),
                }],
            },
            component: Component {
                component_type: "application",
                bom_ref: root_ref.to_string(),
                name: if project.name.is_empty() {
                    "project".to_string()
                } else {
                    project.name.clone()
                },
                version: Some(project.version.clone()).filter(|v| !v.is_empty()),
                description: None,
                scope: None,
                supplier: None,
                hashes: Vec::new(),
                licenses: licenses(project.license.as_deref()),
                purl: None,
                external_references: Vec::new(),
                properties: Vec::new(),
            },
            properties,
        }
    }

    fn build_member_component(&self, package: &PackageAnalysis, bom_ref: &str) -> Component {
        Component {
            component_type: "application",
            bom_ref: bom_ref.to_string(),
            name: package.display_name(),
            version: package.version.clone(),
            description: None,
            scope: None,
            supplier: None,
            hashes: Vec::new(),
            licenses: Vec::new(),
            purl: None,
            external_references: Vec::new(),
            properties: package
                .path
                .iter()
                .map(|path| property("workspace-path", path))
                .collect(),
        }
    }

    fn build_component(&self, record: &DependencyRecord) -> Component {
        let supplier = record.supplier.as_ref().map(|s| OrganizationalEntity {
            name: s.name.clone(),
            url: s.url.iter().cloned().collect(),
            contact: s
                .email
                .iter()
                .map(|email| Contact {
                    email: email.clone(),
                })
                .collect(),
        });

        let mut external_references = Vec::new();
        if let Some(homepage) = &record.homepage {
            external_references.push(ExternalReference {
                reference_type: "website",
                url: homepage.clone(),
            });
        }
        if let Some(tarball) = &record.download_url {
            external_references.push(ExternalReference {
                reference_type: "distribution",
                url: tarball.clone(),
            });
        }

        let mut properties = vec![
            property("risk-score", record.risk.score),
            property("risk-level", record.risk.risk_level),
        ];
        if let Some(score) = Option::<u8>::from(record.security_score) {
            properties.push(property("security-score", score));
        }
        if let Some(message) = &record.deprecated {
            properties.push(property("deprecated", message));
        }

        Component {
            component_type: "library",
            bom_ref: record.purl(),
            name: record.name.clone(),
            version: Some(record.current_version.clone()),
            description: Some(record.description.clone()).filter(|d| !d.is_empty()),
            scope: Some(if record.is_dev { "optional" } else { "required" }),
            supplier,
            hashes: decode_digests(record)
                .into_iter()
                .map(|d| Hash {
                    alg: hash_alg(d.algorithm),
                    content: d.hex,
                })
                .collect(),
            licenses: licenses(record.license.as_deref()),
            purl: Some(record.purl()),
            external_references,
            properties,
        }
    }

    /// Root depends on every direct dependency (or on each member, which in
    /// turn depends on its own). Transitive edges only point at components
    /// present in the BOM.
    fn build_dependencies(
        &self,
        aggregate: &SbomAggregate,
        root_ref: &str,
        member_refs: &[String],
        records: &[&DependencyRecord],
    ) -> Vec<Dependency> {
        let mut dependencies = Vec::new();
        if aggregate.is_monorepo {
            dependencies.push(Dependency {
                bom_ref: root_ref.to_string(),
                depends_on: member_refs.to_vec(),
            });
            for (package, member_ref) in aggregate.packages.iter().zip(member_refs) {
                dependencies.push(Dependency {
                    bom_ref: member_ref.clone(),
                    depends_on: sorted_refs(package.records()),
                });
            }
        } else {
            dependencies.push(Dependency {
                bom_ref: root_ref.to_string(),
                depends_on: sorted_refs(aggregate.all_records()),
            });
        }

        let by_name: HashMap<&str, String> = records
            .iter()
            .map(|r| (r.name.as_str(), r.purl()))
            .collect();

        for record in records {
            let depends_on: Vec<String> = if self.include_transitive {
                record
                    .transitive_dependencies
                    .iter()
                    .flatten()
                    .filter_map(|name| by_name.get(name.as_str()).cloned())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect()
            } else {
                Vec::new()
            };
            dependencies.push(Dependency {
                bom_ref: record.purl(),
                depends_on,
            });
        }

        dependencies
    }

    /// One entry per vulnerability id; every component it affects is listed
    /// under `affects` with its own status. `analysis` is only set when all
    /// affected components share one VEX state.
    fn build_vulnerabilities(&self, aggregate: &SbomAggregate) -> Vec<Vulnerability> {
        let mut vulnerabilities: Vec<Vulnerability> = Vec::new();
        let mut states: Vec<Vec<Option<VexStatus>>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for record in aggregate.all_records() {
            for vuln in &record.vulnerabilities {
                let affect = affect(record, vuln);
                match index.get(&vuln.id) {
                    Some(&position) => {
                        let existing = &mut vulnerabilities[position];
                        if !existing.affects.iter().any(|a| a.bom_ref == affect.bom_ref) {
                            existing.affects.push(affect);
                            states[position].push(vuln.vex_status);
                        }
                    }
                    None => {
                        index.insert(vuln.id.clone(), vulnerabilities.len());
                        states.push(vec![vuln.vex_status]);
                        vulnerabilities.push(self.build_vulnerability(vuln, affect));
                    }
                }
            }
        }

        for (vulnerability, states) in vulnerabilities.iter_mut().zip(&states) {
            vulnerability.analysis = agreed_state(states).map(|s| Analysis { state: s.as_str() });
        }
        vulnerabilities
    }

    fn build_vulnerability(&self, vuln: &VulnerabilityRecord, affect: Affect) -> Vulnerability {
        let method = vuln.cvss_vector.as_deref().and_then(|vector| {
            if vector.starts_with("CVSS:3.1") {
                Some("CVSSv31")
            } else if vector.starts_with("CVSS:3") {
                Some("CVSSv3")
            } else {
                None
            }
        });

        let source = vuln.url.as_ref().map(|url| VulnerabilitySource {
            name: Some(
                if vuln.id.starts_with("GHSA-") {
                    "GitHub Advisories"
                } else if vuln.id.starts_with("CVE-") {
                    "NVD"
                } else {
                    "OSV"
                }
                .to_string(),
            ),
            url: url.clone(),
        });

        Vulnerability {
            bom_ref: format!("vuln-{}", vuln.id),
            id: vuln.id.clone(),
            source,
            references: vuln
                .aliases
                .iter()
                .map(|alias| VulnerabilityReference {
                    id: alias.clone(),
                    source: VulnerabilitySource {
                        name: None,
                        url: format!("https://osv.dev/vulnerability/{}", alias),
                    },
                })
                .collect(),
            ratings: vec![Rating {
                score: vuln.cvss_score.map(|s| s.value()),
                severity: severity_label(vuln.severity),
                method,
                vector: vuln.cvss_vector.clone(),
            }],
            cwes: vuln.cwe_numbers(),
            description: Some(vuln.summary.clone()).filter(|s| !s.is_empty()),
            recommendation: vuln
                .fixed_in
                .as_ref()
                .map(|fixed| format!("Upgrade to version {} or later", fixed)),
            analysis: None,
            affects: vec![affect],
        }
    }
}
