use super::document_helpers::{decode_digests, unique_records, IdAllocator};
use crate::ports::outbound::SbomFormatter;
use crate::sbom_generation::domain::{DependencyRecord, PackageAnalysis, SbomAggregate, Supplier};
use crate::shared::Result;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

const NOASSERTION: &str = "NOASSERTION";
const DOCUMENT_ID: &str = "SPDXRef-DOCUMENT";
const ROOT_ID: &str = "SPDXRef-RootPackage";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_version: &'static str,
    data_license: &'static str,
    #[serde(rename = "SPDXID")]
    spdx_id: &'static str,
    name: String,
    document_namespace: String,
    creation_info: CreationInfo,
    document_describes: Vec<String>,
    packages: Vec<SpdxPackage>,
    relationships: Vec<Relationship>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreationInfo {
    created: String,
    creators: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxPackage {
    #[serde(rename = "SPDXID")]
    spdx_id: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_info: Option<String>,
    download_location: String,
    files_analyzed: bool,
    license_concluded: String,
    license_declared: String,
    copyright_text: &'static str,
    supplier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    homepage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    checksums: Vec<Checksum>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_refs: Vec<ExternalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_package_purpose: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Checksum {
    algorithm: &'static str,
    checksum_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExternalRef {
    reference_category: &'static str,
    reference_type: &'static str,
    reference_locator: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Relationship {
    spdx_element_id: String,
    relationship_type: &'static str,
    related_spdx_element: String,
}

/// SpdxFormatter adapter for generating SPDX 2.3 JSON
///
/// One SPDX package per unique dependency name, a synthetic root package for
/// the project, and one workspace package per monorepo member.
pub struct SpdxFormatter;

impl SpdxFormatter {
    pub fn new() -> Self {
        Self
    }

    /// `SPDXRef-Package-<name>` with every character outside `[A-Za-z0-9.-]`
    /// replaced; a scope's leading `@` is dropped.
    ///
    /// Distinct names can share this base id; the document suffixes the later ones.
    pub fn package_spdx_id(name: &str) -> String {
        format!("SPDXRef-Package-{}", sanitize_id(name.trim_start_matches('@')))
    }

    fn workspace_spdx_id(package: &PackageAnalysis) -> String {
        format!("SPDXRef-Workspace-{}", sanitize_id(&package.display_name()))
    }
}

/// SPDX ids for one document: dependency name to package id, plus one id per
/// workspace member in aggregate order
struct SpdxIds<'a> {
    packages: HashMap<&'a str, String>,
    members: Vec<String>,
}

impl<'a> SpdxIds<'a> {
    fn assign(aggregate: &'a SbomAggregate, records: &[&'a DependencyRecord]) -> Self {
        let mut allocator = IdAllocator::new();
        allocator.reserve(DOCUMENT_ID);
        allocator.reserve(ROOT_ID);

        let packages = records
            .iter()
            .map(|&r| {
                let id = allocator.allocate(SpdxFormatter::package_spdx_id(&r.name));
                (r.name.as_str(), id)
            })
            .collect();
        let members = if aggregate.is_monorepo {
            aggregate
                .packages
                .iter()
                .map(|p| allocator.allocate(SpdxFormatter::workspace_spdx_id(p)))
                .collect()
        } else {
            Vec::new()
        };

        Self { packages, members }
    }

    fn package(&self, name: &str) -> String {
        self.packages
            .get(name)
            .cloned()
            .unwrap_or_else(|| SpdxFormatter::package_spdx_id(name))
    }
}

impl Default for SpdxFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '-' })
        .collect()
}

fn or_noassertion(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOASSERTION)
        .to_string()
}

/// SPDX supplier field: `Organization: name (email)`
fn supplier_field(supplier: Option<&Supplier>) -> String {
    let Some(name) = supplier.and_then(|s| s.name.as_deref()) else {
        return NOASSERTION.to_string();
    };
    match supplier.and_then(|s| s.email.as_deref()) {
        Some(email) => format!("Organization: {} ({})", name, email),
        None => format!("Organization: {}", name),
    }
}

impl SbomFormatter for SpdxFormatter {
    fn format(&self, aggregate: &SbomAggregate) -> Result<String> {
        let project_name = if aggregate.project.name.is_empty() {
            "project".to_string()
        } else {
            aggregate.project.name.clone()
        };

        let mut packages = vec![self.build_root_package(aggregate, &project_name)];
        let mut relationships = vec![Relationship {
            spdx_element_id: DOCUMENT_ID.to_string(),
            relationship_type: "DESCRIBES",
            related_spdx_element: ROOT_ID.to_string(),
        }];

        // One package per dependency name
        let records = unique_records(aggregate, |r| r.name.clone());
        let ids = SpdxIds::assign(aggregate, &records);
        for record in &records {
            packages.push(self.build_package(record, ids.package(&record.name)));
        }

        if aggregate.is_monorepo {
            for (package, member_id) in aggregate.packages.iter().zip(&ids.members) {
                packages.push(self.build_workspace_package(package, member_id));
                relationships.push(Relationship {
                    spdx_element_id: ROOT_ID.to_string(),
                    relationship_type: "CONTAINS",
                    related_spdx_element: member_id.clone(),
                });
                relationships.extend(Self::depends_on(member_id, package.records(), &ids));
            }
        } else {
            relationships.extend(Self::depends_on(ROOT_ID, aggregate.all_records(), &ids));
        }

        let document = SpdxDocument {
            spdx_version: "SPDX-2.3",
            data_license: "CC0-1.0",
            spdx_id: DOCUMENT_ID,
            document_namespace: format!(
                "https://spdx.org/spdxdocs/{}-{}",
                sanitize_id(&project_name),
                aggregate.metadata.uuid()
            ),
            name: format!("{}-sbom", project_name),
            creation_info: CreationInfo {
                created: aggregate.metadata.timestamp(),
                creators: vec![format!(
                    "Tool: {}-{}",
                    aggregate.metadata.tool_name(),
                    aggregate.metadata.tool_version()
                )],
            },
            document_describes: vec![ROOT_ID.to_string()],
            packages,
            relationships,
        };

        serde_json::to_string_pretty(&document).map_err(Into::into)
    }
}

impl SpdxFormatter {
    /// One DEPENDS_ON edge per distinct target, even when a member declares
    /// the same dependency as both production and development
    fn depends_on<'a>(
        from: &str,
        records: impl Iterator<Item = &'a DependencyRecord>,
        ids: &SpdxIds,
    ) -> Vec<Relationship> {
        let targets: BTreeSet<String> = records.map(|r| ids.package(&r.name)).collect();
        targets
            .into_iter()
            .map(|target| Relationship {
                spdx_element_id: from.to_string(),
                relationship_type: "DEPENDS_ON",
                related_spdx_element: target,
            })
            .collect()
    }

    fn build_root_package(&self, aggregate: &SbomAggregate, project_name: &str) -> SpdxPackage {
        let project = &aggregate.project;
        SpdxPackage {
            spdx_id: ROOT_ID.to_string(),
            name: project_name.to_string(),
            version_info: Some(project.version.clone()).filter(|v| !v.is_empty()),
            download_location: NOASSERTION.to_string(),
            files_analyzed: false,
            license_concluded: NOASSERTION.to_string(),
            license_declared: or_noassertion(project.license.as_deref()),
            copyright_text: NOASSERTION,
            supplier: NOASSERTION.to_string(),
            homepage: None,
            description: None,
            comment: Some(format!(
                "Analyzed project; coverage depth {}",
                aggregate.coverage.depth.as_str()
            )),
            checksums: Vec::new(),
            external_refs: Vec::new(),
            primary_package_purpose: Some("APPLICATION"),
        }
    }

    fn build_workspace_package(&self, package: &PackageAnalysis, spdx_id: &str) -> SpdxPackage {
        SpdxPackage {
            spdx_id: spdx_id.to_string(),
            name: package.display_name(),
            version_info: package.version.clone(),
            download_location: NOASSERTION.to_string(),
            files_analyzed: false,
            license_concluded: NOASSERTION.to_string(),
            license_declared: NOASSERTION.to_string(),
            copyright_text: NOASSERTION,
            supplier: NOASSERTION.to_string(),
            homepage: None,
            description: None,
            comment: package.path.as_ref().map(|p| format!("Workspace member at {}", p)),
            checksums: Vec::new(),
            external_refs: Vec::new(),
            primary_package_purpose: Some("APPLICATION"),
        }
    }

    fn build_package(&self, record: &DependencyRecord, spdx_id: String) -> SpdxPackage {
        let checksums = decode_digests(record)
            .into_iter()
            .map(|digest| Checksum {
                algorithm: digest.algorithm,
                checksum_value: digest.hex,
            })
            .collect();

        SpdxPackage {
            spdx_id,
            name: record.name.clone(),
            version_info: Some(record.current_version.clone()),
            download_location: or_noassertion(record.download_url.as_deref()),
            files_analyzed: false,
            license_concluded: NOASSERTION.to_string(),
            license_declared: or_noassertion(record.license.as_deref()),
            copyright_text: NOASSERTION,
            supplier: supplier_field(record.supplier.as_ref()),
            homepage: record.homepage.clone(),
            description: Some(record.description.clone()).filter(|d| !d.is_empty()),
            comment: Some(format!(
                "Risk score {} ({})",
                record.risk.score, record.risk.risk_level
            )),
            checksums,
            external_refs: vec![ExternalRef {
                reference_category: "PACKAGE-MANAGER",
                reference_type: "purl",
                reference_locator: record.purl(),
            }],
            primary_package_purpose: Some("LIBRARY"),
        }
    }
}
