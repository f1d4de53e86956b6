use super::compliance::ComplianceReport;
use super::dependency_record::DependencyRecord;
use super::insights::Insights;
use super::known_unknown::KnownUnknown;
use super::sbom_metadata::SbomMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared analysis scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageDepth {
    TopLevel,
    Transitive,
    Full,
}

impl CoverageDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageDepth::TopLevel => "top-level",
            CoverageDepth::Transitive => "transitive",
            CoverageDepth::Full => "full",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub depth: CoverageDepth,
    pub tool_name: String,
    pub tool_version: String,
    pub timestamp: DateTime<Utc>,
}

/// One row of the outdated map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutdatedInfo {
    pub current: String,
    pub wanted: String,
    pub latest: String,
}

/// Severity tallies from an audit feed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSummary {
    pub info: usize,
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub critical: usize,
    pub total: usize,
}

/// Identity of the analyzed project, used for the synthetic root component
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub version: String,
    pub license: Option<String>,
}

/// Records for one manifest (the single project, or one monorepo member)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageAnalysis {
    pub name: Option<String>,
    pub version: Option<String>,
    pub path: Option<String>,
    pub dependencies: Vec<DependencyRecord>,
    pub dev_dependencies: Vec<DependencyRecord>,
}

impl PackageAnalysis {
    pub fn records(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.dependencies.iter().chain(self.dev_dependencies.iter())
    }

    /// Label used for per-package headings and member nodes
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.path.clone())
            .unwrap_or_else(|| "root".to_string())
    }
}

/// The serialized forms of one aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomDocuments {
    pub markdown: String,
    pub spdx: String,
    pub cyclonedx: String,
}

/// Everything one analysis run produced. Emitters, the compliance evaluator
/// and the integrity hasher only ever read from it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SbomAggregate {
    pub metadata: SbomMetadata,
    pub project: ProjectInfo,
    pub is_monorepo: bool,
    pub packages: Vec<PackageAnalysis>,
    pub total_dependencies: usize,
    pub insights: Insights,
    pub outdated: Option<BTreeMap<String, OutdatedInfo>>,
    pub audit: Option<AuditSummary>,
    pub coverage: Coverage,
    pub known_unknowns: Vec<KnownUnknown>,
    pub compliance: Option<ComplianceReport>,
    pub integrity_hash: Option<String>,
    #[serde(skip)]
    pub documents: Option<SbomDocuments>,
}

impl SbomAggregate {
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.metadata.generated_at()
    }

    /// Every record, package by package, production before development
    pub fn all_records(&self) -> impl Iterator<Item = &DependencyRecord> {
        self.packages.iter().flat_map(|p| p.records())
    }

    pub fn all_records_mut(&mut self) -> impl Iterator<Item = &mut DependencyRecord> {
        self.packages
            .iter_mut()
            .flat_map(|p| p.dependencies.iter_mut().chain(p.dev_dependencies.iter_mut()))
    }

    /// Records plus known unknowns: everything that was declared
    pub fn declared_count(&self) -> usize {
        self.total_dependencies + self.known_unknowns.len()
    }

    /// Recount records after packages changed
    pub fn recount(&mut self) {
        self.total_dependencies = self.packages.iter().map(|p| p.records().count()).sum();
    }
}
