pub mod aggregate;
pub mod audit;
pub mod compliance;
pub mod dependency_record;
pub mod insights;
pub mod known_unknown;
pub mod manifest;
pub mod package;
pub mod registry_metadata;
pub mod risk;
pub mod sbom_metadata;
pub mod version;
pub mod vulnerability;

pub use aggregate::{
    AuditSummary, Coverage, CoverageDepth, OutdatedInfo, PackageAnalysis, ProjectInfo,
    SbomAggregate, SbomDocuments,
};
pub use audit::{AuditFeed, AuditFinding};
pub use compliance::{ComplianceControl, ComplianceReport, ComplianceVerdict, ControlStatus};
pub use dependency_record::{
    npm_purl, BundleSize, DependencyOutcome, DependencyRecord, Hashes, SecurityScore, Supplier,
};
pub use insights::Insights;
pub use known_unknown::{KnownUnknown, KnownUnknownCategory};
pub use manifest::{PackageManifest, ProjectManifest, Workspaces};
pub use package::{DependencyDeclaration, PackageName};
pub use registry_metadata::{
    BundleSizeBytes, DistInfo, ProviderOutputs, RegistryMetadata, VersionMetadata,
};
pub use risk::{RiskAssessment, RiskLevel};
pub use sbom_metadata::SbomMetadata;
pub use vulnerability::{CvssScore, Severity, VexStatus, VulnerabilityRecord};
