use super::{ComplianceEvaluator, InsightsAggregator, IntegrityHasher};
use crate::sbom_generation::domain::{SbomAggregate, SbomMetadata};
use crate::shared::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const TOOL_NAME: &str = "npm-sbom";

/// SbomGenerator service for bundle identity and the post-barrier passes
///
/// This service contains pure business logic: it stamps metadata and derives
/// insights, compliance and the integrity hash from an assembled aggregate.
pub struct SbomGenerator;

impl SbomGenerator {
    /// Generates SBOM metadata with the current timestamp and a fresh serial number
    pub fn generate_metadata(tool_name: &str, tool_version: &str) -> SbomMetadata {
        Self::generate_metadata_at(tool_name, tool_version, Utc::now())
    }

    pub fn generate_metadata_at(
        tool_name: &str,
        tool_version: &str,
        generated_at: DateTime<Utc>,
    ) -> SbomMetadata {
        SbomMetadata::new(
            generated_at,
            tool_name.to_string(),
            tool_version.to_string(),
            format!("urn:uuid:{}", Uuid::new_v4()),
        )
    }

    /// Metadata for this tool, using the compile-time crate version
    pub fn generate_default_metadata() -> SbomMetadata {
        Self::generate_metadata(TOOL_NAME, env!("CARGO_PKG_VERSION"))
    }

    /// Recomputes everything derived from the records, in dependency order:
    /// record order, insights, then compliance (which reads insights), then
    /// the hash.
    ///
    /// Records are stably sorted by ascending risk score, so a re-scored
    /// record moves to its new place. Serialized documents are cleared
    /// because they no longer match.
    pub fn finalize(aggregate: &mut SbomAggregate) -> Result<()> {
        for package in &mut aggregate.packages {
            package.dependencies.sort_by_key(|r| r.risk.score);
            package.dev_dependencies.sort_by_key(|r| r.risk.score);
        }
        aggregate.recount();
        aggregate.insights =
            InsightsAggregator::aggregate(&aggregate.packages, aggregate.outdated.as_ref());
        aggregate.compliance = Some(ComplianceEvaluator::evaluate(aggregate));
        aggregate.integrity_hash = Some(IntegrityHasher::hash(aggregate)?);
        aggregate.documents = None;
        Ok(())
    }
}
