use super::insights_aggregator::derive_outdated;
use super::normalizer::with_vex_status;
use super::{RiskScorer, SbomGenerator};
use crate::sbom_generation::domain::{AuditFeed, OutdatedInfo, SbomAggregate};
use crate::shared::Result;
use std::collections::BTreeMap;

/// FeedMerger folds late-arriving outdated and audit data into a finished
/// aggregate without re-running the fetch phase
pub struct FeedMerger;

impl FeedMerger {
    /// Merges an outdated feed over the registry-derived map (feed entries win)
    pub fn apply_outdated(
        aggregate: &mut SbomAggregate,
        feed: BTreeMap<String, OutdatedInfo>,
    ) -> Result<()> {
        let mut merged = aggregate
            .outdated
            .take()
            .unwrap_or_else(|| derive_outdated(&aggregate.packages));
        merged.extend(feed);
        aggregate.outdated = Some(merged);
        SbomGenerator::finalize(aggregate)
    }

    /// Attaches audit advisories to matching records, re-scores every record
    /// and recomputes the derived passes.
    ///
    /// An advisory already known under the same id (or one of its aliases)
    /// is not added twice.
    pub fn apply_audit(aggregate: &mut SbomAggregate, feed: &AuditFeed) -> Result<()> {
        for record in aggregate.all_records_mut() {
            for advisory in feed.findings_for(&record.name) {
                let duplicate = record.vulnerabilities.iter().any(|known| {
                    known.id == advisory.id
                        || known.aliases.contains(&advisory.id)
                        || advisory.aliases.contains(&known.id)
                });
                if !duplicate {
                    record
                        .vulnerabilities
                        .push(with_vex_status(advisory.clone(), &record.current_version));
                }
            }
            record.risk = RiskScorer::score(record);
        }

        aggregate.audit = Some(feed.summary.clone());
        SbomGenerator::finalize(aggregate)
    }
}
