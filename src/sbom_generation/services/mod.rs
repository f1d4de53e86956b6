mod compliance_evaluator;
mod feed_merger;
mod insights_aggregator;
mod integrity_hasher;
mod normalizer;
mod risk_scorer;
mod sbom_generator;

pub use compliance_evaluator::{ComplianceEvaluator, COMPLIANCE_STANDARD};
pub use feed_merger::FeedMerger;
pub use insights_aggregator::{derive_outdated, InsightsAggregator, ABANDONED_AFTER_DAYS};
pub use integrity_hasher::IntegrityHasher;
pub use normalizer::{maintenance_score, popularity_score, NormalizeOptions, Normalizer};
pub use risk_scorer::RiskScorer;
pub use sbom_generator::{SbomGenerator, TOOL_NAME};
