use crate::sbom_generation::domain::{ComplianceVerdict, SbomAggregate};

/// SbomResponse - Internal response DTO from the SBOM generation use case
///
/// Carries the finished aggregate, including the serialized documents.
#[derive(Debug, Clone)]
pub struct SbomResponse {
    pub aggregate: SbomAggregate,
}

impl SbomResponse {
    pub fn new(aggregate: SbomAggregate) -> Self {
        Self { aggregate }
    }

    pub fn verdict(&self) -> Option<ComplianceVerdict> {
        self.aggregate.compliance.as_ref().map(|c| c.overall)
    }

    pub fn integrity_hash(&self) -> Option<&str> {
        self.aggregate.integrity_hash.as_deref()
    }
}
