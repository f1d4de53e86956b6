use crate::sbom_generation::domain::SbomAggregate;
use crate::shared::Result;

/// SbomFormatter port for serializing an aggregate
///
/// This port abstracts the formatting logic for the three document formats
/// (Markdown, SPDX 2.3, CycloneDX 1.5). Formatters only read the aggregate.
pub trait SbomFormatter {
    /// Formats the aggregate
    ///
    /// # Errors
    /// Returns an error only if top-level serialization fails; individual
    /// unrepresentable values are replaced with placeholders instead
    fn format(&self, aggregate: &SbomAggregate) -> Result<String>;
}
