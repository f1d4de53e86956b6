use crate::adapters::outbound::formatters::{CycloneDxFormatter, MarkdownFormatter, SpdxFormatter};
use crate::application::dto::{AnalysisOptions, OutputFormat};
use crate::ports::outbound::SbomFormatter;

/// Factory for creating SBOM formatters
///
/// This factory encapsulates the creation logic for the formatter
/// implementations. It belongs in the application layer as it selects
/// infrastructure adapters based on application needs.
pub struct FormatterFactory;

impl FormatterFactory {
    /// Creates a formatter for one concrete document format
    ///
    /// # Returns
    /// `None` for `OutputFormat::All`, which is not a single document
    ///
    /// # Examples
    /// ```
    /// use npm_sbom::application::dto::{AnalysisOptions, OutputFormat};
    /// use npm_sbom::application::factories::FormatterFactory;
    ///
    /// let formatter = FormatterFactory::create(OutputFormat::Spdx, &AnalysisOptions::default());
    /// assert!(formatter.is_some());
    /// ```
    pub fn create(format: OutputFormat, options: &AnalysisOptions) -> Option<Box<dyn SbomFormatter>> {
        match format {
            OutputFormat::Markdown => Some(Box::new(MarkdownFormatter::new())),
            OutputFormat::Spdx => Some(Box::new(SpdxFormatter::new())),
            OutputFormat::CycloneDx => Some(Box::new(
                CycloneDxFormatter::new().with_transitive_edges(options.include_transitive_deps),
            )),
            OutputFormat::All => None,
        }
    }

    /// Returns the progress message for the specified output format
    ///
    /// # Examples
    /// ```
    /// use npm_sbom::application::dto::OutputFormat;
    /// use npm_sbom::application::factories::FormatterFactory;
    ///
    /// let message = FormatterFactory::progress_message(OutputFormat::CycloneDx);
    /// assert_eq!(message, "📝 Generating CycloneDX 1.5 JSON output...");
    /// ```
    pub fn progress_message(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Markdown => "📝 Generating Markdown report...",
            OutputFormat::Spdx => "📝 Generating SPDX 2.3 JSON output...",
            OutputFormat::CycloneDx => "📝 Generating CycloneDX 1.5 JSON output...",
            OutputFormat::All => "📝 Generating all output formats...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sbom_generation::domain::aggregate::test_support::empty_aggregate;

    #[test]
    fn test_create_each_document_format() {
        let aggregate = empty_aggregate();
        let options = AnalysisOptions::default();

        let markdown = FormatterFactory::create(OutputFormat::Markdown, &options).unwrap();
        assert!(markdown.format(&aggregate).unwrap().starts_with("# Software Bill of Materials"));

        let spdx = FormatterFactory::create(OutputFormat::Spdx, &options).unwrap();
        assert!(spdx.format(&aggregate).unwrap().contains("\"spdxVersion\": \"SPDX-2.3\""));

        let cyclonedx = FormatterFactory::create(OutputFormat::CycloneDx, &options).unwrap();
        assert!(cyclonedx.format(&aggregate).unwrap().contains("\"specVersion\": \"1.5\""));
    }

    #[test]
    fn test_create_all_is_not_a_single_formatter() {
        assert!(FormatterFactory::create(OutputFormat::All, &AnalysisOptions::default()).is_none());
    }

    #[test]
    fn test_progress_message() {
        assert_eq!(
            FormatterFactory::progress_message(OutputFormat::Markdown),
            "📝 Generating Markdown report..."
        );
        assert_eq!(
            FormatterFactory::progress_message(OutputFormat::Spdx),
            "📝 Generating SPDX 2.3 JSON output..."
        );
    }
}
