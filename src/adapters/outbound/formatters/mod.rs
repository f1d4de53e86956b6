/// Formatter adapters for different SBOM output formats
mod cyclonedx_formatter;
mod document_helpers;
mod markdown_formatter;
mod spdx_formatter;

pub use cyclonedx_formatter::CycloneDxFormatter;
pub use markdown_formatter::MarkdownFormatter;
pub use spdx_formatter::SpdxFormatter;
