/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod analysis_options;
mod output_format;
mod sbom_request;
mod sbom_response;

pub use analysis_options::AnalysisOptions;
pub use output_format::OutputFormat;
pub use sbom_request::SbomRequest;
pub use sbom_response::SbomResponse;
