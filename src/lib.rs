//! npm-sbom - dependency analysis and SBOM generation for npm projects
//!
//! This library reads a `package.json` (and optional workspace members), fetches
//! registry, security, size, popularity and vulnerability data for every declared
//! dependency, scores each one for risk, and renders the result as a Markdown
//! report, an SPDX 2.3 document and a CycloneDX 1.5 document. It follows
//! hexagonal architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_generation`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use cases, the fetch orchestrator and DTOs
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use npm_sbom::prelude::*;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! // Create adapters
//! let providers = Providers {
//!     registry: Arc::new(CachingRegistryClient::new(NpmRegistryClient::new()?)),
//!     security: Arc::new(SecurityScoreClient::new()?),
//!     bundle_size: Arc::new(BundlephobiaClient::new()?),
//!     popularity: Arc::new(NpmDownloadsClient::new()?),
//!     vulnerabilities: Arc::new(OsvClient::new()?),
//! };
//!
//! // Create use case
//! let use_case = GenerateSbomUseCase::new(
//!     FileSystemReader::new(),
//!     FileSystemReader::new(),
//!     providers,
//!     ProgressSink::disabled(),
//! );
//!
//! // Execute
//! let request = SbomRequest::new(PathBuf::from("."), AnalysisOptions::default());
//! let response = use_case.execute(request).await?;
//!
//! if let Some(documents) = &response.aggregate.documents {
//!     println!("{}", documents.cyclonedx);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod ports;
pub mod sbom_generation;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemReader, FileSystemWriter, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{
        CycloneDxFormatter, MarkdownFormatter, SpdxFormatter,
    };
    pub use crate::adapters::outbound::network::{
        BundlephobiaClient, CachingRegistryClient, NpmDownloadsClient, NpmRegistryClient,
        OsvClient, SecurityScoreClient,
    };
    pub use crate::application::dto::{AnalysisOptions, OutputFormat, SbomRequest, SbomResponse};
    pub use crate::application::use_cases::{FetchOrchestrator, GenerateSbomUseCase, Providers};
    pub use crate::ports::outbound::{
        progress_channel, BundleSizeProvider, FeedReader, ManifestReader, OutputPresenter,
        PopularityProvider, ProgressEvent, ProgressSink, ProgressStream, RegistryClient,
        SbomFormatter, SecurityScoreProvider, VulnerabilityRepository,
    };
    pub use crate::sbom_generation::domain::{
        ComplianceVerdict, DependencyDeclaration, DependencyRecord, KnownUnknown, SbomAggregate,
        SbomMetadata,
    };
    pub use crate::sbom_generation::services::{IntegrityHasher, SbomGenerator};
    pub use crate::shared::Result;
}
