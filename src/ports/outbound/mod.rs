/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (file system, network, console, etc.).
pub mod bundle_size_provider;
pub mod feed_reader;
pub mod formatter;
pub mod manifest_reader;
pub mod output_presenter;
pub mod popularity_provider;
pub mod progress;
pub mod registry_client;
pub mod security_score_provider;
pub mod vulnerability_repository;

pub use bundle_size_provider::BundleSizeProvider;
pub use feed_reader::FeedReader;
pub use formatter::SbomFormatter;
pub use manifest_reader::ManifestReader;
pub use output_presenter::OutputPresenter;
pub use popularity_provider::PopularityProvider;
pub use progress::{progress_channel, ProgressEvent, ProgressSink, ProgressStream};
pub use registry_client::RegistryClient;
pub use security_score_provider::SecurityScoreProvider;
pub use vulnerability_repository::{VulnerabilityRepository, NPM_ECOSYSTEM};
