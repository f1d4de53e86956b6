/// Mock implementations for testing
mod mock_bundle_size_provider;
mod mock_feed_reader;
mod mock_manifest_reader;
mod mock_popularity_provider;
mod mock_registry_client;
mod mock_security_score_provider;
mod mock_vulnerability_repository;

pub use mock_bundle_size_provider::MockBundleSizeProvider;
pub use mock_feed_reader::MockFeedReader;
pub use mock_manifest_reader::MockManifestReader;
pub use mock_popularity_provider::MockPopularityProvider;
pub use mock_registry_client::MockRegistryClient;
pub use mock_security_score_provider::MockSecurityScoreProvider;
pub use mock_vulnerability_repository::MockVulnerabilityRepository;
