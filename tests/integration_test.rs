/// Integration tests for the application layer
mod test_utilities;

use futures::StreamExt;
use npm_sbom::prelude::*;
use npm_sbom::sbom_generation::domain::{
    AuditFeed, AuditFinding, KnownUnknownCategory, RiskLevel, Severity, VulnerabilityRecord,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use test_utilities::mocks::*;

fn fast_options() -> AnalysisOptions {
    AnalysisOptions {
        retry_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

fn providers(
    registry: Arc<MockRegistryClient>,
    security: MockSecurityScoreProvider,
    vulnerabilities: Arc<MockVulnerabilityRepository>,
) -> Providers {
    Providers {
        registry,
        security: Arc::new(security),
        bundle_size: Arc::new(MockBundleSizeProvider::new().with_size("lodash", 72_000, 25_000)),
        popularity: Arc::new(MockPopularityProvider::new(5_000_000)),
        vulnerabilities,
    }
}

fn request(options: AnalysisOptions) -> SbomRequest {
    SbomRequest::new(PathBuf::from("/project"), options)
}

fn spdx(response: &SbomResponse) -> Value {
    let documents = response.aggregate.documents.as_ref().unwrap();
    serde_json::from_str(&documents.spdx).unwrap()
}

fn cyclonedx(response: &SbomResponse) -> Value {
    let documents = response.aggregate.documents.as_ref().unwrap();
    serde_json::from_str(&documents.cyclonedx).unwrap()
}

#[tokio::test]
async fn test_single_healthy_dependency_is_low_risk() {
    let manifest = r#"{"name": "app", "version": "1.0.0", "dependencies": {"lodash": "^4.17.21"}}"#;
    let registry = Arc::new(MockRegistryClient::new().with_package("lodash", "4.17.21", "MIT", 10));

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        MockFeedReader::new(),
        providers(
            registry,
            MockSecurityScoreProvider::new(95),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let response = use_case.execute(request(fast_options())).await.unwrap();
    let aggregate = &response.aggregate;

    assert_eq!(aggregate.total_dependencies, 1);
    let record = &aggregate.packages[0].dependencies[0];
    assert_eq!(record.current_version, "4.17.21");
    assert!(record.risk.score > 70, "score was {}", record.risk.score);
    assert_eq!(record.risk.risk_level, RiskLevel::Low);
    assert!(aggregate.outdated.as_ref().unwrap().is_empty());
    assert!(aggregate.insights.quick_wins.is_empty());
    assert!(aggregate.insights.top_risks.is_empty());
    assert!(aggregate.known_unknowns.is_empty());
}

#[tokio::test]
async fn test_registry_failure_becomes_known_unknown() {
    let manifest = r#"{"name": "app", "dependencies": {"ghost-package": "1.0.0"}}"#;
    let registry = Arc::new(MockRegistryClient::new());

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        MockFeedReader::new(),
        providers(
            registry.clone(),
            MockSecurityScoreProvider::new(80),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let response = use_case.execute(request(fast_options())).await.unwrap();
    let aggregate = &response.aggregate;

    assert_eq!(registry.calls(), 3);
    assert_eq!(aggregate.known_unknowns.len(), 1);
    assert_eq!(aggregate.known_unknowns[0].name, "ghost-package");
    assert_eq!(
        aggregate.known_unknowns[0].category,
        KnownUnknownCategory::FetchFailed
    );
    assert_eq!(aggregate.total_dependencies, 0);
    assert!(aggregate.packages[0].dependencies.is_empty());
}

#[tokio::test]
async fn test_critical_vulnerability_is_affected_and_top_risk() {
    let manifest = r#"{"name": "app", "dependencies": {"vulnerable-lib": "1.9.0"}}"#;
    let registry = Arc::new(MockRegistryClient::new().with_package(
        "vulnerable-lib",
        "1.9.0",
        "MIT",
        30,
    ));
    let vulnerabilities = Arc::new(MockVulnerabilityRepository::new().with_vulnerability(
        "vulnerable-lib",
        "GHSA-aaaa-bbbb-cccc",
        Severity::Critical,
        Some("2.0.0"),
    ));

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        MockFeedReader::new(),
        providers(
            registry,
            MockSecurityScoreProvider::new(90).with_score("vulnerable-lib", 40),
            vulnerabilities,
        ),
        ProgressSink::disabled(),
    );

    let response = use_case.execute(request(fast_options())).await.unwrap();
    let aggregate = &response.aggregate;

    assert!(aggregate.insights.vulnerability_summary.critical >= 1);
    assert!(aggregate
        .insights
        .top_risks
        .iter()
        .any(|r| r.name == "vulnerable-lib"));

    let bom = cyclonedx(&response);
    let vulnerability = &bom["vulnerabilities"][0];
    assert_eq!(vulnerability["id"], "GHSA-aaaa-bbbb-cccc");
    assert_eq!(vulnerability["analysis"]["state"], "affected");
}

#[tokio::test]
async fn test_monorepo_shared_dependency_emitted_once() {
    let root = r#"{"name": "monorepo", "private": true, "workspaces": ["packages/*"]}"#;
    let reader = MockManifestReader::new(root)
        .with_member(
            "packages/web",
            r#"{"name": "web", "dependencies": {"react": "18.2.0"}}"#,
        )
        .with_member(
            "packages/admin",
            r#"{"name": "admin", "dependencies": {"react": "18.2.0"}}"#,
        );
    let registry = Arc::new(MockRegistryClient::new().with_package("react", "18.2.0", "MIT", 60));

    let use_case = GenerateSbomUseCase::new(
        reader,
        MockFeedReader::new(),
        providers(
            registry,
            MockSecurityScoreProvider::new(90),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let response = use_case.execute(request(fast_options())).await.unwrap();
    assert!(response.aggregate.is_monorepo);
    assert_eq!(response.aggregate.packages.len(), 2);

    let doc = spdx(&response);
    let react_nodes = doc["packages"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["SPDXID"] == "SPDXRef-Package-react")
        .count();
    assert_eq!(react_nodes, 1);

    let edges: Vec<(String, String)> = doc["relationships"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["relationshipType"] == "DEPENDS_ON")
        .map(|r| {
            (
                r["spdxElementId"].as_str().unwrap().to_string(),
                r["relatedSpdxElement"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert!(edges.contains(&(
        "SPDXRef-Workspace-web".to_string(),
        "SPDXRef-Package-react".to_string()
    )));
    assert!(edges.contains(&(
        "SPDXRef-Workspace-admin".to_string(),
        "SPDXRef-Package-react".to_string()
    )));
    assert_eq!(
        edges
            .iter()
            .filter(|(_, target)| target == "SPDXRef-Package-react")
            .count(),
        2
    );
}

#[tokio::test]
async fn test_dev_dependencies_excluded() {
    let manifest = r#"{
        "name": "app",
        "dependencies": {"lodash": "4.17.21"},
        "devDependencies": {"jest": "29.7.0"}
    }"#;
    let registry = Arc::new(
        MockRegistryClient::new()
            .with_package("lodash", "4.17.21", "MIT", 10)
            .with_package("jest", "29.7.0", "MIT", 10),
    );

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        MockFeedReader::new(),
        providers(
            registry,
            MockSecurityScoreProvider::new(90),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let options = AnalysisOptions {
        include_dev_deps: false,
        ..fast_options()
    };
    let response = use_case.execute(request(options)).await.unwrap();
    let aggregate = &response.aggregate;

    assert!(aggregate.packages.iter().all(|p| p.dev_dependencies.is_empty()));
    assert_eq!(aggregate.insights.metrics.dev_dependencies, 0);
    assert_eq!(aggregate.insights.metrics.production_dependencies, 1);
    assert_eq!(aggregate.packages[0].dependencies[0].name, "lodash");
}

#[tokio::test]
async fn test_disabled_features_skip_providers() {
    let manifest = r#"{"name": "app", "dependencies": {"lodash": "4.17.21"}}"#;
    let registry = Arc::new(MockRegistryClient::new().with_package("lodash", "4.17.21", "MIT", 10));
    let bundle_size = Arc::new(MockBundleSizeProvider::new());
    let vulnerabilities = Arc::new(MockVulnerabilityRepository::new());

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        MockFeedReader::new(),
        Providers {
            registry,
            security: Arc::new(MockSecurityScoreProvider::unavailable()),
            bundle_size: bundle_size.clone(),
            popularity: Arc::new(MockPopularityProvider::new(100).with_downloads("lodash", 2_000_000)),
            vulnerabilities: vulnerabilities.clone(),
        },
        ProgressSink::disabled(),
    );

    let options = AnalysisOptions {
        include_bundle_size: false,
        include_vulnerabilities: false,
        ..fast_options()
    };
    let response = use_case.execute(request(options)).await.unwrap();

    assert_eq!(bundle_size.calls(), 0);
    assert_eq!(vulnerabilities.calls(), 0);
    let record = &response.aggregate.packages[0].dependencies[0];
    assert!(record.vulnerabilities.is_empty());
    assert_eq!(Option::<u8>::from(record.security_score), None);
}

#[tokio::test]
async fn test_outdated_and_audit_feeds_are_merged() {
    let manifest = r#"{"name": "app", "dependencies": {"lodash": "4.17.20"}}"#;
    let registry = Arc::new(MockRegistryClient::new().with_package("lodash", "4.17.21", "MIT", 10));

    let mut advisory =
        VulnerabilityRecord::new("GHSA-35jh-r3h4-6jhm".to_string(), Severity::High).unwrap();
    advisory.fixed_in = Some("4.17.21".to_string());
    let mut audit = AuditFeed {
        findings: vec![AuditFinding {
            package: "lodash".to_string(),
            vulnerability: advisory,
        }],
        ..Default::default()
    };
    audit.summary.high = 1;
    audit.summary.total = 1;

    let feeds = MockFeedReader::new()
        .with_outdated("lodash", "4.17.20", "4.17.21", "4.17.21")
        .with_audit(audit);

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        feeds,
        providers(
            registry,
            MockSecurityScoreProvider::new(90),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let request = request(fast_options())
        .with_outdated_feed(Some(PathBuf::from("outdated.json")))
        .with_audit_feed(Some(PathBuf::from("audit.json")));
    let response = use_case.execute(request).await.unwrap();
    let aggregate = &response.aggregate;

    let outdated = aggregate.outdated.as_ref().unwrap();
    assert_eq!(outdated["lodash"].latest, "4.17.21");
    assert_eq!(aggregate.audit.as_ref().unwrap().high, 1);

    let record = &aggregate.packages[0].dependencies[0];
    assert!(record
        .vulnerabilities
        .iter()
        .any(|v| v.id == "GHSA-35jh-r3h4-6jhm"));
    assert_eq!(aggregate.insights.vulnerability_summary.high, 1);

    let hash = response.integrity_hash().unwrap();
    assert!(IntegrityHasher::verify(aggregate, hash));
}

#[tokio::test]
async fn test_progress_stream_is_ordered_and_finite() {
    let manifest = r#"{"name": "app", "dependencies": {"lodash": "4.17.21", "react": "18.2.0"}}"#;
    let registry = Arc::new(
        MockRegistryClient::new()
            .with_package("lodash", "4.17.21", "MIT", 10)
            .with_package("react", "18.2.0", "MIT", 10),
    );
    let (sink, stream) = progress_channel();

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(manifest),
        MockFeedReader::new(),
        providers(
            registry,
            MockSecurityScoreProvider::new(90),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        sink,
    );
    use_case.execute(request(fast_options())).await.unwrap();
    drop(use_case);

    let events: Vec<ProgressEvent> = stream.collect().await;
    assert!(events.first().unwrap().message.contains("package.json"));

    let steps: Vec<usize> = events.iter().filter_map(|e| e.current).collect();
    assert_eq!(steps, vec![1, 2]);
    assert!(events
        .iter()
        .filter(|e| e.current.is_some())
        .all(|e| e.total == Some(2)));
}

#[tokio::test]
async fn test_missing_manifest_fails_before_fetching() {
    let registry = Arc::new(MockRegistryClient::new());

    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::missing(),
        MockFeedReader::new(),
        providers(
            registry.clone(),
            MockSecurityScoreProvider::new(90),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let result = use_case.execute(request(fast_options())).await;
    assert!(result.is_err());
    assert_eq!(registry.calls(), 0);
}

#[tokio::test]
async fn test_invalid_options_are_rejected() {
    let use_case = GenerateSbomUseCase::new(
        MockManifestReader::new(r#"{"name": "app"}"#),
        MockFeedReader::new(),
        providers(
            Arc::new(MockRegistryClient::new()),
            MockSecurityScoreProvider::new(90),
            Arc::new(MockVulnerabilityRepository::new()),
        ),
        ProgressSink::disabled(),
    );

    let options = AnalysisOptions {
        max_concurrent_requests: 0,
        ..fast_options()
    };
    let err = use_case.execute(request(options)).await.unwrap_err();
    assert!(format!("{}", err).contains("max_concurrent_requests"));
}
