use crate::application::dto::AnalysisOptions;
use crate::ports::outbound::{
    BundleSizeProvider, PopularityProvider, ProgressEvent, ProgressSink, RegistryClient,
    SecurityScoreProvider, VulnerabilityRepository,
};
use crate::sbom_generation::domain::version::strip_range;
use crate::sbom_generation::domain::{
    DependencyDeclaration, DependencyOutcome, KnownUnknown, ProviderOutputs,
};
use crate::sbom_generation::services::{NormalizeOptions, Normalizer, RiskScorer};
use crate::shared::Result;
use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, warn};

/// The upstream collaborators one analysis run talks to
#[derive(Clone)]
pub struct Providers {
    pub registry: Arc<dyn RegistryClient>,
    pub security: Arc<dyn SecurityScoreProvider>,
    pub bundle_size: Arc<dyn BundleSizeProvider>,
    pub popularity: Arc<dyn PopularityProvider>,
    pub vulnerabilities: Arc<dyn VulnerabilityRepository>,
}

/// FetchOrchestrator runs every declaration's provider calls under one shared
/// concurrency gate and turns the settled outputs into scored outcomes.
///
/// An orchestrator is built per run; nothing here is process-wide. The
/// semaphore bounds how many declarations have calls in flight at once,
/// across all providers together.
pub struct FetchOrchestrator {
    providers: Providers,
    options: AnalysisOptions,
    gate: Semaphore,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    completed: AtomicUsize,
}

/// Decrements the in-flight counter even when the declaration's future is
/// dropped by a deadline
struct InFlightGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FetchOrchestrator {
    pub fn new(providers: Providers, options: AnalysisOptions) -> Self {
        let permits = options.max_concurrent_requests.max(1);
        Self {
            providers,
            options,
            gate: Semaphore::new(permits),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Highest number of declarations that had provider calls in flight at once
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Produces exactly one outcome per declaration, in declaration order.
    ///
    /// Declarations still unresolved when `deadline` passes become
    /// `fetch_failed` known unknowns.
    pub async fn analyze(
        &self,
        declarations: &[DependencyDeclaration],
        deadline: Option<Instant>,
        progress: &ProgressSink,
    ) -> Vec<DependencyOutcome> {
        let total = declarations.len();
        let tasks = declarations.iter().map(|declaration| async move {
            let outcome = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.settle(declaration)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(package = declaration.name(), "deadline elapsed before analysis finished");
                            DependencyOutcome::Unknown(KnownUnknown::fetch_failed(
                                declaration.name(),
                                declaration.version_range(),
                                "analysis deadline elapsed before all provider calls settled",
                            ))
                        }
                    }
                }
                None => self.settle(declaration).await,
            };

            let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress.send(ProgressEvent::step(
                format!("Analyzed {}", declaration.name()),
                done,
                total,
            ));
            outcome
        });

        futures::future::join_all(tasks).await
    }

    /// Issues the provider calls for one declaration concurrently, waits for
    /// all of them, then normalizes and scores
    async fn settle(&self, declaration: &DependencyDeclaration) -> DependencyOutcome {
        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                return DependencyOutcome::Unknown(KnownUnknown::fetch_failed(
                    declaration.name(),
                    declaration.version_range(),
                    e.to_string(),
                ))
            }
        };
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard {
            counter: &self.in_flight,
        };
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let name = declaration.name();
        let version = strip_range(declaration.version_range());
        let providers = &self.providers;

        let (registry, security_score, bundle_size, weekly_downloads, vulnerabilities) = futures::join!(
            self.with_retry("registry", name, || providers.registry.fetch_metadata(name)),
            self.with_retry("security-score", name, || providers
                .security
                .fetch_security_score(name)),
            self.optional(self.options.include_bundle_size, "bundle-size", name, || {
                providers.bundle_size.fetch_bundle_size(name, &version)
            }),
            self.with_retry("downloads", name, || providers
                .popularity
                .fetch_weekly_downloads(name)),
            self.optional(self.options.include_vulnerabilities, "vulnerabilities", name, || {
                providers.vulnerabilities.fetch_vulnerabilities(name, &version)
            }),
        );

        let outputs = ProviderOutputs {
            registry: registry.map_err(|e| e.to_string()),
            security_score: security_score.ok(),
            bundle_size: bundle_size.flatten(),
            weekly_downloads: weekly_downloads.ok(),
            vulnerabilities,
        };

        let options = NormalizeOptions {
            include_transitive: self.options.include_transitive_deps,
            now: Utc::now(),
        };
        match Normalizer::normalize(declaration, outputs, options) {
            DependencyOutcome::Record(record) => {
                DependencyOutcome::Record(Box::new(RiskScorer::attach(*record)))
            }
            unknown => unknown,
        }
    }

    /// A feature-flagged call: skipped entirely when switched off, `None`
    /// when it stays unavailable after retries
    async fn optional<T, F, Fut>(
        &self,
        enabled: bool,
        provider: &'static str,
        package: &str,
        call: F,
    ) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !enabled {
            return None;
        }
        self.with_retry(provider, package, call).await.ok()
    }

    /// Retries with linearly increasing delay (`attempt * retry_delay`).
    /// Malformed responses surface as errors and are retried the same way as
    /// transport failures.
    async fn with_retry<T, F, Fut>(&self, provider: &'static str, package: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.options.retry_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => {
                    warn!(provider, package, attempts, error = %e, "provider unavailable after retries");
                    return Err(e);
                }
                Err(e) => {
                    debug!(provider, package, attempt, error = %e, "provider call failed, retrying");
                    tokio::time::sleep(self.options.retry_delay * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}
