use std::time::Duration;

/// The analysis configuration bag.
///
/// Defaults: dev dependencies, bundle sizes and vulnerabilities on,
/// transitive dependencies off, 5 concurrent declarations, 3 attempts per
/// provider call with a 1000 ms base delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub include_dev_deps: bool,
    pub include_bundle_size: bool,
    pub include_vulnerabilities: bool,
    pub include_transitive_deps: bool,
    /// Upper bound on declarations whose provider calls are in flight at once
    pub max_concurrent_requests: usize,
    /// Total attempts per provider call, including the first
    pub retry_attempts: u32,
    /// Base backoff; attempt `n` waits `n * retry_delay` before retrying
    pub retry_delay: Duration,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            include_dev_deps: true,
            include_bundle_size: true,
            include_vulnerabilities: true,
            include_transitive_deps: false,
            max_concurrent_requests: 5,
            retry_attempts: 3,
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl AnalysisOptions {
    /// Rejects settings the orchestrator cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_requests == 0 {
            return Err("max_concurrent_requests must be at least 1".to_string());
        }
        if self.retry_attempts == 0 {
            return Err("retry_attempts must be at least 1".to_string());
        }
        Ok(())
    }
}
