use async_trait::async_trait;
use npm_sbom::prelude::*;
use npm_sbom::sbom_generation::domain::{Severity, VulnerabilityRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock VulnerabilityRepository for testing
#[derive(Default)]
pub struct MockVulnerabilityRepository {
    pub vulnerabilities: HashMap<String, Vec<VulnerabilityRecord>>,
    calls: AtomicUsize,
}

impl MockVulnerabilityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vulnerability(
        mut self,
        package: &str,
        id: &str,
        severity: Severity,
        fixed_in: Option<&str>,
    ) -> Self {
        let mut record = VulnerabilityRecord::new(id.to_string(), severity).unwrap();
        record.summary = format!("{} in {}", id, package);
        record.fixed_in = fixed_in.map(str::to_string);
        self.vulnerabilities
            .entry(package.to_string())
            .or_default()
            .push(record);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VulnerabilityRepository for MockVulnerabilityRepository {
    async fn fetch_vulnerabilities(
        &self,
        package_name: &str,
        _version: &str,
    ) -> Result<Vec<VulnerabilityRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .vulnerabilities
            .get(package_name)
            .cloned()
            .unwrap_or_default())
    }
}
