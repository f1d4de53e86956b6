use npm_sbom::prelude::*;
use npm_sbom::sbom_generation::domain::{AuditFeed, OutdatedInfo};
use std::collections::BTreeMap;
use std::path::Path;

/// Mock FeedReader for testing
#[derive(Default)]
pub struct MockFeedReader {
    pub outdated: BTreeMap<String, OutdatedInfo>,
    pub audit: AuditFeed,
}

impl MockFeedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outdated(mut self, name: &str, current: &str, wanted: &str, latest: &str) -> Self {
        self.outdated.insert(
            name.to_string(),
            OutdatedInfo {
                current: current.to_string(),
                wanted: wanted.to_string(),
                latest: latest.to_string(),
            },
        );
        self
    }

    pub fn with_audit(mut self, audit: AuditFeed) -> Self {
        self.audit = audit;
        self
    }
}

impl FeedReader for MockFeedReader {
    fn read_outdated(&self, _path: &Path) -> Result<BTreeMap<String, OutdatedInfo>> {
        Ok(self.outdated.clone())
    }

    fn read_audit(&self, _path: &Path) -> Result<AuditFeed> {
        Ok(self.audit.clone())
    }
}
