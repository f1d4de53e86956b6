use crate::sbom_generation::domain::{AuditFeed, OutdatedInfo};
use crate::shared::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// FeedReader port for optional outdated and audit feeds
pub trait FeedReader {
    /// Reads an `npm outdated --json` document
    fn read_outdated(&self, path: &Path) -> Result<BTreeMap<String, OutdatedInfo>>;

    /// Reads an `npm audit --json` (report version 2) document
    fn read_audit(&self, path: &Path) -> Result<AuditFeed>;
}
