use serde::{Deserialize, Serialize};

/// Why a declared dependency could not be turned into a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnownUnknownCategory {
    Unknown,
    Redacted,
    NotApplicable,
    FetchFailed,
}

impl KnownUnknownCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownUnknownCategory::Unknown => "unknown",
            KnownUnknownCategory::Redacted => "redacted",
            KnownUnknownCategory::NotApplicable => "not_applicable",
            KnownUnknownCategory::FetchFailed => "fetch_failed",
        }
    }
}

impl std::fmt::Display for KnownUnknownCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared dependency that is tracked explicitly instead of silently dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownUnknown {
    pub name: String,
    pub version: String,
    pub reason: String,
    pub category: KnownUnknownCategory,
}

impl KnownUnknown {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
        category: KnownUnknownCategory,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            reason: reason.into(),
            category,
        }
    }

    pub fn fetch_failed(
        name: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(name, version, reason, KnownUnknownCategory::FetchFailed)
    }
}
