use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Identity of one generated bundle: when it was produced, by what tool, and
/// the serial shared by every document emitted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbomMetadata {
    generated_at: DateTime<Utc>,
    tool_name: String,
    tool_version: String,
    serial_number: String,
}

impl SbomMetadata {
    pub fn new(
        generated_at: DateTime<Utc>,
        tool_name: String,
        tool_version: String,
        serial_number: String,
    ) -> Self {
        Self {
            generated_at,
            tool_name,
            tool_version,
            serial_number,
        }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// RFC 3339 timestamp with second precision, the form both SBOM schemas accept
    pub fn timestamp(&self) -> String {
        self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn tool_version(&self) -> &str {
        &self.tool_version
    }

    /// `urn:uuid:<uuid>`
    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// The bare UUID of the serial number
    pub fn uuid(&self) -> &str {
        self.serial_number
            .strip_prefix("urn:uuid:")
            .unwrap_or(&self.serial_number)
    }
}
