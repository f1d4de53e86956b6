/// Output format enumeration for SBOM generation
///
/// This enum represents the supported output formats. It belongs in the
/// application layer because both the CLI and the formatter factory need
/// to understand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable Markdown report (default)
    Markdown,
    /// SPDX 2.3 JSON
    Spdx,
    /// CycloneDX 1.5 JSON
    CycloneDx,
    /// Every format, one file each
    All,
}

impl OutputFormat {
    /// The concrete document formats this selection expands to
    pub fn documents(&self) -> Vec<OutputFormat> {
        match self {
            OutputFormat::All => vec![
                OutputFormat::Markdown,
                OutputFormat::Spdx,
                OutputFormat::CycloneDx,
            ],
            single => vec![*single],
        }
    }

    /// File name used when several documents are written to one directory
    pub fn default_file_name(&self) -> &'static str {
        match self {
            OutputFormat::Markdown | OutputFormat::All => "sbom.md",
            OutputFormat::Spdx => "sbom.spdx.json",
            OutputFormat::CycloneDx => "sbom.cdx.json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "spdx" => Ok(OutputFormat::Spdx),
            "cyclonedx" | "cdx" => Ok(OutputFormat::CycloneDx),
            "all" => Ok(OutputFormat::All),
            _ => Err(format!(
                "Invalid format: {}. Please specify 'markdown', 'spdx', 'cyclonedx' or 'all'",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Spdx => write!(f, "spdx"),
            OutputFormat::CycloneDx => write!(f, "cyclonedx"),
            OutputFormat::All => write!(f, "all"),
        }
    }
}
