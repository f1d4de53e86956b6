use crate::config::ConfigFile;
use clap::Parser;
use npm_sbom::application::dto::{AnalysisOptions, OutputFormat};
use npm_sbom::shared::error::SbomError;
use npm_sbom::shared::Result;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Analyze npm dependencies and generate SBOMs
#[derive(Parser, Debug)]
#[command(name = "npm-sbom")]
#[command(version)]
#[command(
    about = "Analyze npm dependencies and generate SBOMs (Markdown, SPDX 2.3, CycloneDX 1.5)",
    long_about = None
)]
pub struct Args {
    /// Output format: markdown, spdx, cyclonedx or all [default: markdown]
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Path to the project directory containing package.json (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<String>,

    /// Output file path; with `--format all`, the output directory.
    /// Without it a single document goes to stdout and `all` writes into the current directory.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to a config file (defaults to npm-sbom.config.yml in the project directory)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Skip devDependencies
    #[arg(long)]
    pub no_dev: bool,

    /// Skip bundle size lookups
    #[arg(long)]
    pub no_bundle_size: bool,

    /// Skip vulnerability lookups
    #[arg(long)]
    pub no_vulnerabilities: bool,

    /// Record each dependency's own dependency names
    #[arg(long)]
    pub transitive: bool,

    /// Maximum number of dependencies analyzed at once [default: 5]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub concurrency: Option<u32>,

    /// Attempts per provider call, including the first [default: 3]
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub retry_attempts: Option<u32>,

    /// Base retry delay in milliseconds; attempt n waits n times this [default: 1000]
    #[arg(long, value_name = "MS")]
    pub retry_delay: Option<u64>,

    /// `npm outdated --json` output to merge into the report
    #[arg(long, value_name = "FILE")]
    pub outdated: Option<PathBuf>,

    /// `npm audit --json` output to merge into the report
    #[arg(long, value_name = "FILE")]
    pub audit: Option<PathBuf>,

    /// Workspace member directory or glob (can be specified multiple times)
    #[arg(short, long = "workspace", value_name = "DIR")]
    pub workspace: Vec<String>,

    /// Give up on unresolved dependencies after this many seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// npm registry base URL [default: https://registry.npmjs.org]
    #[arg(long, value_name = "URL")]
    pub registry_url: Option<String>,

    /// Exit with code 1 when the compliance verdict is non_compliant
    #[arg(long)]
    pub fail_on_non_compliant: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings for one run after CLI flags, config file and defaults are merged
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub project_path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub options: AnalysisOptions,
    pub workspaces: Vec<String>,
    pub outdated_feed: Option<PathBuf>,
    pub audit_feed: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub registry_url: Option<String>,
    pub fail_on_non_compliant: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Merges the arguments over an optional config file.
    /// Precedence: CLI flag > config file > default.
    pub fn resolve(&self, project_path: PathBuf, config: Option<ConfigFile>) -> Result<RunSettings> {
        let config = config.unwrap_or_default();
        let defaults = AnalysisOptions::default();

        let format = match (self.format, config.format.as_deref()) {
            (Some(format), _) => format,
            (None, Some(value)) => OutputFormat::from_str(value)
                .map_err(|message| SbomError::Validation { message })?,
            (None, None) => OutputFormat::Markdown,
        };

        let options = AnalysisOptions {
            include_dev_deps: !self.no_dev
                && config.include_dev_deps.unwrap_or(defaults.include_dev_deps),
            include_bundle_size: !self.no_bundle_size
                && config
                    .include_bundle_size
                    .unwrap_or(defaults.include_bundle_size),
            include_vulnerabilities: !self.no_vulnerabilities
                && config
                    .include_vulnerabilities
                    .unwrap_or(defaults.include_vulnerabilities),
            include_transitive_deps: self.transitive
                || config
                    .include_transitive_deps
                    .unwrap_or(defaults.include_transitive_deps),
            max_concurrent_requests: self
                .concurrency
                .map(|n| n as usize)
                .or(config.max_concurrent_requests)
                .unwrap_or(defaults.max_concurrent_requests),
            retry_attempts: self
                .retry_attempts
                .or(config.retry_attempts)
                .unwrap_or(defaults.retry_attempts),
            retry_delay: self
                .retry_delay
                .or(config.retry_delay_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        };
        options
            .validate()
            .map_err(|message| SbomError::Validation { message })?;

        let workspaces = if self.workspace.is_empty() {
            config.workspaces.unwrap_or_default()
        } else {
            self.workspace.clone()
        };

        Ok(RunSettings {
            project_path,
            format,
            output: self.output.as_ref().map(PathBuf::from).or(config.output),
            options,
            workspaces,
            outdated_feed: self.outdated.clone(),
            audit_feed: self.audit.clone(),
            timeout: self.timeout.or(config.timeout_secs).map(Duration::from_secs),
            registry_url: self.registry_url.clone().or(config.registry_url),
            fail_on_non_compliant: self.fail_on_non_compliant
                || config.fail_on_non_compliant.unwrap_or(false),
        })
    }
}
