mod cli;
mod config;

use cli::{Args, RunSettings};
use config::{discover_config, load_config_from_path};
use npm_sbom::adapters::outbound::console::StderrProgressReporter;
use npm_sbom::adapters::outbound::filesystem::{FileSystemReader, FileSystemWriter, StdoutPresenter};
use npm_sbom::adapters::outbound::network::{
    BundlephobiaClient, CachingRegistryClient, NpmDownloadsClient, NpmRegistryClient, OsvClient,
    SecurityScoreClient,
};
use npm_sbom::application::dto::{OutputFormat, SbomRequest, SbomResponse};
use npm_sbom::application::use_cases::{GenerateSbomUseCase, Providers};
use npm_sbom::ports::outbound::{progress_channel, OutputPresenter};
use npm_sbom::sbom_generation::domain::{ComplianceVerdict, SbomDocuments};
use npm_sbom::shared::error::{ExitCode, SbomError};
use npm_sbom::shared::Result;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // clap exits with code 2 on invalid arguments
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\n❌ An error occurred:\n");
            eprintln!("{}", e);

            // Display error chain
            let mut source = e.source();
            while let Some(err) = source {
                eprintln!("\nCaused by: {}", err);
                source = err.source();
            }

            eprintln!();
            ExitCode::ApplicationError
        }
    };

    process::exit(code.as_i32());
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("⚠️  Warning: a global tracing subscriber was already installed");
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // Validate project directory
    let project_dir = args.path.as_deref().unwrap_or(".");
    let project_path = PathBuf::from(project_dir);

    validate_project_path(&project_path)?;

    let config = match args.config.as_deref() {
        Some(path) => Some(load_config_from_path(Path::new(path))?),
        None => discover_config(&project_path)?,
    };
    let settings = args.resolve(project_path, config)?;

    // Create adapters (Dependency Injection)
    let providers = build_providers(&settings)?;
    let (progress, stream) = progress_channel();
    let reporter = tokio::spawn(StderrProgressReporter::new().drain(stream));

    let use_case = GenerateSbomUseCase::new(
        FileSystemReader::new(),
        FileSystemReader::new(),
        providers,
        progress,
    );

    let request = SbomRequest::new(settings.project_path.clone(), settings.options.clone())
        .with_workspaces(settings.workspaces.clone())
        .with_outdated_feed(settings.outdated_feed.clone())
        .with_audit_feed(settings.audit_feed.clone())
        .with_timeout(settings.timeout);

    let result = use_case.execute(request).await;

    // Dropping the use case drops the last sink, which ends the progress stream
    drop(use_case);
    await_reporter(reporter).await;

    let response = result?;
    write_documents(&settings, &response)?;
    report_verdict(&response);

    if settings.fail_on_non_compliant && response.verdict() == Some(ComplianceVerdict::NonCompliant) {
        return Ok(ExitCode::NonCompliant);
    }
    Ok(ExitCode::Success)
}

fn build_providers(settings: &RunSettings) -> Result<Providers> {
    let registry = match settings.registry_url.as_deref() {
        Some(url) => NpmRegistryClient::with_base_url(url)?,
        None => NpmRegistryClient::new()?,
    };

    Ok(Providers {
        registry: Arc::new(CachingRegistryClient::new(registry)),
        security: Arc::new(SecurityScoreClient::new()?),
        bundle_size: Arc::new(BundlephobiaClient::new()?),
        popularity: Arc::new(NpmDownloadsClient::new()?),
        vulnerabilities: Arc::new(OsvClient::new()?),
    })
}

fn document_for(documents: &SbomDocuments, format: OutputFormat) -> &str {
    match format {
        OutputFormat::Markdown | OutputFormat::All => &documents.markdown,
        OutputFormat::Spdx => &documents.spdx,
        OutputFormat::CycloneDx => &documents.cyclonedx,
    }
}

fn write_documents(settings: &RunSettings, response: &SbomResponse) -> Result<()> {
    let documents = response
        .aggregate
        .documents
        .as_ref()
        .ok_or_else(|| SbomError::SerializationError {
            format: settings.format.to_string(),
            details: "no documents were rendered".to_string(),
        })?;

    if settings.format == OutputFormat::All {
        let directory = settings
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        for format in settings.format.documents() {
            FileSystemWriter::in_directory(&directory, format.default_file_name())
                .present(document_for(documents, format))?;
        }
        return Ok(());
    }

    // Present output
    let presenter: Box<dyn OutputPresenter> = match &settings.output {
        Some(output_path) => Box::new(FileSystemWriter::new(output_path.clone())),
        None => Box::new(StdoutPresenter::new()),
    };

    presenter.present(document_for(documents, settings.format))
}

fn report_verdict(response: &SbomResponse) {
    if let Some(verdict) = response.verdict() {
        let line = format!("Compliance verdict: {}", verdict);
        match verdict {
            ComplianceVerdict::Compliant => eprintln!("🛡️  {}", line.green()),
            ComplianceVerdict::PartiallyCompliant => eprintln!("🛡️  {}", line.yellow()),
            ComplianceVerdict::NonCompliant => eprintln!("🛡️  {}", line.red()),
        }
    }
    if let Some(hash) = response.integrity_hash() {
        eprintln!("🔒 Integrity: {}", hash);
    }
}

fn validate_project_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Directory does not exist".to_string(),
        }
        .into());
    }

    // Security check: Reject symbolic links for project paths
    let metadata = std::fs::symlink_metadata(path).map_err(|e| SbomError::InvalidProjectPath {
        path: path.to_path_buf(),
        reason: format!("Failed to read path metadata: {}", e),
    })?;

    if metadata.is_symlink() {
        return Err(SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Security: Project path is a symbolic link. For security reasons, symbolic links are not allowed.".to_string(),
        }
        .into());
    }

    if !path.is_dir() {
        return Err(SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Not a directory".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Waits for the progress task. A failure there is logged and never fails the run.
async fn await_reporter(reporter: JoinHandle<usize>) -> Option<usize> {
    match reporter.await {
        Ok(rendered) => Some(rendered),
        Err(e) => {
            warn!(error = %e, "progress reporter task failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_await_reporter_survives_panicking_task() {
        let reporter = tokio::spawn(async {
            if true {
                panic!("render failed");
            }
            0usize
        });
        assert_eq!(await_reporter(reporter).await, None);

        let reporter = tokio::spawn(async { 3usize });
        assert_eq!(await_reporter(reporter).await, Some(3));
    }

    #[test]
    fn test_validate_project_path_valid_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(validate_project_path(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_validate_project_path_nonexistent() {
        let nonexistent_path = PathBuf::from("/nonexistent/path/that/does/not/exist");
        let err = validate_project_path(&nonexistent_path).unwrap_err();
        assert!(format!("{}", err).contains("Directory does not exist"));
    }

    #[test]
    fn test_validate_project_path_file_not_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("package.json");
        fs::write(&file_path, "{}").unwrap();

        let err = validate_project_path(&file_path).unwrap_err();
        assert!(format!("{}", err).contains("Not a directory"));
    }

    #[test]
    fn test_document_for_selects_matching_document() {
        let documents = SbomDocuments {
            markdown: "md".to_string(),
            spdx: "spdx".to_string(),
            cyclonedx: "cdx".to_string(),
        };

        assert_eq!(document_for(&documents, OutputFormat::Markdown), "md");
        assert_eq!(document_for(&documents, OutputFormat::Spdx), "spdx");
        assert_eq!(document_for(&documents, OutputFormat::CycloneDx), "cdx");
    }
}
