use crate::ports::outbound::OutputPresenter;
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// FileSystemWriter adapter for writing output to files
///
/// This adapter implements the OutputPresenter port for file output.
pub struct FileSystemWriter {
    output_path: PathBuf,
}

impl FileSystemWriter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }

    /// A writer for `file_name` inside `directory`
    pub fn in_directory(directory: &Path, file_name: &str) -> Self {
        Self::new(directory.join(file_name))
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn write_error(&self, details: String) -> anyhow::Error {
        SbomError::FileWriteError {
            path: self.output_path.clone(),
            details,
        }
        .into()
    }

    /// Security validation before writing:
    /// - The parent directory must exist and be a real directory
    /// - An existing output file must not be a symlink
    fn validate_output_path(&self) -> Result<()> {
        if let Some(parent) = self.output_path.parent() {
            if parent != Path::new("") {
                let metadata = fs::symlink_metadata(parent).map_err(|_| {
                    self.write_error(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    ))
                })?;
                if !metadata.is_dir() {
                    return Err(self.write_error(format!(
                        "Parent path is not a directory: {}",
                        parent.display()
                    )));
                }
            }
        }

        if let Ok(metadata) = fs::symlink_metadata(&self.output_path) {
            if metadata.is_symlink() {
                return Err(self.write_error(
                    "Security: Output path is a symbolic link. For security reasons, writing to symbolic links is not allowed.".to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl OutputPresenter for FileSystemWriter {
    fn present(&self, content: &str) -> Result<()> {
        self.validate_output_path()?;

        fs::write(&self.output_path, content).map_err(|e| self.write_error(e.to_string()))?;

        info!(path = %self.output_path.display(), bytes = content.len(), "output written");
        eprintln!("✅ Output complete: {}", self.output_path.display());
        Ok(())
    }
}

/// StdoutPresenter adapter for writing output to stdout
///
/// This adapter implements the OutputPresenter port for stdout output.
pub struct StdoutPresenter;

impl StdoutPresenter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdoutPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputPresenter for StdoutPresenter {
    fn present(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .and_then(|_| stdout.flush())
            .map_err(|e| anyhow::anyhow!("Failed to write to stdout: {}", e))?;
        Ok(())
    }
}
