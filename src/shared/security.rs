use crate::shared::error::SbomError;
use crate::shared::Result;
use std::fs;
use std::path::Path;

/// Maximum size for any input document (manifest, audit or outdated feed): 20 MB
pub const MAX_INPUT_SIZE: u64 = 20 * 1024 * 1024;

/// Reads an input document after rejecting symlinks, non-regular files and
/// oversized files.
///
/// # Arguments
/// * `path` - The file to read
/// * `description` - Human-readable name used in error messages (e.g. "package.json")
pub fn read_checked(path: &Path, description: &str) -> Result<String> {
    let metadata = fs::symlink_metadata(path).map_err(|e| SbomError::FileReadError {
        path: path.to_path_buf(),
        details: format!("Failed to read {} metadata: {}", description, e),
    })?;

    if metadata.is_symlink() {
        return Err(SbomError::SecurityError {
            path: path.to_path_buf(),
            reason: format!("{} is a symbolic link", description),
            hint: "Pass the real file instead of a link to it".to_string(),
        }
        .into());
    }

    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    validate_file_size(metadata.len(), path, MAX_INPUT_SIZE)?;

    fs::read_to_string(path).map_err(|e| {
        SbomError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        }
        .into()
    })
}

/// Validates file size is within acceptable limits
pub fn validate_file_size(file_size: u64, path: &Path, max_size: u64) -> Result<()> {
    if file_size > max_size {
        anyhow::bail!(
            "Security: {} is too large ({} bytes). Maximum allowed size is {} bytes.",
            path.display(),
            file_size,
            max_size
        );
    }
    Ok(())
}

/// Rejects package names that could alter the request path of a registry URL.
///
/// Scoped names (`@scope/name`) are allowed; everything else that could
/// escape the path segment is not.
pub fn validate_package_name_for_url(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("Security: package name is empty");
    }
    if name.contains("..") || name.contains('\\') || name.contains('#') || name.contains('?') {
        anyhow::bail!(
            "Security: package name '{}' contains URL-unsafe characters",
            name
        );
    }
    let slashes = name.matches('/').count();
    if slashes > 1 || (slashes == 1 && !name.starts_with('@')) {
        anyhow::bail!(
            "Security: package name '{}' contains path separators which are not allowed",
            name
        );
    }
    Ok(())
}
