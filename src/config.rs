//! Configuration file support for npm-sbom.
//!
//! Provides YAML-based configuration through `npm-sbom.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use npm_sbom::application::dto::OutputFormat;
use npm_sbom::shared::Result;

pub const CONFIG_FILENAME: &str = "npm-sbom.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub include_dev_deps: Option<bool>,
    pub include_bundle_size: Option<bool>,
    pub include_vulnerabilities: Option<bool>,
    pub include_transitive_deps: Option<bool>,
    pub max_concurrent_requests: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub workspaces: Option<Vec<String>>,
    pub registry_url: Option<String>,
    pub fail_on_non_compliant: Option<bool>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
fn validate_config(config: &ConfigFile) -> Result<()> {
    if let Some(format) = &config.format {
        if format.trim().is_empty() {
            bail!(
                "Invalid config: format must not be empty.\n\n\
                 💡 Hint: Use one of markdown, spdx, cyclonedx or all."
            );
        }
        if let Err(e) = OutputFormat::from_str(format) {
            bail!("Invalid config: {}", e);
        }
    }

    if config.max_concurrent_requests == Some(0) {
        bail!(
            "Invalid config: max_concurrent_requests must be at least 1.\n\n\
             💡 Hint: The default is 5 concurrent requests."
        );
    }

    if config.retry_attempts == Some(0) {
        bail!(
            "Invalid config: retry_attempts must be at least 1.\n\n\
             💡 Hint: retry_attempts counts the first attempt too; the default is 3."
        );
    }

    if let Some(workspaces) = &config.workspaces {
        for (i, workspace) in workspaces.iter().enumerate() {
            if workspace.trim().is_empty() {
                bail!("Invalid config: workspaces[{}] must not be empty.", i);
            }
        }
    }

    if let Some(url) = &config.registry_url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            bail!(
                "Invalid config: registry_url '{}' must be an http(s) URL.",
                url
            );
        }
    }

    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            &dir,
            r#"
format: spdx
include_dev_deps: false
include_transitive_deps: true
max_concurrent_requests: 8
retry_attempts: 2
retry_delay_ms: 250
timeout_secs: 60
workspaces:
  - packages/web
registry_url: https://registry.example.com
fail_on_non_compliant: true
"#,
        );

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.format.as_deref(), Some("spdx"));
        assert_eq!(config.include_dev_deps, Some(false));
        assert_eq!(config.include_transitive_deps, Some(true));
        assert_eq!(config.max_concurrent_requests, Some(8));
        assert_eq!(config.retry_attempts, Some(2));
        assert_eq!(config.retry_delay_ms, Some(250));
        assert_eq!(config.timeout_secs, Some(60));
        assert_eq!(config.workspaces, Some(vec!["packages/web".to_string()]));
        assert_eq!(config.registry_url.as_deref(), Some("https://registry.example.com"));
        assert_eq!(config.fail_on_non_compliant, Some(true));
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "format: all\n").unwrap();

        let config = discover_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.format.as_deref(), Some("all"));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(discover_config(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "invalid: yaml: [[[broken");

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "max_concurrent_requests: 0\n");

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("max_concurrent_requests must be at least 1"));
    }

    #[test]
    fn test_empty_format_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "format: \"  \"\n");

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("format must not be empty"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "format: json\n");

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("Invalid format"));
    }

    #[test]
    fn test_non_http_registry_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, "registry_url: ftp://example.com\n");

        assert!(load_config_from_path(&config_path).is_err());
    }

    #[test]
    fn test_unknown_fields_warning() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(
            &dir,
            r#"
format: markdown
check_cve: true
another_unknown: value
"#,
        );

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("check_cve"));
        assert!(config.unknown_fields.contains_key("another_unknown"));
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();
        assert!(config.format.is_none());
        assert!(config.max_concurrent_requests.is_none());
        assert!(config.workspaces.is_none());
        assert!(config.unknown_fields.is_empty());
    }
}
