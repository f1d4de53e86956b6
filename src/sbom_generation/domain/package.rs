use crate::shared::Result;
use serde::{Deserialize, Serialize};

/// npm caps package names at 214 characters
const MAX_PACKAGE_NAME_LENGTH: usize = 214;

/// Maximum length for a declared version range (security limit)
const MAX_RANGE_LENGTH: usize = 256;

/// NewType wrapper for an npm package name with validation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    pub fn new(name: String) -> Result<Self> {
        if name.is_empty() {
            anyhow::bail!("Package name cannot be empty");
        }

        // Security: Length limit to prevent DoS
        if name.len() > MAX_PACKAGE_NAME_LENGTH {
            anyhow::bail!(
                "Package name is too long ({} bytes). Maximum allowed: {} bytes",
                name.len(),
                MAX_PACKAGE_NAME_LENGTH
            );
        }

        // Security: only the characters npm itself accepts in names
        if !name.chars().all(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, '-' | '_' | '.' | '~' | '@' | '/' | '!' | '*' | '\'' | '(' | ')')
        }) {
            anyhow::bail!(
                "Package name '{}' contains invalid characters. Only URL-safe characters are allowed.",
                name
            );
        }

        let is_scoped = name.starts_with('@');
        let slash_count = name.matches('/').count();
        if (is_scoped && slash_count != 1) || (!is_scoped && slash_count != 0) {
            anyhow::bail!(
                "Package name '{}' is malformed. Scoped names take the form @scope/name.",
                name
            );
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for `@scope/name` packages
    pub fn is_scoped(&self) -> bool {
        self.0.starts_with('@')
    }
}

impl TryFrom<String> for PackageName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(value: PackageName) -> Self {
        value.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One dependency as written in a manifest: name, declared range and whether it
/// is development-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    name: PackageName,
    version_range: String,
    is_dev: bool,
}

impl DependencyDeclaration {
    pub fn new(name: String, version_range: String, is_dev: bool) -> Result<Self> {
        if version_range.len() > MAX_RANGE_LENGTH {
            anyhow::bail!(
                "Version range for '{}' is too long ({} bytes). Maximum allowed: {} bytes",
                name,
                version_range.len(),
                MAX_RANGE_LENGTH
            );
        }

        Ok(Self {
            name: PackageName::new(name)?,
            version_range,
            is_dev,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn version_range(&self) -> &str {
        &self.version_range
    }

    pub fn is_dev(&self) -> bool {
        self.is_dev
    }
}
