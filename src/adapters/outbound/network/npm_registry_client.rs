use super::build_http_client;
use crate::ports::outbound::RegistryClient;
use crate::sbom_generation::domain::{
    DistInfo, RegistryMetadata, Supplier, VersionMetadata,
};
use crate::sbom_generation::policies::LicensePolicy;
use crate::shared::error::SbomError;
use crate::shared::security::validate_package_name_for_url;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// `license` appears as an SPDX string, a `{type, url}` object, or garbage
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLicense {
    Text(String),
    Object {
        #[serde(rename = "type")]
        kind: Option<String>,
    },
    Other(Value),
}

impl RawLicense {
    fn into_text(self) -> Option<String> {
        match self {
            RawLicense::Text(text) => Some(text),
            RawLicense::Object { kind } => kind,
            RawLicense::Other(_) => None,
        }
    }
}

/// People appear as `"Name <email> (url)"` strings or as objects
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPerson {
    Text(String),
    Object {
        name: Option<String>,
        email: Option<String>,
        url: Option<String>,
    },
    Other(Value),
}

impl RawPerson {
    fn into_supplier(self) -> Option<Supplier> {
        let supplier = match self {
            RawPerson::Text(text) => parse_person(&text),
            RawPerson::Object { name, email, url } => Supplier { name, email, url },
            RawPerson::Other(_) => return None,
        };
        (!supplier.is_empty()).then_some(supplier)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRepository {
    Text(String),
    Object { url: Option<String> },
    Other(Value),
}

#[derive(Debug, Default, Deserialize)]
struct RawDist {
    integrity: Option<String>,
    shasum: Option<String>,
    tarball: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVersion {
    license: Option<RawLicense>,
    #[serde(default)]
    licenses: Vec<RawLicense>,
    author: Option<RawPerson>,
    #[serde(default)]
    dependencies: BTreeMap<String, Value>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, Value>,
    deprecated: Option<Value>,
    #[serde(default)]
    dist: Option<RawDist>,
}

#[derive(Debug, Deserialize)]
struct RawPackument {
    #[serde(default)]
    name: String,
    description: Option<String>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: BTreeMap<String, Value>,
    #[serde(default)]
    versions: BTreeMap<String, Value>,
    #[serde(default)]
    time: BTreeMap<String, Value>,
    license: Option<RawLicense>,
    #[serde(default)]
    licenses: Vec<RawLicense>,
    homepage: Option<String>,
    repository: Option<RawRepository>,
    author: Option<RawPerson>,
    #[serde(default)]
    maintainers: Vec<RawPerson>,
}

/// NpmRegistryClient adapter for the npm registry packument endpoint
///
/// This adapter implements the RegistryClient port. Retries are the
/// orchestrator's job; one call here is one HTTP request.
pub struct NpmRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistryClient {
    /// Creates a client against the public registry
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_REGISTRY_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(30))?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Scoped names keep their `@` and encode the slash: `@scope%2Fname`
    fn encode_name(package_name: &str) -> String {
        match package_name.strip_prefix('@') {
            Some(scoped) => format!("@{}", urlencoding::encode(scoped)),
            None => urlencoding::encode(package_name).into_owned(),
        }
    }
}

#[async_trait]
impl RegistryClient for NpmRegistryClient {
    async fn fetch_metadata(&self, package_name: &str) -> Result<RegistryMetadata> {
        // Security: Validate URL components before using them
        validate_package_name_for_url(package_name)?;

        let url = format!("{}/{}", self.base_url, Self::encode_name(package_name));
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SbomError::ProviderError {
                provider: "npm registry".to_string(),
                package: package_name.to_string(),
                details: format!("status {}", response.status()),
            }
            .into());
        }

        let body = response.text().await?;
        parse_packument(&body)
    }
}

/// Parses packument JSON into typed metadata. Individual malformed fields
/// degrade to their defaults; only a non-object body is an error.
pub fn parse_packument(body: &str) -> Result<RegistryMetadata> {
    let raw: RawPackument = serde_json::from_str(body)?;

    let versions = raw
        .versions
        .into_iter()
        .filter_map(|(version, value)| {
            serde_json::from_value::<RawVersion>(value)
                .ok()
                .map(|v| (version, convert_version(v)))
        })
        .collect();

    let time = raw
        .time
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| (key, dt.with_timezone(&Utc)))
        })
        .collect();

    let legacy: Vec<String> = raw.licenses.into_iter().filter_map(RawLicense::into_text).collect();

    Ok(RegistryMetadata {
        name: raw.name,
        description: raw.description.filter(|d| !d.trim().is_empty()),
        license: LicensePolicy::select_license(raw.license.and_then(RawLicense::into_text), &legacy),
        homepage: raw.homepage.filter(|h| !h.trim().is_empty()),
        repository_url: raw.repository.and_then(|r| match r {
            RawRepository::Text(url) => Some(clean_repository_url(&url)),
            RawRepository::Object { url } => url.map(|u| clean_repository_url(&u)),
            RawRepository::Other(_) => None,
        }),
        author: raw.author.and_then(RawPerson::into_supplier),
        maintainers: raw
            .maintainers
            .into_iter()
            .filter_map(RawPerson::into_supplier)
            .collect(),
        latest_version: raw
            .dist_tags
            .get("latest")
            .and_then(Value::as_str)
            .map(str::to_string),
        versions,
        time,
    })
}

fn convert_version(raw: RawVersion) -> VersionMetadata {
    let legacy: Vec<String> = raw.licenses.into_iter().filter_map(RawLicense::into_text).collect();
    let dist = raw.dist.unwrap_or_default();

    VersionMetadata {
        author: raw.author.and_then(RawPerson::into_supplier),
        license: LicensePolicy::select_license(raw.license.and_then(RawLicense::into_text), &legacy),
        dependencies: string_map(raw.dependencies),
        peer_dependencies: string_map(raw.peer_dependencies),
        deprecated: raw
            .deprecated
            .as_ref()
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .map(str::to_string),
        dist: DistInfo {
            integrity: dist.integrity,
            shasum: dist.shasum,
            tarball: dist.tarball,
        },
    }
}

fn string_map(map: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    map.into_iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_string())))
        .collect()
}

/// `git+https://github.com/x/y.git` becomes `https://github.com/x/y`
fn clean_repository_url(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_prefix("git+").unwrap_or(url);
    let url = url.strip_suffix(".git").unwrap_or(url);
    match url.strip_prefix("git://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Parses the `"Name <email> (url)"` shorthand; every part is optional
fn parse_person(text: &str) -> Supplier {
    let between = |open: char, close: char| -> Option<String> {
        let start = text.find(open)? + 1;
        let end = start + text[start..].find(close)?;
        let value = text[start..end].trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    let name_end = text.find(['<', '(']).unwrap_or(text.len());
    let name = text[..name_end].trim();

    Supplier {
        name: (!name.is_empty()).then(|| name.to_string()),
        email: between('<', '>'),
        url: between('(', ')'),
    }
}
