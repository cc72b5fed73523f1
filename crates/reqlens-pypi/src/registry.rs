//! PyPI registry client.
//!
//! Uses the package metadata API (<https://pypi.org/pypi/{package}/json>)
//! to look up the latest release of a project.

use async_trait::async_trait;
use reqlens_core::error::{FetchError, Result};
use reqlens_core::{MetadataFetcher, PackageMetadata};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default JSON API endpoint.
pub const PYPI_BASE: &str = "https://pypi.org/pypi";

/// Base URL for package pages on pypi.org
const PYPI_URL: &str = "https://pypi.org/project";

const USER_AGENT: &str = concat!("reqlens/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Normalize package name according to PEP 503.
///
/// Converts package name to lowercase and replaces underscores/dots with hyphens,
/// then filters out consecutive hyphens.
///
/// # Examples
///
/// ```
/// # use reqlens_pypi::registry::normalize_package_name;
/// assert_eq!(normalize_package_name("Flask"), "flask");
/// assert_eq!(normalize_package_name("django_rest_framework"), "django-rest-framework");
/// assert_eq!(normalize_package_name("Pillow.Image"), "pillow-image");
/// assert_eq!(normalize_package_name("my__package"), "my-package");
/// ```
pub fn normalize_package_name(name: &str) -> String {
    name.to_lowercase()
        .replace(&['_', '.'][..], "-")
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// URL of a package's page on pypi.org, used when the response omits one.
fn package_url(name: &str) -> String {
    let normalized = normalize_package_name(name);
    format!("{}/{}", PYPI_URL, urlencoding::encode(&normalized))
}

/// Client for the PyPI JSON API.
///
/// Response caching is left to [`reqlens_core::MetadataFetchCache`]; this
/// type performs one HTTP request per call.
///
/// # Examples
///
/// ```no_run
/// # use reqlens_pypi::PypiRegistry;
/// # use reqlens_core::MetadataFetcher;
/// # #[tokio::main]
/// # async fn main() {
/// let registry = PypiRegistry::new();
/// let metadata = registry.fetch_metadata("requests").await.unwrap();
/// println!("latest: {}", metadata.latest_version);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PypiRegistry {
    client: Client,
    base_url: String,
}

impl PypiRegistry {
    /// Creates a client for the public index.
    pub fn new() -> Self {
        Self::with_base_url(PYPI_BASE)
    }

    /// Creates a client for a mirror or a test server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .gzip(true)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to configure HTTP client, using defaults");
                Client::new()
            });

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn metadata_url(&self, name: &str) -> String {
        let normalized = normalize_package_name(name);
        format!(
            "{}/{}/json",
            self.base_url,
            urlencoding::encode(&normalized)
        )
    }
}

impl Default for PypiRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataFetcher for PypiRegistry {
    async fn fetch_metadata(&self, name: &str) -> Result<PackageMetadata> {
        let url = self.metadata_url(name);
        tracing::debug!(package = name, %url, "fetching package metadata");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                package: name.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                package: name.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            package: name.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Upstream {
                package: name.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        parse_package_metadata(name, &body)
    }

    fn cache_key(&self, name: &str) -> String {
        normalize_package_name(name)
    }
}

// JSON response types

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: HashMap<String, Vec<PypiRelease>>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    name: String,
    version: String,
    summary: Option<String>,
    home_page: Option<String>,
    author: Option<String>,
    author_email: Option<String>,
    license: Option<String>,
    package_url: Option<String>,
    release_url: Option<String>,
    project_urls: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct PypiRelease {
    upload_time: Option<String>,
}

/// Parse package metadata from a PyPI JSON response.
fn parse_package_metadata(package_name: &str, body: &str) -> Result<PackageMetadata> {
    let response: PypiResponse =
        serde_json::from_str(body).map_err(|e| FetchError::InvalidResponse {
            package: package_name.to_string(),
            message: e.to_string(),
        })?;

    let PypiResponse { info, releases } = response;

    let release_date = releases
        .get(&info.version)
        .and_then(|files| files.first())
        .and_then(|file| non_empty(file.upload_time.clone()));

    let homepage = non_empty(info.home_page).or_else(|| {
        info.project_urls
            .as_ref()
            .and_then(|urls| non_empty(urls.get("Homepage").cloned()))
    });

    Ok(PackageMetadata {
        name: info.name.clone(),
        latest_version: info.version,
        summary: non_empty(info.summary),
        homepage,
        author: non_empty(info.author),
        author_email: non_empty(info.author_email),
        license: non_empty(info.license),
        package_url: non_empty(info.package_url).or_else(|| Some(package_url(&info.name))),
        release_url: non_empty(info.release_url),
        release_date,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
