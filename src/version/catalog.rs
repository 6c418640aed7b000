use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use tokio::sync::OnceCell;

use super::compare::compare_versions;
use crate::http::HttpClient;

/// Release listing consulted once per run.
pub const DEFAULT_RELEASES_URL: &str =
    "https://api.github.com/repos/electron/electron/releases?per_page=100";

/// Used when the release listing cannot be fetched, or in offline mode.
pub const BUILTIN_VERSIONS: &[&str] = &["1.6.2", "1.6.1", "1.4.15", "1.4.14", "1.4.13", "1.4.12"];

/// Where the list of published versions comes from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn fetch_versions(&self) -> Result<Vec<String>>;
}

#[derive(Deserialize, Debug)]
struct GitHubRelease {
    tag_name: String,
}

/// Reads `tag_name` from a GitHub-style release listing.
pub struct GitHubReleases {
    http_client: HttpClient,
    url: String,
}

impl GitHubReleases {
    pub fn new(http_client: HttpClient, url: Option<String>) -> Self {
        Self {
            http_client,
            url: url.unwrap_or_else(|| DEFAULT_RELEASES_URL.to_string()),
        }
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    #[tracing::instrument(skip(self))]
    async fn fetch_versions(&self) -> Result<Vec<String>> {
        let releases: Vec<GitHubRelease> = self
            .http_client
            .get_json(&self.url)
            .await
            .with_context(|| format!("Failed to fetch Electron releases from {}", self.url))?;

        debug!("Fetched {} release(s) from {}", releases.len(), self.url);
        Ok(releases.into_iter().map(|r| r.tag_name).collect())
    }
}

/// Versions known to exist, newest first. Doubles as the fallback ladder.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KnownVersions {
    versions: Vec<String>,
}

impl KnownVersions {
    /// Strips `v` prefixes, drops empty entries and duplicates, and sorts
    /// strictly descending by version comparison.
    pub fn new<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut versions: Vec<String> = versions
            .into_iter()
            .map(|v| {
                let v = v.as_ref().trim();
                v.strip_prefix('v').unwrap_or(v).to_string()
            })
            .filter(|v| !v.is_empty())
            .collect();

        versions.sort_by(|a, b| compare_versions(b, a));
        versions.dedup_by(|a, b| compare_versions(a, b).is_eq());

        Self { versions }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_VERSIONS)
    }

    pub fn latest(&self) -> Option<&str> {
        self.versions.first().map(String::as_str)
    }

    /// First known version strictly lower than `version`.
    pub fn lower_version(&self, version: &str) -> Option<&str> {
        self.versions
            .iter()
            .find(|v| compare_versions(version, v).is_gt())
            .map(String::as_str)
    }

    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Run-scoped, lazily filled cache of [`KnownVersions`].
pub struct VersionCatalog<S: ReleaseSource> {
    source: Option<S>,
    cache: OnceCell<KnownVersions>,
}

impl<S: ReleaseSource> VersionCatalog<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            cache: OnceCell::new(),
        }
    }

    /// A catalog that never touches the network.
    pub fn offline() -> Self {
        Self {
            source: None,
            cache: OnceCell::new(),
        }
    }

    /// Known versions, fetched on first use and memoized afterwards.
    pub async fn known(&self) -> &KnownVersions {
        self.cache.get_or_init(|| self.load()).await
    }

    async fn load(&self) -> KnownVersions {
        let Some(source) = &self.source else {
            debug!("Offline: using built-in Electron version list");
            return KnownVersions::builtin();
        };

        match source.fetch_versions().await {
            Ok(versions) => {
                let known = KnownVersions::new(versions);
                if known.is_empty() {
                    warn!("Release listing contained no versions; using built-in list");
                    KnownVersions::builtin()
                } else {
                    known
                }
            }
            Err(e) => {
                warn!("{:#}; using built-in version list", e);
                KnownVersions::builtin()
            }
        }
    }
}
