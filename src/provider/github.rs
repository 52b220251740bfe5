//! GitHub releases API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ProviderConfig, ReleaseProvider, fetch_listing};
use crate::core::Result;
use crate::release::{Asset, Release, ReleaseCache, select_latest};

/// One element of `GET /repos/{owner}/{repo}/releases`.
#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

#[derive(Debug, Deserialize)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

impl From<GitHubRelease> for Release {
    fn from(release: GitHubRelease) -> Self {
        Self {
            name: release.tag_name,
            description: release.body.unwrap_or_default(),
            released_at: release.published_at,
            assets: release
                .assets
                .into_iter()
                .map(|asset| Asset::new(asset.name, asset.browser_download_url))
                .collect(),
        }
    }
}

/// Releases of a GitHub (or GitHub Enterprise) repository.
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    config: ProviderConfig,
    cache: ReleaseCache,
}

impl GitHubProvider {
    /// Provider for the repository described by `config`, caching in the temp dir.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            cache: ReleaseCache::new(),
        }
    }

    /// Use a different cache location.
    #[must_use]
    pub fn with_cache(mut self, cache: ReleaseCache) -> Self {
        self.cache = cache;
        self
    }

    /// Connection settings.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Listing URL for the configured repository.
    #[must_use]
    pub fn releases_url(&self) -> String {
        let config = self.config.normalized();
        format!("{}/repos/{}/releases", config.base_url(), config.project_path)
    }
}

#[async_trait]
impl ReleaseProvider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn cache(&self) -> &ReleaseCache {
        &self.cache
    }

    async fn fetch_last_release(&self, client: &reqwest::Client) -> Result<Option<Release>> {
        let config = self.config.normalized();
        config.validate()?;

        let listing: Vec<GitHubRelease> =
            fetch_listing(client, self.name(), &self.releases_url(), config.timeout).await?;
        debug!("GitHub returned {} releases", listing.len());

        select_latest(listing.into_iter().map(Release::from).collect())
    }
}
