//! GitLab releases API (v4).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::{ProviderConfig, ReleaseProvider, fetch_listing};
use crate::core::Result;
use crate::release::{Asset, Release, ReleaseCache, select_latest};

/// One element of `GET /api/v4/projects/{id}/releases`.
#[derive(Debug, Deserialize)]
struct GitLabRelease {
    tag_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    released_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assets: GitLabAssets,
}

#[derive(Debug, Default, Deserialize)]
struct GitLabAssets {
    #[serde(default)]
    links: Vec<GitLabLink>,
}

#[derive(Debug, Deserialize)]
struct GitLabLink {
    name: String,
    url: String,
}

impl From<GitLabRelease> for Release {
    fn from(release: GitLabRelease) -> Self {
        Self {
            name: release.tag_name,
            description: release.description.unwrap_or_default(),
            released_at: release.released_at,
            assets: release
                .assets
                .links
                .into_iter()
                .map(|link| Asset::new(link.name, link.url))
                .collect(),
        }
    }
}

/// Releases of a GitLab project.
#[derive(Debug, Clone)]
pub struct GitLabProvider {
    config: ProviderConfig,
    cache: ReleaseCache,
}

impl GitLabProvider {
    /// Provider for the project described by `config`, caching in the temp dir.
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

    /// Listing URL for the configured project.
    ///
    /// GitLab addresses projects by id or by URL-encoded path, so
    /// `group/project` becomes `group%2Fproject`.
    #[must_use]
    pub fn releases_url(&self) -> String {
        let config = self.config.normalized();
        format!(
            "{}/api/v4/projects/{}/releases",
            config.base_url(),
            urlencoding::encode(&config.project_path)
        )
    }
}

#[async_trait]
impl ReleaseProvider for GitLabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn cache(&self) -> &ReleaseCache {
        &self.cache
    }

    async fn fetch_last_release(&self, client: &reqwest::Client) -> Result<Option<Release>> {
        let config = self.config.normalized();
        config.validate()?;

        let listing: Vec<GitLabRelease> =
            fetch_listing(client, self.name(), &self.releases_url(), config.timeout).await?;
        debug!("GitLab returned {} releases", listing.len());

        select_latest(listing.into_iter().map(Release::from).collect())
    }
}
