//! Release providers for hosted release catalogues.
//!
//! A provider knows how to list the releases of one project on one hosting
//! service, convert the host's JSON into [`Release`] values, and pick the newest
//! one with [`VersionComparator`](crate::version::VersionComparator). Each
//! provider also owns a [`ReleaseCache`] so the resolver can skip the network
//! for the rest of the day once a release was resolved.
//!
//! # Supported Hosts
//!
//! | Provider | Listing URL |
//! |----------|-------------|
//! | [`GitHubProvider`] | `{scheme}://{host}:{port}/repos/{project}/releases` |
//! | [`GitLabProvider`] | `{scheme}://{host}:{port}/api/v4/projects/{url-encoded project}/releases` |
//!
//! New hosts implement [`ReleaseProvider`]; [`Provider`] is the closed set
//! selectable from configuration.
//!
//! # Examples
//!
//! ```rust,no_run
//! use caravel::provider::{GitHubProvider, ProviderConfig, ReleaseProvider};
//!
//! # async fn example() -> caravel::core::Result<()> {
//! let provider = GitHubProvider::new(ProviderConfig::new("api.github.com", "owner/repo"));
//! let client = caravel::http::default_client()?;
//!
//! if let Some(release) = provider.fetch_last_release(&client).await? {
//!     println!("Latest release: {}", release.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod github;
pub mod gitlab;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::{Result, UpdateError};
use crate::release::{Release, ReleaseCache};

pub use config::{DEFAULT_REQUEST_TIMEOUT, ProviderConfig};
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;

/// A source of releases for one project.
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    /// Short service name used in errors and logs (e.g., `"github"`).
    fn name(&self) -> &'static str;

    /// Cache used by [`cache_release`](Self::cache_release) and
    /// [`restore_cache_release`](Self::restore_cache_release).
    fn cache(&self) -> &ReleaseCache;

    /// Fetch every release of the project and return the greatest by version.
    ///
    /// `Ok(None)` means the project has no releases.
    ///
    /// # Errors
    ///
    /// - [`UpdateError::Validation`] for incomplete settings, before any request
    /// - [`UpdateError::Network`] if the request fails or times out
    /// - [`UpdateError::HttpStatus`] for any status other than `200`
    /// - [`UpdateError::Parse`] if the body is not the expected JSON array
    /// - [`UpdateError::InvalidVersionFormat`] if a release tag is not a version
    async fn fetch_last_release(&self, client: &reqwest::Client) -> Result<Option<Release>>;

    /// Store `release` in today's cache file.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the cache file cannot be written.
    async fn cache_release(&self, release: &Release) -> Result<()> {
        self.cache().cache_release(release).await
    }

    /// Read today's cached release.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::CacheMiss`] if there is no usable cache file.
    async fn restore_cache_release(&self) -> Result<Release> {
        self.cache().restore_cache_release().await
    }
}

/// Provider selected at runtime, e.g. from a configuration file.
#[derive(Debug, Clone)]
pub enum Provider {
    /// GitHub or GitHub Enterprise
    GitHub(GitHubProvider),
    /// GitLab (SaaS or self-managed)
    GitLab(GitLabProvider),
}

impl From<GitHubProvider> for Provider {
    fn from(provider: GitHubProvider) -> Self {
        Self::GitHub(provider)
    }
}

impl From<GitLabProvider> for Provider {
    fn from(provider: GitLabProvider) -> Self {
        Self::GitLab(provider)
    }
}

#[async_trait]
impl ReleaseProvider for Provider {
    fn name(&self) -> &'static str {
        match self {
            Self::GitHub(provider) => provider.name(),
            Self::GitLab(provider) => provider.name(),
        }
    }

    fn cache(&self) -> &ReleaseCache {
        match self {
            Self::GitHub(provider) => provider.cache(),
            Self::GitLab(provider) => provider.cache(),
        }
    }

    async fn fetch_last_release(&self, client: &reqwest::Client) -> Result<Option<Release>> {
        match self {
            Self::GitHub(provider) => provider.fetch_last_release(client).await,
            Self::GitLab(provider) => provider.fetch_last_release(client).await,
        }
    }
}

/// GET a release listing and decode it as a JSON array of `T`.
pub(crate) async fn fetch_listing<T: DeserializeOwned>(
    client: &reqwest::Client,
    service: &str,
    url: &str,
    timeout: Duration,
) -> Result<Vec<T>> {
    debug!("Fetching {} releases from {}", service, url);

    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| UpdateError::network(format!("{service} release listing"), e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(UpdateError::HttpStatus {
            service: service.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| UpdateError::network(format!("{service} release listing"), e))?;

    serde_json::from_slice(&body).map_err(|source| UpdateError::Parse {
        what: format!("{service} release listing"),
        source,
    })
}
