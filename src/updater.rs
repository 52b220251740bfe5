//! One-call entry points for programs that update themselves.
//!
//! ```rust,no_run
//! use caravel::provider::{GitHubProvider, ProviderConfig};
//! use caravel::{UpdateConf, UpdateOutcome};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = GitHubProvider::new(ProviderConfig::new("api.github.com", "owner/mytool"));
//! let conf = UpdateConf::new("mytool", env!("CARGO_PKG_VERSION"), provider);
//!
//! if let Some(release) = caravel::check_updates(&conf).await? {
//!     println!("{} is available", release.name);
//!     if let UpdateOutcome::Updated(release) = caravel::update(&conf).await? {
//!         println!("Now running {} on next start", release.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::{PipelineError, Result, UpdateError};
use crate::http::default_client;
use crate::provider::Provider;
use crate::release::Release;
use crate::upgrade::download::DEFAULT_DOWNLOAD_TIMEOUT;
use crate::upgrade::{PipelineStep, UpdateOutcome, UpdatePipeline, find_update};

/// Everything [`check_updates`] and [`update`] need to know.
#[derive(Debug, Clone)]
pub struct UpdateConf {
    /// Name of the running program; names the staging directory
    pub process_name: String,
    /// Version the running program is at
    pub version: String,
    /// Where releases are published
    pub provider: Provider,
    /// Query the provider even if a release was cached today
    pub ignore_cache: bool,
    /// HTTP client to use; a default one is built when `None`
    pub http_client: Option<reqwest::Client>,
    /// Install somewhere other than beside the running executable
    pub install_dir: Option<PathBuf>,
    /// Deadline for each asset download
    pub download_timeout: Duration,
}

impl UpdateConf {
    /// Configuration with the cache enabled, a default client and install target.
    pub fn new(
        process_name: impl Into<String>,
        version: impl Into<String>,
        provider: impl Into<Provider>,
    ) -> Self {
        Self {
            process_name: process_name.into(),
            version: version.into(),
            provider: provider.into(),
            ignore_cache: false,
            http_client: None,
            install_dir: None,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    fn client(&self) -> Result<reqwest::Client> {
        match &self.http_client {
            Some(client) => Ok(client.clone()),
            None => default_client(),
        }
    }
}

/// Return the latest release if it is newer than `conf.version`.
///
/// # Errors
///
/// Returns [`UpdateError::Validation`] if `conf.version` is empty, otherwise
/// the errors of [`find_update`].
pub async fn check_updates(conf: &UpdateConf) -> Result<Option<Release>> {
    if conf.version.trim().is_empty() {
        return Err(UpdateError::validation("current version is required"));
    }

    let client = conf.client()?;
    find_update(&client, &conf.provider, &conf.version, conf.ignore_cache).await
}

/// Update the running program to the latest release.
///
/// # Errors
///
/// Returns a [`PipelineError`] tagged with the failing step. An empty
/// `conf.process_name` fails the check step with [`UpdateError::Validation`].
pub async fn update(conf: &UpdateConf) -> std::result::Result<UpdateOutcome, PipelineError> {
    let check_error = |e| PipelineError::new(PipelineStep::Check, e);

    if conf.process_name.trim().is_empty() {
        return Err(check_error(UpdateError::validation("process name is required")));
    }

    let client = conf.client().map_err(check_error)?;
    let mut pipeline = UpdatePipeline::new(&client, &conf.provider, conf.version.as_str())
        .ignore_cache(conf.ignore_cache)
        .process_name(conf.process_name.as_str())
        .download_timeout(conf.download_timeout);
    if let Some(dir) = &conf.install_dir {
        pipeline = pipeline.install_dir(dir);
    }

    pipeline.run().await
}
