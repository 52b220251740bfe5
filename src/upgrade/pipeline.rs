//! End-to-end update: check, download, extract, verify, install, clean up.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::download::{DEFAULT_DOWNLOAD_TIMEOUT, download_assets};
use super::extract::extract;
use super::install::{install, resolve_install_target};
use super::resolver::find_update;
use super::verification::ChecksumVerifier;
use crate::core::{PipelineError, UpdateError};
use crate::provider::ReleaseProvider;
use crate::release::Release;

/// The steps of [`UpdatePipeline::run`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Resolve the latest release and compare it to the running version
    Check,
    /// Fetch the package and the checksum manifest into the staging directory
    Download,
    /// Unpack the package inside the staging directory
    Extract,
    /// Compare the package digest with the manifest
    Verify,
    /// Copy the payload beside the running executable
    Install,
    /// Remove the staging directory
    Cleanup,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Check => "check",
            Self::Download => "download",
            Self::Extract => "extract",
            Self::Verify => "verify",
            Self::Install => "install",
            Self::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// How a successful pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The release was installed.
    Updated(Release),
    /// The running version is already the latest; nothing was downloaded.
    AlreadyOnEdge,
}

impl UpdateOutcome {
    /// Returns `true` if a release was installed.
    #[must_use]
    pub const fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated(release) => write!(f, "updated to {}", release.name),
            Self::AlreadyOnEdge => f.write_str("already on the edge"),
        }
    }
}

/// Self-update of the running program from a release provider.
///
/// Steps run strictly one after another. The first failure ends the run with a
/// [`PipelineError`] naming the step; completed steps are not undone. Once the
/// staging directory exists it is removed at the end of the run whatever the
/// outcome.
///
/// # Examples
///
/// ```rust,no_run
/// use caravel::provider::{GitHubProvider, ProviderConfig};
/// use caravel::upgrade::{UpdateOutcome, UpdatePipeline};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = caravel::http::default_client()?;
/// let provider = GitHubProvider::new(ProviderConfig::new("api.github.com", "owner/app"));
///
/// match UpdatePipeline::new(&client, &provider, "v1.0.0").run().await? {
///     UpdateOutcome::Updated(release) => println!("Updated to {}", release.name),
///     UpdateOutcome::AlreadyOnEdge => println!("Already up to date"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct UpdatePipeline<'a> {
    client: &'a reqwest::Client,
    provider: &'a dyn ReleaseProvider,
    current_version: String,
    ignore_cache: bool,
    install_dir: Option<PathBuf>,
    staging_root: PathBuf,
    staging_prefix: Option<String>,
    download_timeout: Duration,
}

impl<'a> UpdatePipeline<'a> {
    /// Pipeline updating from `current_version` with releases from `provider`.
    pub fn new(
        client: &'a reqwest::Client,
        provider: &'a dyn ReleaseProvider,
        current_version: impl Into<String>,
    ) -> Self {
        Self {
            client,
            provider,
            current_version: current_version.into(),
            ignore_cache: false,
            install_dir: None,
            staging_root: std::env::temp_dir(),
            staging_prefix: None,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
        }
    }

    /// Query the provider even if a release was cached today.
    #[must_use]
    pub fn ignore_cache(mut self, ignore_cache: bool) -> Self {
        self.ignore_cache = ignore_cache;
        self
    }

    /// Install into `dir` instead of the running executable's directory.
    #[must_use]
    pub fn install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    /// Create the staging directory under `dir` instead of the system temp dir.
    #[must_use]
    pub fn staging_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_root = dir.into();
        self
    }

    /// Name the staging directory after `process_name`.
    ///
    /// Defaults to the base name of the running executable.
    #[must_use]
    pub fn process_name(mut self, process_name: impl Into<String>) -> Self {
        self.staging_prefix = Some(process_name.into());
        self
    }

    /// Deadline for each asset download.
    #[must_use]
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] tagged with the failing step. "Already on the
    /// edge" is not an error: it is [`UpdateOutcome::AlreadyOnEdge`].
    pub async fn run(&self) -> Result<UpdateOutcome, PipelineError> {
        debug!("Entering step {}", PipelineStep::Check);
        let release = find_update(self.client, self.provider, &self.current_version, self.ignore_cache)
            .await
            .map_err(|e| PipelineError::new(PipelineStep::Check, e))?;

        let Some(release) = release else {
            info!("Already on the edge ({})", self.current_version);
            return Ok(UpdateOutcome::AlreadyOnEdge);
        };

        debug!("Entering step {}", PipelineStep::Download);
        let staging = tempfile::Builder::new()
            .prefix(&format!("{}-", self.staging_prefix()))
            .tempdir_in(&self.staging_root)
            .map_err(|e| {
                PipelineError::new(
                    PipelineStep::Download,
                    UpdateError::io("create staging directory", &self.staging_root, e),
                )
            })?;
        debug!("Staging update in {}", staging.path().display());

        let result = self.stage_and_install(&release, staging.path()).await;

        debug!("Entering step {}", PipelineStep::Cleanup);
        info!("Deleting installation files");
        let staging_path = staging.path().to_path_buf();
        if let Err(e) = staging.close() {
            warn!("Failed to remove staging directory {}: {}", staging_path.display(), e);
        }

        result.map(|()| {
            info!("Updated to {}", release.name);
            UpdateOutcome::Updated(release)
        })
    }

    async fn stage_and_install(&self, release: &Release, staging: &Path) -> Result<(), PipelineError> {
        let assets = download_assets(self.client, release, staging, self.download_timeout)
            .await
            .map_err(|e| PipelineError::new(PipelineStep::Download, e))?;

        debug!("Entering step {}", PipelineStep::Extract);
        extract(&assets.package).await.map_err(|e| PipelineError::new(PipelineStep::Extract, e))?;

        debug!("Entering step {}", PipelineStep::Verify);
        ChecksumVerifier::verify(&assets.package, &assets.manifest)
            .await
            .map_err(|e| PipelineError::new(PipelineStep::Verify, e))?;

        debug!("Entering step {}", PipelineStep::Install);
        let target = match &self.install_dir {
            Some(dir) => dir.clone(),
            None => resolve_install_target().map_err(|e| PipelineError::new(PipelineStep::Install, e))?,
        };
        info!("Sets {} as the installation directory", target.display());

        let installed =
            install(staging, &target).await.map_err(|e| PipelineError::new(PipelineStep::Install, e))?;
        debug!("Installed {} files into {}", installed, target.display());

        Ok(())
    }

    fn staging_prefix(&self) -> String {
        if let Some(prefix) = self.staging_prefix.as_deref().filter(|p| !p.is_empty()) {
            return process_base_name(prefix);
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
    }
}

/// Base name of a process name that may be given as a path.
fn process_base_name(process_name: &str) -> String {
    Path::new(process_name)
        .file_name()
        .map_or_else(|| process_name.to_string(), |name| name.to_string_lossy().into_owned())
}
