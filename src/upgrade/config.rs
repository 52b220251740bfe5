//! Configuration settings for the update pipeline.
//!
//! These settings live in the `[upgrade]` table of the caravel configuration
//! file and can be overridden from the command line.
//!
//! # Examples
//!
//! ```toml
//! [upgrade]
//! ignore_cache = false
//! download_timeout = 120
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for checking and installing updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Always query the provider instead of reusing today's cached release.
    #[serde(default)]
    pub ignore_cache: bool,

    /// Deadline for each asset download, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout: u64,

    /// Install into this directory instead of the one holding the running executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            ignore_cache: false,
            download_timeout: default_download_timeout(),
            install_dir: None,
        }
    }
}

fn default_download_timeout() -> u64 {
    120
}

impl UpgradeConfig {
    /// Default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The asset download deadline as a [`Duration`].
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }
}
