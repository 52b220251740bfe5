//! User configuration file for the `caravel` command.
//!
//! # Configuration File Location
//!
//! - **Unix/macOS**: `~/.caravel/config.toml`
//! - **Windows**: `%LOCALAPPDATA%\caravel\config.toml`
//!
//! The location can be overridden with `--config` or the `CARAVEL_CONFIG`
//! environment variable. A missing default file is not an error: every
//! setting then comes from the command line.
//!
//! # File Format
//!
//! ```toml
//! current_version = "v1.4.2"
//! process_name = "mytool"
//!
//! [provider]
//! kind = "gitlab"            # or "github"
//! host = "gitlab.example.com"
//! port = 8443                # optional, derived from ssl
//! ssl = true
//! project = "tools/mytool"
//! timeout = 30               # seconds
//!
//! [upgrade]
//! ignore_cache = false
//! download_timeout = 120     # seconds
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::provider::{DEFAULT_REQUEST_TIMEOUT, GitHubProvider, GitLabProvider, Provider, ProviderConfig};
use crate::upgrade::config::UpgradeConfig;

/// Supported release hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// GitHub releases API
    #[default]
    Github,
    /// GitLab releases API
    Gitlab,
}

impl ProviderKind {
    /// API host used when none is configured.
    #[must_use]
    pub const fn default_host(self) -> &'static str {
        match self {
            Self::Github => "api.github.com",
            Self::Gitlab => "gitlab.com",
        }
    }
}

/// The `[provider]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Release host flavour
    #[serde(default)]
    pub kind: ProviderKind,
    /// API host, defaulting to the public service of `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// TCP port, derived from `ssl` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Use HTTPS (default `true`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<bool>,
    /// Project path (`owner/repo` or `group/project`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Listing request deadline in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ProviderSettings {
    /// Connection settings for the provider.
    #[must_use]
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            host: self.host.clone().unwrap_or_else(|| self.kind.default_host().to_string()),
            port: self.port,
            ssl: self.ssl.unwrap_or(true),
            project_path: self.project.clone().unwrap_or_default(),
            timeout: self.timeout.map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs),
        }
    }

    /// The provider described by these settings.
    #[must_use]
    pub fn build_provider(&self) -> Provider {
        let config = self.provider_config();
        match self.kind {
            ProviderKind::Github => GitHubProvider::new(config).into(),
            ProviderKind::Gitlab => GitLabProvider::new(config).into(),
        }
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Version the managed program is currently at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    /// Name of the managed program, used to name the staging directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    /// Release host settings
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Update behaviour
    #[serde(default)]
    pub upgrade: UpgradeConfig,
}

impl Config {
    /// Load from the default location, or defaults if that file does not exist.
    ///
    /// # Errors
    ///
    /// Fails if the home directory cannot be determined, or the file exists but
    /// cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from `path` when given (it must exist), otherwise as [`Config::load`].
    ///
    /// # Errors
    ///
    /// Fails if an explicit file is missing, unreadable or invalid.
    pub async fn load_with_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => Self::load().await,
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid TOML for this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Platform-specific location of the configuration file.
    ///
    /// # Errors
    ///
    /// Fails if the home (or, on Windows, local data) directory is unknown.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("caravel")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".caravel")
        };

        Ok(config_dir.join("config.toml"))
    }
}
