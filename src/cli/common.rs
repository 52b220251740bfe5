//! Arguments shared by the `check` and `update` subcommands.

use anyhow::{Result, bail};
use clap::Args;

use crate::config::{Config, ProviderKind, ProviderSettings};
use crate::updater::UpdateConf;

/// Release host and version selection.
///
/// Every flag overrides the matching configuration file entry.
#[derive(Args, Debug, Clone, Default)]
pub struct ReleaseArgs {
    /// Release host flavour
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// API host (defaults to api.github.com or gitlab.com)
    #[arg(long)]
    pub host: Option<String>,

    /// API port (defaults to 443 with TLS, 80 without)
    #[arg(long)]
    pub port: Option<u16>,

    /// Talk to the API over HTTPS
    #[arg(long, overrides_with = "no_ssl")]
    pub ssl: bool,

    /// Talk to the API over plain HTTP
    #[arg(long, overrides_with = "ssl")]
    pub no_ssl: bool,

    /// Project path: owner/repo on GitHub, group/project on GitLab
    #[arg(long)]
    pub project: Option<String>,

    /// Deadline for the release listing request, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Version currently installed
    #[arg(long, value_name = "VERSION")]
    pub current: Option<String>,

    /// Query the release host even if a release was cached today
    #[arg(long)]
    pub ignore_cache: bool,
}

impl ReleaseArgs {
    /// Provider settings from the configuration file with flags applied on top.
    #[must_use]
    pub fn provider_settings(&self, config: &Config) -> ProviderSettings {
        let mut settings = config.provider.clone();

        if let Some(kind) = self.provider {
            settings.kind = kind;
        }
        if let Some(host) = &self.host {
            settings.host = Some(host.clone());
        }
        if let Some(port) = self.port {
            settings.port = Some(port);
        }
        if self.ssl {
            settings.ssl = Some(true);
        } else if self.no_ssl {
            settings.ssl = Some(false);
        }
        if let Some(project) = &self.project {
            settings.project = Some(project.clone());
        }
        if let Some(timeout) = self.timeout {
            settings.timeout = Some(timeout);
        }

        settings
    }

    /// Build the library configuration for a run.
    ///
    /// # Errors
    ///
    /// Fails if no current version is given on the command line or in the file.
    pub fn update_conf(&self, config: &Config) -> Result<UpdateConf> {
        let Some(version) = self.current.clone().or_else(|| config.current_version.clone()) else {
            bail!("No current version given; pass --current or set current_version in the config file");
        };

        let process_name =
            config.process_name.clone().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

        let mut conf = UpdateConf::new(process_name, version, self.provider_settings(config).build_provider());
        conf.ignore_cache = self.ignore_cache || config.upgrade.ignore_cache;
        conf.download_timeout = config.upgrade.download_timeout();
        conf.install_dir = config.upgrade.install_dir.clone();
        Ok(conf)
    }
}
