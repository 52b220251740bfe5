//! Command-line interface for caravel.
//!
//! # Commands
//!
//! - `check` - Report whether a newer release is published
//! - `update` - Download, verify and install the latest release
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Log pipeline progress and internals
//! - `--quiet` / `-q` - Disable logging
//! - `--config` / `-c` - Configuration file (default `~/.caravel/config.toml`)
//!
//! # Examples
//!
//! ```bash
//! # Is there something newer than v1.2.0 on GitHub?
//! caravel check --project owner/tool --current v1.2.0
//!
//! # Update from a self-managed GitLab, bypassing today's cache
//! caravel update --provider gitlab --host gitlab.example.com \
//!     --project tools/tool --current v1.2.0 --ignore-cache
//! ```

mod check;
pub mod common;
mod update;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Runtime configuration derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `None` disables logging
    pub log_level: Option<String>,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Does nothing when logging is disabled or a subscriber is already set.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Self-update releases published on GitHub or GitLab
#[derive(Parser)]
#[command(name = "caravel", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pipeline progress and internals
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file
    #[arg(short, long, global = true, env = "CARAVEL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a newer release is published
    Check(check::CheckCommand),
    /// Install the latest release
    Update(update::UpdateCommand),
}

impl Cli {
    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded or the command fails.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Derive the runtime configuration from the global flags.
    ///
    /// `--verbose` selects `debug`, `--quiet` disables logging, otherwise
    /// `RUST_LOG` is honoured with `warn` as fallback.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
        }
    }

    /// Execute with an already-built [`CliConfig`].
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded or the command fails.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        let file_config = Config::load_with_optional(config.config_path.as_deref()).await?;

        match self.command {
            Commands::Check(cmd) => cmd.execute(&file_config).await,
            Commands::Update(cmd) => cmd.execute(&file_config).await,
        }
    }
}
