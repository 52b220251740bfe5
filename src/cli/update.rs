//! `caravel update`: download and install the latest release.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::ReleaseArgs;
use crate::config::Config;
use crate::updater::update;
use crate::upgrade::UpdateOutcome;

/// Install the latest release beside the running executable
#[derive(Args, Debug)]
pub struct UpdateCommand {
    #[command(flatten)]
    pub release: ReleaseArgs,

    /// Install into this directory instead of the executable's directory
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Deadline for each asset download, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub download_timeout: Option<u64>,
}

impl UpdateCommand {
    /// Run the update pipeline.
    ///
    /// "Already on the edge" is reported and is not a failure.
    ///
    /// # Errors
    ///
    /// Fails with the pipeline step and cause if any step fails.
    pub async fn execute(self, config: &Config) -> Result<()> {
        let mut conf = self.release.update_conf(config)?;
        if let Some(dir) = self.install_dir {
            conf.install_dir = Some(dir);
        }
        if let Some(seconds) = self.download_timeout {
            conf.download_timeout = std::time::Duration::from_secs(seconds);
        }

        println!("{}", "Updating to the latest version...".cyan());
        match update(&conf).await? {
            UpdateOutcome::Updated(release) => {
                println!(
                    "{}",
                    format!("Updated {} -> {}", conf.version, release.name).green()
                );
            }
            UpdateOutcome::AlreadyOnEdge => {
                println!("{}", format!("Already on the edge ({})", conf.version).green());
            }
        }

        Ok(())
    }
}
