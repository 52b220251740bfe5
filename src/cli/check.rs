//! `caravel check`: report whether a newer release exists.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::common::ReleaseArgs;
use crate::config::Config;
use crate::updater::check_updates;

/// Check whether a newer release is published
#[derive(Args, Debug)]
pub struct CheckCommand {
    #[command(flatten)]
    pub release: ReleaseArgs,
}

impl CheckCommand {
    /// Run the check and print the result.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is incomplete or the release host cannot be queried.
    pub async fn execute(self, config: &Config) -> Result<()> {
        let conf = self.release.update_conf(config)?;

        println!("{}", "Checking for updates...".cyan());
        match check_updates(&conf).await? {
            Some(release) => {
                println!(
                    "{}",
                    format!("Update available: {} -> {}", conf.version, release.name).green()
                );
                if !release.description.trim().is_empty() {
                    println!("\n{}", release.description.trim());
                }
                println!("\nRun `caravel update` to install it");
            }
            None => {
                println!("{}", format!("You are on the latest version ({})", conf.version).green());
            }
        }

        Ok(())
    }
}
