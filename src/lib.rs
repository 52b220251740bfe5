//! caravel - self-update for programs released on GitHub or GitLab
//!
//! A running program uses caravel to discover a newer release of itself on a
//! hosted release catalogue, download the package built for the current
//! operating system, check it against the release's `checksums.txt`, and copy
//! the payload over the files beside its own executable.
//!
//! # Architecture Overview
//!
//! Modules, leaves first:
//!
//! - [`version`] - Comparison of `v?MAJOR.MINOR.PATCH(-PRERELEASE)?` tags
//! - [`release`] - Provider-agnostic [`Release`] model and the daily release cache
//! - [`provider`] - GitHub and GitLab release listings behind [`ReleaseProvider`]
//! - [`upgrade`] - Resolver, downloader, extractor, checksum verifier, installer
//!   and the [`UpdatePipeline`] tying them together
//! - [`updater`] - [`check_updates`] and [`update`], the one-call entry points
//!
//! Supporting modules:
//!
//! - [`core`] - Error types and user-facing error reporting
//! - [`http`] - Default HTTP client
//! - [`config`] - TOML configuration file of the `caravel` binary
//! - [`cli`] - The `caravel` command-line front end
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use caravel::provider::{GitLabProvider, ProviderConfig};
//! use caravel::{UpdateConf, UpdateOutcome};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = GitLabProvider::new(ProviderConfig::new("gitlab.com", "group/tool"));
//! let conf = UpdateConf::new("tool", "v1.2.0", provider);
//!
//! match caravel::update(&conf).await? {
//!     UpdateOutcome::Updated(release) => println!("Updated to {}", release.name),
//!     UpdateOutcome::AlreadyOnEdge => println!("Already on the edge"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Every step emits [`tracing`] events (`info` for progress, `debug` for URLs,
//! paths and entries, `warn` for swallowed failures). The library never installs
//! a subscriber.

pub mod cli;
pub mod config;
pub mod core;
pub mod http;
pub mod provider;
pub mod release;
pub mod updater;
pub mod upgrade;
pub mod version;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use crate::core::{PipelineError, UpdateError};
pub use provider::{Provider, ReleaseProvider};
pub use release::{Asset, Release};
pub use updater::{UpdateConf, check_updates, update};
pub use upgrade::{UpdateOutcome, UpdatePipeline};
