//! Configuration for the `caravel` command-line front end.
//!
//! The library itself takes explicit values ([`ProviderConfig`](crate::provider::ProviderConfig),
//! [`UpgradeConfig`]); this module reads them from a TOML file so the command
//! line only has to override what differs.

mod global;

pub use global::{Config, ProviderKind, ProviderSettings};

pub use crate::upgrade::config::UpgradeConfig;
