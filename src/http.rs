//! HTTP client construction.

use crate::core::{Result, UpdateError};

/// `User-Agent` sent with every request. The GitHub API rejects requests without one.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the client used when the caller does not supply one.
///
/// Deadlines are set per request by the providers and the downloader, so the
/// client itself has no global timeout.
///
/// # Errors
///
/// Returns [`UpdateError::Network`] if the TLS backend cannot be initialised.
pub fn default_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| UpdateError::network("client setup", e))
}
