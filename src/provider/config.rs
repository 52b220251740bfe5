//! Connection settings shared by every release provider.

use std::time::Duration;

use crate::core::{Result, UpdateError};

/// Default deadline for the release listing request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity of a project on a release host.
///
/// The port is optional: when unset it is derived from `ssl` (443 or 80).
/// An explicit port is kept even if it disagrees with `ssl`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Host name (e.g., `api.github.com` or `gitlab.com`)
    pub host: String,
    /// TCP port, derived from `ssl` when `None`
    pub port: Option<u16>,
    /// Use `https` instead of `http`
    pub ssl: bool,
    /// Hosting-specific project identifier (`owner/repo` or `group/project`)
    pub project_path: String,
    /// Deadline for the release listing request
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: None,
            ssl: true,
            project_path: String::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ProviderConfig {
    /// Settings for `project_path` on `host` over HTTPS with default port and timeout.
    pub fn new(host: impl Into<String>, project_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            project_path: project_path.into(),
            ..Default::default()
        }
    }

    /// Override the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enable or disable TLS.
    #[must_use]
    pub fn with_ssl(mut self, ssl: bool) -> Self {
        self.ssl = ssl;
        self
    }

    /// Override the listing request deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Copy of these settings with the port filled in from `ssl` when unset
    /// and a zero timeout replaced by [`DEFAULT_REQUEST_TIMEOUT`].
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut config = self.clone();
        config.port = Some(self.effective_port());
        if config.timeout.is_zero() {
            config.timeout = DEFAULT_REQUEST_TIMEOUT;
        }
        config
    }

    /// The port requests go to.
    #[must_use]
    pub fn effective_port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.ssl => 443,
            None => 80,
        }
    }

    /// URL scheme implied by `ssl`.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.ssl { "https" } else { "http" }
    }

    /// `{scheme}://{host}:{port}` without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.host, self.effective_port())
    }

    /// Check that the settings can produce a request.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Validation`] when the host or project path is
    /// empty, or the port is explicitly set to zero.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(UpdateError::validation("host is required"));
        }
        if self.effective_port() == 0 {
            return Err(UpdateError::validation("port must be > 0"));
        }
        if self.project_path.trim().is_empty() {
            return Err(UpdateError::validation("project path is required"));
        }
        Ok(())
    }
}
