//! Error handling for caravel
//!
//! This module provides the error types used across the update pipeline and the
//! user-friendly error reporting used by the command-line front end. The error
//! system is designed around two principles:
//! 1. **Strongly-typed errors** so callers can tell a checksum mismatch from a
//!    network failure without string matching
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`UpdateError`] - One variant per failure category of the pipeline
//! - [`PipelineError`] - An [`UpdateError`] tagged with the pipeline step that raised it
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! # Error Categories
//!
//! - **Provider**: [`UpdateError::Validation`], [`UpdateError::Network`],
//!   [`UpdateError::HttpStatus`], [`UpdateError::Parse`]
//! - **Versions**: [`UpdateError::InvalidVersionFormat`]
//! - **Cache**: [`UpdateError::CacheMiss`] (control flow, never surfaced by the resolver)
//! - **Assets**: [`UpdateError::NoCompatibleAsset`], [`UpdateError::ChecksumAssetMissing`]
//! - **Archives**: [`UpdateError::UnsupportedFormat`], [`UpdateError::PathTraversal`],
//!   [`UpdateError::UnsupportedEntry`], [`UpdateError::StagedFileOverwrite`],
//!   [`UpdateError::Archive`]
//! - **Integrity**: [`UpdateError::ManifestRead`], [`UpdateError::ChecksumMismatch`]
//! - **File system**: [`UpdateError::Io`], [`UpdateError::ProcessPath`]
//!
//! None of these errors is retried anywhere in the crate. They propagate to the
//! caller of the pipeline, which decides whether to re-run the whole update.
//!
//! # Examples
//!
//! ```rust,no_run
//! use caravel::core::{UpdateError, user_friendly_error};
//!
//! let error = UpdateError::NoCompatibleAsset { os: "linux".to_string() };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::upgrade::PipelineStep;

/// The main error type for update operations.
///
/// Each variant maps to one failure category of the release resolution and
/// self-update pipeline. Variants carry the data needed to explain the failure
/// (URLs, paths, expected and actual digests) rather than preformatted strings.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The provider configuration is incomplete or inconsistent.
    ///
    /// Raised before any network call is attempted.
    #[error("Invalid configuration: {reason}")]
    Validation {
        /// What is wrong with the configuration (e.g., "host is required")
        reason: String,
    },

    /// The HTTP exchange itself failed (DNS, TLS, connection reset, deadline).
    #[error("Network error during {operation}: {source}")]
    Network {
        /// The operation being performed (e.g., "release listing", "asset download")
        operation: String,
        /// The underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than `200 OK`.
    #[error("{service} integration error: HTTP {status} from {url}")]
    HttpStatus {
        /// Which service answered ("github", "gitlab", "download")
        service: String,
        /// Requested URL
        url: String,
        /// Status code returned by the server
        status: u16,
    },

    /// A JSON document could not be decoded.
    #[error("Failed to parse {what}: {source}")]
    Parse {
        /// What was being decoded (e.g., "github release listing")
        what: String,
        /// The underlying decoder error
        #[source]
        source: serde_json::Error,
    },

    /// A version string does not follow `v?MAJOR.MINOR.PATCH(-PRERELEASE)?`.
    #[error("Invalid version format: '{version}'")]
    InvalidVersionFormat {
        /// The offending version string
        version: String,
    },

    /// No usable cached release exists for today.
    ///
    /// This is a control-flow signal for the resolver, not a failure.
    #[error("No cached release at {}", .path.display())]
    CacheMiss {
        /// Path of today's cache file
        path: PathBuf,
    },

    /// None of the release assets targets the running operating system.
    #[error("There is no version compatible with {os}")]
    NoCompatibleAsset {
        /// Operating system identifier that was searched for
        os: String,
    },

    /// The release does not publish a checksum manifest.
    #[error("File {name} not found in release assets")]
    ChecksumAssetMissing {
        /// Expected asset name
        name: String,
    },

    /// The downloaded package is neither a zip nor a gzip-compressed tarball.
    #[error("{extension} not supported for decompression")]
    UnsupportedFormat {
        /// The extension of the rejected file
        extension: String,
    },

    /// An archive entry would be written outside the extraction directory.
    ///
    /// The whole archive is rejected, not just the entry.
    #[error("Archive entry '{entry}' escapes the extraction directory")]
    PathTraversal {
        /// Name of the offending entry (or the destination directory)
        entry: String,
    },

    /// An archive entry is neither a regular file nor a directory.
    #[error("Archive entry '{entry}' has unsupported type {kind}")]
    UnsupportedEntry {
        /// Name of the entry
        entry: String,
        /// Human-readable entry type (e.g., "symlink")
        kind: String,
    },

    /// An archive entry would replace a file that was already staged, such as
    /// the package itself or the checksum manifest.
    #[error("Archive entry '{entry}' would overwrite staged file {}", .path.display())]
    StagedFileOverwrite {
        /// Name of the offending entry
        entry: String,
        /// The staged file it targets
        path: PathBuf,
    },

    /// The zip container itself is malformed.
    #[error("Failed to read archive {}: {source}", .path.display())]
    Archive {
        /// Path of the archive
        path: PathBuf,
        /// The underlying zip error
        #[source]
        source: zip::result::ZipError,
    },

    /// The checksum manifest could not be read.
    #[error("Failed to read checksum manifest {}: {source}", .path.display())]
    ManifestRead {
        /// Path of the manifest
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The digest of the downloaded package does not match the manifest.
    #[error("Checksum failed for {file}: expected '{expected}', got '{actual}'")]
    ChecksumMismatch {
        /// Base name of the verified file
        file: String,
        /// Digest found in the manifest (empty if the file was not listed)
        expected: String,
        /// Digest computed locally
        actual: String,
    },

    /// The path of the running executable could not be determined.
    #[error("Error getting running process: {reason}")]
    ProcessPath {
        /// Why the lookup failed
        reason: String,
    },

    /// A file system operation failed.
    #[error("File system error during {operation} on {}: {source}", .path.display())]
    Io {
        /// The operation being performed (e.g., "create staging file")
        operation: String,
        /// The path involved
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A value could not be encoded as JSON.
    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        /// What was being encoded
        what: String,
        /// The underlying encoder error
        #[source]
        source: serde_json::Error,
    },

    /// A blocking worker task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl UpdateError {
    pub(crate) fn io(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn network(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Returns `true` for the cache-miss control signal.
    #[must_use]
    pub const fn is_cache_miss(&self) -> bool {
        matches!(self, Self::CacheMiss { .. })
    }
}

/// An [`UpdateError`] tagged with the pipeline step that raised it.
///
/// This is what callers of [`UpdatePipeline::run`](crate::upgrade::UpdatePipeline::run)
/// receive on failure: enough context to log "which step" and "why" before
/// exiting non-zero.
#[derive(Error, Debug)]
#[error("Update failed during {step}")]
pub struct PipelineError {
    /// The step that failed
    pub step: PipelineStep,
    /// The underlying cause
    #[source]
    pub source: UpdateError,
}

impl PipelineError {
    /// Tag an error with the step it occurred in.
    #[must_use]
    pub const fn new(step: PipelineStep, source: UpdateError) -> Self {
        Self {
            step,
            source,
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// `ErrorContext` holds the rendered error message and adds optional details and
/// suggestions for resolution. This is how the `caravel` binary presents errors.
///
/// # Display Format
///
/// 1. **Error**: The main error message in red
/// 2. **Details**: Additional context in yellow (optional)
/// 3. **Suggestion**: Actionable steps in green (optional)
#[derive(Debug)]
pub struct ErrorContext {
    /// The rendered error message, including its cause chain
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`PipelineError`] and [`UpdateError`] anywhere in the error chain
/// and attaches a suggestion tailored to the failure. Other errors are rendered
/// with their full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = render_chain(&error);

    let update_error = error.chain().find_map(|cause| {
        cause
            .downcast_ref::<PipelineError>()
            .map(|pipeline| &pipeline.source)
            .or_else(|| cause.downcast_ref::<UpdateError>())
    });

    match update_error {
        Some(update_error) => create_error_context(message, update_error),
        None => {
            if error.chain().any(|cause| cause.downcast_ref::<toml::de::Error>().is_some()) {
                return ErrorContext::new(message)
                    .with_suggestion("Check the TOML syntax of your caravel configuration file")
                    .with_details("Expected a [provider] table and an optional [upgrade] table");
            }
            ErrorContext::new(message)
        }
    }
}

fn render_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

fn create_error_context(message: String, error: &UpdateError) -> ErrorContext {
    let context = ErrorContext::new(message);
    match error {
        UpdateError::Validation {
            ..
        } => context
            .with_suggestion("Set --host and --project (or the [provider] table) for your release host")
            .with_details("Provider settings are validated before any request is sent"),
        UpdateError::Network {
            ..
        } => context
            .with_suggestion("Check your network connection and retry; no automatic retry is performed"),
        UpdateError::HttpStatus {
            status,
            ..
        } if *status == 404 => context
            .with_suggestion("Verify the project path; GitLab expects 'group/project', GitHub 'owner/repo'"),
        UpdateError::HttpStatus {
            status,
            ..
        } if *status == 403 || *status == 429 => context
            .with_suggestion("The API rate limit may be exhausted; wait and try again")
            .with_details("Unauthenticated GitHub API calls are limited per IP address"),
        UpdateError::InvalidVersionFormat {
            ..
        } => context
            .with_suggestion("Use tags of the form v1.2.3 or v1.2.3-beta.1")
            .with_details("Releases whose tag is not a version cannot be compared"),
        UpdateError::NoCompatibleAsset {
            os,
        } => context.with_suggestion(format!(
            "Publish an asset whose name contains '{os}' in the release"
        )),
        UpdateError::ChecksumAssetMissing {
            ..
        } => context
            .with_suggestion("Publish a checksums.txt asset alongside the release packages"),
        UpdateError::PathTraversal {
            ..
        }
        | UpdateError::UnsupportedEntry {
            ..
        }
        | UpdateError::StagedFileOverwrite {
            ..
        } => context
            .with_details("The archive was rejected as a whole and nothing from it was installed"),
        UpdateError::ChecksumMismatch {
            ..
        } => context
            .with_suggestion("Retry the update; if the mismatch persists the release may be corrupted")
            .with_details("The downloaded package was not installed"),
        UpdateError::Io {
            source,
            ..
        } if source.kind() == std::io::ErrorKind::PermissionDenied => context
            .with_suggestion("Run with permissions that allow writing beside the executable"),
        _ => context,
    }
}
