//! Core types for caravel
//!
//! This module holds the error taxonomy shared by every stage of the update
//! pipeline, together with the helpers the command-line front end uses to turn
//! those errors into readable, actionable messages.
//!
//! # Error Management
//!
//! - **Strongly-typed errors** ([`UpdateError`]) for precise handling in code
//! - **Step-tagged failures** ([`PipelineError`]) so callers know where an update stopped
//! - **User-friendly contexts** ([`ErrorContext`]) with suggestions for CLI users
//!
//! # Examples
//!
//! ```rust,no_run
//! use caravel::core::{UpdateError, user_friendly_error};
//!
//! fn check() -> anyhow::Result<()> {
//!     Err(UpdateError::ChecksumAssetMissing { name: "checksums.txt".to_string() }.into())
//! }
//!
//! if let Err(e) = check() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, PipelineError, UpdateError, user_friendly_error};

/// Result alias used by the library API.
pub type Result<T, E = UpdateError> = std::result::Result<T, E>;
