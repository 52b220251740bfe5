//! Self-update pipeline.
//!
//! This module resolves the newest release of the running program, fetches its
//! package for the current operating system, checks it against the release's
//! checksum manifest and copies the payload over the files beside the running
//! executable.
//!
//! # Update Process Flow
//!
//! ```text
//! CHECK ──► DOWNLOAD ──► EXTRACT ──► VERIFY ──► INSTALL ──► CLEANUP ──► DONE
//!   │          │            │           │          │
//!   │          └────────────┴───────────┴──────────┴──► CLEANUP ──► FAILED(step, cause)
//!   └──► no newer release ──► already on the edge
//! ```
//!
//! 1. **Check** ([`resolver::find_update`]): today's cached release or a fresh
//!    provider query, compared with the running version
//! 2. **Download** ([`download::download_assets`]): the OS-specific package and
//!    `checksums.txt`, streamed into a private staging directory
//! 3. **Extract** ([`extract::extract`]): zip or tar+gzip, rejecting entries that
//!    would escape the staging directory
//! 4. **Verify** ([`ChecksumVerifier`]): SHA-256 of the package against the manifest
//! 5. **Install** ([`install::install`]): every extracted file copied beside the
//!    executable, archives and manifest excluded
//! 6. **Cleanup**: the staging directory is removed
//!
//! # Failure Semantics
//!
//! There is no rollback. A failure in the install step can leave some files
//! replaced and others not. Nothing is retried.

/// Configuration structures for update behavior.
///
/// Defines the `[upgrade]` configuration table: cache bypass, download
/// deadline and installation directory override.
pub mod config;
/// Release package and checksum manifest download.
pub mod download;
/// Zip and tar+gzip extraction with path traversal checks.
pub mod extract;
/// Payload installation and installation directory lookup.
pub mod install;
/// The end-to-end update pipeline.
pub mod pipeline;
/// Newer-release detection with the daily cache.
pub mod resolver;
/// Download verification and integrity checking.
///
/// Provides checksum verification of downloaded release packages against the
/// release's `checksums.txt`.
pub mod verification;

pub use config::UpgradeConfig;
pub use download::{CHECKSUM_ASSET, DownloadedAssets, current_os};
pub use pipeline::{PipelineStep, UpdateOutcome, UpdatePipeline};
pub use resolver::find_update;
pub use verification::ChecksumVerifier;
