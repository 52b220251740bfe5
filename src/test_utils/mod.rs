//! Test utilities for caravel
//!
//! Shared by the unit tests and, through the `test-utils` feature, by the
//! integration tests under `tests/`.
//!
//! # Example
//!
//! ```rust,no_run
//! use caravel::test_utils::fixtures::{ArchiveEntry, write_tar_gz};
//! use std::path::Path;
//!
//! caravel::test_utils::init_test_logging(None);
//! write_tar_gz(
//!     Path::new("/tmp/app_linux_amd64.tar.gz"),
//!     &[ArchiveEntry::file("app", b"#!/bin/sh\n", 0o755)],
//! );
//! ```

pub mod fixtures;

pub use fixtures::{ArchiveEntry, checksum_manifest, sha256_hex, write_tar_gz, write_zip};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Installs a test-writer subscriber once per process. Uses `level` when given,
/// otherwise `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=caravel=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
