use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

use crate::core::{Result, UpdateError};

/// Verifies a downloaded release package against the release checksum manifest.
///
/// The manifest is the `checksums.txt` file published with the release, one
/// `"<sha256-hex> <file name>"` pair per line, as produced by most release
/// tooling (`sha256sum`, GoReleaser, cargo-dist).
///
/// # Security Benefits
///
/// - **Download Integrity**: Detects corrupted or truncated downloads
/// - **Tamper Detection**: Identifies packages that differ from what the release lists
///
/// Authenticity is out of reach: anyone able to replace the package on the
/// release host can replace the manifest too.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the SHA-256 checksum of a file as lowercase hex.
    ///
    /// The file is streamed, never loaded whole into memory.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use caravel::upgrade::verification::ChecksumVerifier;
    /// use std::path::Path;
    ///
    /// # async fn example() -> caravel::core::Result<()> {
    /// let checksum = ChecksumVerifier::compute_sha256(Path::new("/path/to/app.tar.gz")).await?;
    /// println!("SHA256: {}", checksum);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the file cannot be read.
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {}", file_path.display());

        let mut file = fs::File::open(file_path)
            .await
            .map_err(|e| UpdateError::io("open file for checksum", file_path, e))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0_u8; 64 * 1024];
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| UpdateError::io("read file for checksum", file_path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hex::encode(hasher.finalize()))
    }

    /// Find the digest listed for `file_name` in manifest `content`.
    ///
    /// A line whose name column equals `file_name` (ignoring a leading `*` or
    /// `./`) wins. Otherwise the first line that merely contains `file_name` is
    /// used. Returns `None` if no line mentions the file.
    #[must_use]
    pub fn expected_checksum(content: &str, file_name: &str) -> Option<String> {
        if file_name.is_empty() {
            return None;
        }

        let exact = content.lines().find_map(|line| {
            let mut columns = line.split_whitespace();
            let digest = columns.next()?;
            let name = columns.next()?.trim_start_matches('*').trim_start_matches("./");
            (name == file_name).then(|| digest.to_string())
        });

        exact.or_else(|| {
            content
                .lines()
                .find(|line| line.contains(file_name))
                .and_then(|line| line.split_whitespace().next())
                .map(str::to_string)
        })
    }

    /// Verify `file_path` against the digest listed for its base name in `manifest_path`.
    ///
    /// Digests are compared case-insensitively. A file missing from the manifest
    /// is compared against an empty digest and therefore fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use caravel::upgrade::verification::ChecksumVerifier;
    /// use std::path::Path;
    ///
    /// # async fn example() -> caravel::core::Result<()> {
    /// ChecksumVerifier::verify(
    ///     Path::new("/tmp/staging/app_linux_amd64.tar.gz"),
    ///     Path::new("/tmp/staging/checksums.txt"),
    /// )
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// - [`UpdateError::ManifestRead`] if the manifest cannot be read
    /// - [`UpdateError::ChecksumMismatch`] if the digests differ
    /// - [`UpdateError::Io`] if the file cannot be read
    pub async fn verify(file_path: &Path, manifest_path: &Path) -> Result<()> {
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Verifying checksum for: {}", file_name);

        let manifest = fs::read_to_string(manifest_path).await.map_err(|source| {
            UpdateError::ManifestRead {
                path: manifest_path.to_path_buf(),
                source,
            }
        })?;

        let expected = Self::expected_checksum(&manifest, &file_name).unwrap_or_else(|| {
            warn!("No checksum listed for {} in {}", file_name, manifest_path.display());
            String::new()
        });
        let actual = Self::compute_sha256(file_path).await?;

        if !actual.eq_ignore_ascii_case(&expected) {
            return Err(UpdateError::ChecksumMismatch {
                file: file_name,
                expected,
                actual,
            });
        }

        info!("Checksum verification successful");
        Ok(())
    }
}
