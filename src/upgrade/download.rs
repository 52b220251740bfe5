//! Download the release package and its checksum manifest.
//!
//! The package is the first asset whose lowercased name contains the running
//! operating system identifier (`linux`, `darwin` or `windows`). The manifest is
//! the asset named exactly [`CHECKSUM_ASSET`]. Both are streamed into the
//! staging directory under their published names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::{Result, UpdateError};
use crate::release::{Asset, Release};

/// Name of the checksum manifest asset.
pub const CHECKSUM_ASSET: &str = "checksums.txt";

/// Default deadline for each asset download.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Files written to the staging directory by [`download_assets`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAssets {
    /// The release package (archive)
    pub package: PathBuf,
    /// The checksum manifest
    pub manifest: PathBuf,
}

/// Operating system identifier as it appears in release asset names.
///
/// Rust reports macOS as `macos`; release tooling names it `darwin`.
#[must_use]
pub fn current_os() -> &'static str {
    os_identifier(std::env::consts::OS)
}

fn os_identifier(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Pick the package for `os` and the checksum manifest from `release`.
///
/// # Errors
///
/// - [`UpdateError::NoCompatibleAsset`] if no asset name contains `os`
/// - [`UpdateError::ChecksumAssetMissing`] if there is no [`CHECKSUM_ASSET`]
pub fn select_assets<'a>(release: &'a Release, os: &str) -> Result<(&'a Asset, &'a Asset)> {
    let os = os.to_lowercase();
    let package = release.asset_containing(&os).ok_or_else(|| UpdateError::NoCompatibleAsset {
        os: os.clone(),
    })?;
    let manifest =
        release.asset_named(CHECKSUM_ASSET).ok_or_else(|| UpdateError::ChecksumAssetMissing {
            name: CHECKSUM_ASSET.to_string(),
        })?;
    Ok((package, manifest))
}

/// Download the package for the running OS and the checksum manifest.
///
/// # Errors
///
/// Fails with the asset selection errors of [`select_assets`], or with the
/// errors of [`download_file`] for either file.
pub async fn download_assets(
    client: &reqwest::Client,
    release: &Release,
    staging_dir: &Path,
    timeout: Duration,
) -> Result<DownloadedAssets> {
    download_assets_for(client, release, staging_dir, timeout, current_os()).await
}

/// [`download_assets`] for an explicit operating system identifier.
///
/// # Errors
///
/// Same as [`download_assets`].
pub async fn download_assets_for(
    client: &reqwest::Client,
    release: &Release,
    staging_dir: &Path,
    timeout: Duration,
    os: &str,
) -> Result<DownloadedAssets> {
    let (package_asset, manifest_asset) = select_assets(release, os)?;

    info!("Downloading update package");
    let package = staging_dir.join(staged_name(package_asset)?);
    download_file(client, &package_asset.url, &package, timeout).await?;

    info!("Downloading checksum file");
    let manifest = staging_dir.join(staged_name(manifest_asset)?);
    download_file(client, &manifest_asset.url, &manifest, timeout).await?;

    Ok(DownloadedAssets {
        package,
        manifest,
    })
}

/// Asset names come from the remote API and must be a single path component.
fn staged_name(asset: &Asset) -> Result<&str> {
    let name = asset.name.as_str();
    let is_plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if !is_plain || name.contains("..") {
        return Err(UpdateError::PathTraversal {
            entry: name.to_string(),
        });
    }
    Ok(name)
}

/// Stream `url` into `dest`.
///
/// The whole exchange, body included, must complete within `timeout`. A
/// partially written file is removed before the error is returned.
///
/// # Errors
///
/// - [`UpdateError::Network`] if the request or the body stream fails
/// - [`UpdateError::HttpStatus`] for any status other than `200`
/// - [`UpdateError::Io`] if the destination cannot be written
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    timeout: Duration,
) -> Result<()> {
    debug!("Downloading {} to {}", url, dest.display());

    let mut response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| UpdateError::network("asset download", e))?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(UpdateError::HttpStatus {
            service: "download".to_string(),
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file =
        fs::File::create(dest).await.map_err(|e| UpdateError::io("create download file", dest, e))?;

    let result = async {
        let mut written: u64 = 0;
        while let Some(chunk) =
            response.chunk().await.map_err(|e| UpdateError::network("asset download", e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| UpdateError::io("write download file", dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| UpdateError::io("flush download file", dest, e))?;
        Ok::<u64, UpdateError>(written)
    }
    .await;

    match result {
        Ok(written) => {
            debug!("Downloaded {} bytes to {}", written, dest.display());
            Ok(())
        }
        Err(e) => {
            drop(file);
            if let Err(remove_err) = fs::remove_file(dest).await {
                warn!("Failed to remove partial download {}: {}", dest.display(), remove_err);
            }
            Err(e)
        }
    }
}
