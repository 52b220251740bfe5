//! Decide whether a newer release exists.

use tracing::{debug, info, warn};

use crate::core::Result;
use crate::provider::ReleaseProvider;
use crate::release::Release;
use crate::version::{ParsedVersion, VersionComparator};

/// Find a release newer than `current_version`.
///
/// With `ignore_cache` the provider is always queried and the cache is neither
/// read nor written. Otherwise today's cached release is used when present; on
/// a miss the provider is queried and the result cached on a best-effort basis.
///
/// Returns `Ok(None)` when the latest release is not newer than the current
/// version, or when the project has no releases at all.
///
/// # Errors
///
/// Propagates provider failures, and returns
/// [`UpdateError::InvalidVersionFormat`](crate::core::UpdateError::InvalidVersionFormat)
/// if `current_version` or the resolved tag is not a version.
pub async fn find_update<P>(
    client: &reqwest::Client,
    provider: &P,
    current_version: &str,
    ignore_cache: bool,
) -> Result<Option<Release>>
where
    P: ReleaseProvider + ?Sized,
{
    info!("Checking for the latest version");

    let latest = if ignore_cache {
        provider.fetch_last_release(client).await?
    } else {
        resolve_with_cache(client, provider).await?
    };

    let Some(latest) = latest else {
        debug!("{} reported no releases", provider.name());
        return Ok(None);
    };

    if VersionComparator::is_newer(&latest.name, current_version)? {
        info!("Found the version {}", latest.name);
        Ok(Some(latest))
    } else {
        debug!("{} is not newer than {}", latest.name, current_version);
        Ok(None)
    }
}

async fn resolve_with_cache<P>(client: &reqwest::Client, provider: &P) -> Result<Option<Release>>
where
    P: ReleaseProvider + ?Sized,
{
    match provider.restore_cache_release().await {
        Ok(release) if ParsedVersion::parse(&release.name).is_ok() => {
            debug!("Using cached release {}", release.name);
            return Ok(Some(release));
        }
        Ok(release) => {
            warn!("Ignoring cached release with invalid version '{}'", release.name);
        }
        Err(e) if e.is_cache_miss() => {}
        Err(e) => return Err(e),
    }

    let latest = provider.fetch_last_release(client).await?;
    if let Some(release) = &latest
        && let Err(e) = provider.cache_release(release).await
    {
        warn!("Failed to cache release {}: {}", release.name, e);
    }

    Ok(latest)
}
