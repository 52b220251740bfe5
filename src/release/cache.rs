//! Day-keyed persistence of the last resolved release.
//!
//! One JSON file per UTC calendar day, named `release_YYYY-MM-DD.json`. A new day
//! implicitly invalidates older files: they are never looked up again and never
//! deleted. Concurrent writers are not coordinated; the last writer wins.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tokio::fs;
use tracing::debug;

use super::Release;
use crate::core::{Result, UpdateError};

/// Location of the daily release cache.
#[derive(Debug, Clone)]
pub struct ReleaseCache {
    dir: PathBuf,
}

impl Default for ReleaseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseCache {
    /// Cache stored in the system temporary directory.
    #[must_use]
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    /// Cache stored in a specific directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
        }
    }

    /// Directory holding the cache files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a given calendar day.
    #[must_use]
    pub fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(format!("release_{}.json", day.format("%Y-%m-%d")))
    }

    /// Cache file for the current UTC day.
    #[must_use]
    pub fn path_for_today(&self) -> PathBuf {
        self.path_for(Utc::now().date_naive())
    }

    /// Write `release` to today's cache file, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Io`] if the file cannot be written.
    pub async fn cache_release(&self, release: &Release) -> Result<()> {
        let path = self.path_for_today();
        let content = serde_json::to_vec(release).map_err(|source| UpdateError::Serialization {
            what: "cached release".to_string(),
            source,
        })?;

        fs::write(&path, content)
            .await
            .map_err(|e| UpdateError::io("write release cache", &path, e))?;

        debug!("Cached release {} at {}", release.name, path.display());
        Ok(())
    }

    /// Read today's cached release.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::CacheMiss`] when today's file is absent, unreadable
    /// or does not decode. A corrupt file is a miss, never a hard failure.
    pub async fn restore_cache_release(&self) -> Result<Release> {
        let path = self.path_for_today();

        let content = match fs::read(&path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No release cache at {}: {}", path.display(), e);
                return Err(UpdateError::CacheMiss {
                    path,
                });
            }
        };

        match serde_json::from_slice::<Release>(&content) {
            Ok(release) => {
                debug!("Restored release {} from {}", release.name, path.display());
                Ok(release)
            }
            Err(e) => {
                debug!("Ignoring unreadable release cache {}: {}", path.display(), e);
                Err(UpdateError::CacheMiss {
                    path,
                })
            }
        }
    }
}
