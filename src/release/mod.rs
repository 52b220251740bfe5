//! Provider-agnostic release model.
//!
//! Every hosting provider converts its own JSON shape into a [`Release`], so the
//! resolver, downloader and cache never see GitHub or GitLab specifics.
//!
//! The serialized form is also the on-disk cache format:
//!
//! ```json
//! {
//!   "name": "v1.2.3",
//!   "description": "Bug fixes",
//!   "releasedAt": "2024-05-01T12:00:00Z",
//!   "assets": [
//!     { "name": "app_linux_amd64.tar.gz", "url": "https://example.com/app_linux_amd64.tar.gz" },
//!     { "name": "checksums.txt", "url": "https://example.com/checksums.txt" }
//!   ]
//! }
//! ```

pub mod cache;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::version::VersionComparator;

pub use cache::ReleaseCache;

/// A downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// File name as published (e.g., `app_linux_amd64.tar.gz`)
    pub name: String,
    /// Direct download URL
    pub url: String,
}

impl Asset {
    /// Create an asset from its name and download URL.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A published release, independent of the hosting provider.
///
/// `name` is the version tag. Assets keep the order the provider returned them in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    /// Version tag (e.g., `v1.2.3` or `v1.2.3-beta.1`)
    pub name: String,
    /// Release notes
    #[serde(default)]
    pub description: String,
    /// Publication time, when the provider reports one
    #[serde(default)]
    pub released_at: Option<DateTime<Utc>>,
    /// Attached files
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Compare two releases by version tag.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidVersionFormat`](crate::core::UpdateError::InvalidVersionFormat)
    /// if either name is not a version tag.
    pub fn compare_to(&self, other: &Self) -> Result<Ordering> {
        VersionComparator::compare(&self.name, &other.name)
    }

    /// Find an asset by exact name.
    #[must_use]
    pub fn asset_named(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// Find the first asset whose lowercased name contains `needle`.
    ///
    /// `needle` is expected to be lowercase already.
    #[must_use]
    pub fn asset_containing(&self, needle: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name.to_lowercase().contains(needle))
    }
}

/// Pick the greatest release by version tag.
///
/// The first release wins a tie: a candidate only replaces the current pick
/// when it compares strictly greater. Returns `Ok(None)` for an empty list.
///
/// # Errors
///
/// Fails on the first release whose name is not a version tag.
pub fn select_latest(releases: Vec<Release>) -> Result<Option<Release>> {
    let mut latest: Option<Release> = None;

    for candidate in releases {
        latest = match latest {
            None => Some(candidate),
            Some(current) => {
                if current.compare_to(&candidate)? == Ordering::Less {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }

    Ok(latest)
}
