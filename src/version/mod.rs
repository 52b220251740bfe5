//! Version comparison for release tags.
//!
//! Release names published by the supported hosts follow the grammar
//! `v?MAJOR.MINOR.PATCH(-PRERELEASE)?`, where the three numeric parts are
//! non-negative integers and the prerelease is an opaque token made of word
//! characters and dots. The hyphen before the prerelease is optional, so
//! `v1.2.3rc1` is accepted, and the prerelease is compared as one string
//! rather than as SemVer dot-separated identifiers.
//!
//! # Ordering Rules
//!
//! 1. Major, minor and patch are compared numerically, in that order
//! 2. A version **without** a prerelease is greater than one **with** a prerelease
//! 3. Two prereleases are compared byte-lexicographically
//!
//! # Examples
//!
//! ```rust
//! use caravel::version::VersionComparator;
//! use std::cmp::Ordering;
//!
//! # fn example() -> caravel::core::Result<()> {
//! assert_eq!(VersionComparator::compare("v0.1.0-alpha", "v0.1.0")?, Ordering::Less);
//! assert_eq!(VersionComparator::compare("v1.0.0", "v0.9.9")?, Ordering::Greater);
//! assert_eq!(VersionComparator::compare("0.1.0-beta.1", "v0.1.0-beta.1")?, Ordering::Equal);
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{Result, UpdateError};

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)-?([\w.]+)?$").ok());

/// A release tag decomposed into its comparable parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Optional prerelease token (without the leading hyphen)
    pub prerelease: Option<String>,
}

impl ParsedVersion {
    /// Parse a release tag.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidVersionFormat`] if the tag does not match the
    /// version grammar, or if a numeric component does not fit in a `u64`.
    pub fn parse(version: &str) -> Result<Self> {
        let invalid = || UpdateError::InvalidVersionFormat {
            version: version.to_string(),
        };

        let captures = VERSION_PATTERN
            .as_ref()
            .and_then(|pattern| pattern.captures(version))
            .ok_or_else(invalid)?;
        let number = |index: usize| -> Result<u64> {
            captures
                .get(index)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .ok_or_else(invalid)
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            prerelease: captures.get(4).map(|m| m.as_str().to_string()),
        })
    }
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.as_bytes().cmp(b.as_bytes()),
            })
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Stateless comparator for release tags.
pub struct VersionComparator;

impl VersionComparator {
    /// Compare two release tags.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidVersionFormat`] naming the first input that
    /// does not match the version grammar. No fallback ordering is attempted.
    pub fn compare(a: &str, b: &str) -> Result<Ordering> {
        let left = ParsedVersion::parse(a)?;
        let right = ParsedVersion::parse(b)?;
        Ok(left.cmp(&right))
    }

    /// Returns `true` if `candidate` is strictly newer than `current`.
    ///
    /// # Errors
    ///
    /// Same as [`VersionComparator::compare`].
    pub fn is_newer(candidate: &str, current: &str) -> Result<bool> {
        Ok(Self::compare(candidate, current)? == Ordering::Greater)
    }
}
