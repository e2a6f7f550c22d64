//! SemVer 2.0.0 parsing, ordering, and display (spec §3, §4.1).
//!
//! Wraps [`semver::Version`] rather than reimplementing precedence rules:
//! the `semver` crate already ignores build metadata for `Ord` while
//! including it in `Eq`/`Display`, already rejects leading zeros and
//! fullwidth digits in numeric identifiers, and already orders pre-release
//! identifiers per SemVer §11 (numeric < alphanumeric, longer tuple wins on
//! a common prefix). This module adds exactly what spec §4.1 names beyond
//! that: a `v`-tolerant parse and the three derived queries
//! (`discarding_build_metadata`, `has_same_numeric_components`,
//! `is_prerelease`).

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize, de::Error as _};

/// A parsed, ordered `MAJOR.MINOR.PATCH[-prerelease][+build]` version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion(Version);

// `semver::Version` only implements `serde::{Serialize, Deserialize}` behind
// its own `serde` feature; rather than pull that in, round-trip through the
// canonical string form this module already produces via `Display`/`parse`.
impl Serialize for SemanticVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SemanticVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(D::Error::custom)
    }
}

/// Strips a single leading `v`/`V` before delegating to `semver`'s parser,
/// so that prerelease identifiers like `1.0.0-dev.1` are never mistaken for
/// a `v` prefix.
static LEADING_V: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[vV]").unwrap());

impl SemanticVersion {
    /// Parse a version string, tolerating one leading `v`/`V`.
    ///
    /// Rejects anything `semver::Version::parse` rejects: missing
    /// components, a fourth numeric component, leading zeros in numeric
    /// identifiers, empty prerelease/build segments, fullwidth digits, and
    /// trailing garbage that isn't a valid `-prerelease`/`+build` suffix.
    pub fn parse(input: &str) -> Result<Self, semver::Error> {
        let stripped = LEADING_V.replace(input, "");
        Version::parse(&stripped).map(Self)
    }

    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    #[must_use]
    pub fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub fn patch(&self) -> u64 {
        self.0.patch
    }

    /// `true` iff this version carries any pre-release identifiers.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }

    /// The same version with build metadata cleared. Used by the
    /// `VersionSpecifier` intersection table (spec §4.2) wherever a
    /// requirement is combined with `Any`, which is defined to discard
    /// build metadata from the surviving bound.
    #[must_use]
    pub fn discarding_build_metadata(&self) -> Self {
        let mut v = self.0.clone();
        v.build = semver::BuildMetadata::EMPTY;
        Self(v)
    }

    /// `true` iff `major`, `minor`, and `patch` match, ignoring pre-release
    /// and build metadata entirely.
    #[must_use]
    pub fn has_same_numeric_components(&self, other: &Self) -> bool {
        self.0.major == other.0.major && self.0.minor == other.0.minor && self.0.patch == other.0.patch
    }

    #[must_use]
    pub fn as_semver(&self) -> &Version {
        &self.0
    }
}

/// Ordering ignores build metadata and follows SemVer precedence
/// (`semver::Version`'s own `Ord` impl already does exactly this).
impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SemanticVersion {
    type Err = semver::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
