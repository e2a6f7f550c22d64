//! An immutable commit-ish reference with a lazily derived semantic form
//! (spec §3, §4 "PinnedVersion").

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::semantic_version::SemanticVersion;

/// A tag or commit SHA identifying one point in a dependency's history.
///
/// Equality is by commit-ish string only. [`PinnedVersion::semantic_version`]
/// parses the commit-ish as a [`SemanticVersion`] (tolerating a leading
/// `v`) the first time it's asked for and caches the result; a pin whose
/// commit-ish doesn't parse as SemVer is "branch-like" and
/// `semantic_version()` returns `None` for it.
#[derive(Debug)]
pub struct PinnedVersion {
    commitish: String,
    semantic: OnceLock<Option<SemanticVersion>>,
}

// `OnceLock` has no `Clone` impl, so this is spelled out by hand: a clone
// carries over the already-computed semantic form if there is one, instead
// of discarding the memoisation and reparsing on next access.
impl Clone for PinnedVersion {
    fn clone(&self) -> Self {
        let semantic = OnceLock::new();
        if let Some(value) = self.semantic.get() {
            let _ = semantic.set(value.clone());
        }
        Self {
            commitish: self.commitish.clone(),
            semantic,
        }
    }
}

impl PinnedVersion {
    #[must_use]
    pub fn new(commitish: impl Into<String>) -> Self {
        Self {
            commitish: commitish.into(),
            semantic: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn commitish(&self) -> &str {
        &self.commitish
    }

    /// The parsed semantic version, if `commitish` is one (accepting an
    /// optional leading `v`). `None` for branch names and commit SHAs that
    /// don't happen to look like a version.
    #[must_use]
    pub fn semantic_version(&self) -> Option<&SemanticVersion> {
        self.semantic
            .get_or_init(|| SemanticVersion::parse(&self.commitish).ok())
            .as_ref()
    }

    /// `true` iff `commitish` does not parse as a semantic version — the
    /// "branch pin trumps" rule (spec §9) applies to these.
    #[must_use]
    pub fn is_branch_like(&self) -> bool {
        self.semantic_version().is_none()
    }
}

impl PartialEq for PinnedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.commitish == other.commitish
    }
}

impl Eq for PinnedVersion {}

impl std::hash::Hash for PinnedVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.commitish.hash(state);
    }
}

impl fmt::Display for PinnedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.commitish)
    }
}

impl From<SemanticVersion> for PinnedVersion {
    fn from(version: SemanticVersion) -> Self {
        let commitish = version.to_string();
        let pin = Self::new(commitish);
        let _ = pin.semantic.set(Some(version));
        pin
    }
}

// The `semantic` cache is derived from `commitish` and is not part of this
// type's persisted identity, so only the commit-ish string round-trips.
impl Serialize for PinnedVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.commitish)
    }
}

impl<'de> Deserialize<'de> for PinnedVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
