//! Ordered candidate version sets for one dependency (spec §3, §4.4).

use serde::{Deserialize, Serialize};

use crate::pinned_version::PinnedVersion;
use crate::version_specifier::VersionSpecifier;

/// A [`PinnedVersion`] annotated with whether it parses as a semantic
/// version. Ordering descends: newer versions sort first, so iterating a
/// [`ConcreteVersionSet`] yields the resolver's preferred candidate order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcreteVersion {
    pinned: PinnedVersion,
}

impl ConcreteVersion {
    #[must_use]
    pub fn new(pinned: PinnedVersion) -> Self {
        Self { pinned }
    }

    #[must_use]
    pub fn pinned(&self) -> &PinnedVersion {
        &self.pinned
    }

    #[must_use]
    pub fn is_semantic(&self) -> bool {
        self.pinned.semantic_version().is_some()
    }

    pub fn into_pinned(self) -> PinnedVersion {
        self.pinned
    }
}

/// Newer-first ordering. Non-semantic (branch-like) versions sort after all
/// semantic ones and are otherwise ordered by commit-ish for determinism.
impl PartialOrd for ConcreteVersion {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConcreteVersion {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.pinned.semantic_version(), other.pinned.semantic_version()) {
            (Some(a), Some(b)) => b.cmp(a),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => self.pinned.commitish().cmp(other.pinned.commitish()),
        }
    }
}

/// An ordered set of candidate versions for a single dependency, plus the
/// "pinned" flag recording whether this set was forcibly constrained to the
/// dependency's prior resolution (spec §4.4).
#[derive(Debug, Clone, Default)]
pub struct ConcreteVersionSet {
    versions: Vec<ConcreteVersion>,
    is_pinned: bool,
}

impl ConcreteVersionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set forced to exactly one version, as produced when a dependency is
    /// not updatable and a prior pin exists.
    #[must_use]
    pub fn pinned(version: ConcreteVersion) -> Self {
        Self {
            versions: vec![version],
            is_pinned: true,
        }
    }

    #[must_use]
    pub fn from_versions(mut versions: Vec<ConcreteVersion>) -> Self {
        versions.sort();
        versions.dedup();
        Self {
            versions,
            is_pinned: false,
        }
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.is_pinned
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Iterate candidates in preference order (newest first).
    pub fn iter(&self) -> impl Iterator<Item = &ConcreteVersion> {
        self.versions.iter()
    }

    pub fn insert(&mut self, version: ConcreteVersion) {
        if self.is_pinned {
            return;
        }
        if let Err(pos) = self.versions.binary_search(&version) {
            self.versions.insert(pos, version);
        }
    }

    /// Remove every candidate that does not satisfy `specifier`. A no-op on a
    /// pinned set whose single version already fails the specifier would
    /// empty the set — which is exactly the intended signal of a hard
    /// conflict with the pinned input (spec §4.4).
    pub fn retain_compatible(&mut self, specifier: &VersionSpecifier) {
        self.versions.retain(|v| specifier.is_satisfied_by(v.pinned()));
    }

    /// A deep-enough duplicate for one branch of the search to mutate
    /// independently of its siblings.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cv(s: &str) -> ConcreteVersion {
        ConcreteVersion::new(PinnedVersion::new(s))
    }

    #[test]
    fn iteration_order_is_newest_first() {
        let set = ConcreteVersionSet::from_versions(vec![cv("1.0.0"), cv("2.0.0"), cv("1.5.0")]);
        let order: Vec<_> = set.iter().map(|v| v.pinned().commitish().to_string()).collect();
        assert_eq!(order, vec!["2.0.0", "1.5.0", "1.0.0"]);
    }

    #[test]
    fn semantic_versions_sort_before_branch_like_ones() {
        let set = ConcreteVersionSet::from_versions(vec![cv("main"), cv("1.0.0")]);
        let order: Vec<_> = set.iter().map(|v| v.pinned().commitish().to_string()).collect();
        assert_eq!(order, vec!["1.0.0", "main"]);
    }

    #[test]
    fn pinned_set_rejects_further_inserts() {
        let mut set = ConcreteVersionSet::pinned(cv("1.0.0"));
        set.insert(cv("2.0.0"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn retain_compatible_can_empty_a_pinned_set() {
        let mut set = ConcreteVersionSet::pinned(cv("1.0.0"));
        set.retain_compatible(&VersionSpecifier::Exactly(
            crate::semantic_version::SemanticVersion::parse("2.0.0").unwrap(),
        ));
        assert!(set.is_empty());
        assert!(set.is_pinned());
    }

    #[test]
    fn retain_compatible_filters_in_place() {
        let mut set = ConcreteVersionSet::from_versions(vec![cv("1.0.0"), cv("2.0.0")]);
        set.retain_compatible(&VersionSpecifier::AtLeast(
            crate::semantic_version::SemanticVersion::parse("1.5.0").unwrap(),
        ));
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().unwrap().pinned().commitish(), "2.0.0");
    }
}
