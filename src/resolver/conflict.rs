//! The conflict cache (spec §4.5 "conflictCache", §9 "Conflict cache identity").
//!
//! Conflicts are keyed by `(Dependency, PinnedVersion)` rather than by a
//! richer context: two different defining dependencies that both reject the
//! same `(d, v)` share one cache entry, which simply accumulates the set of
//! concrete dependencies it conflicts with. This is what makes the cache
//! effective as a pruning heuristic — a candidate rejected once down one
//! branch of the search is never retried down another.

use std::collections::{HashMap, HashSet};

use crate::dependency::Dependency;
use crate::pinned_version::PinnedVersion;

/// One concrete assignment: a dependency pinned at a specific version.
pub type ConcreteAssignment = (Dependency, PinnedVersion);

/// A recorded reason `(dependency, pin)` cannot be part of any solution.
#[derive(Debug, Clone)]
pub struct DependencyConflict {
    /// Human-readable description of the triggering failure (an empty
    /// version list, a Retriever error, or an incompatible transitive
    /// requirement).
    pub cause: String,
    /// The other concrete assignments this entry conflicts with. `None`
    /// means "conflicts with the root requirements" rather than with any
    /// other dependency's chosen version.
    pub conflicting_with: Option<HashSet<ConcreteAssignment>>,
}

impl DependencyConflict {
    #[must_use]
    pub fn against_root(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            conflicting_with: None,
        }
    }

    #[must_use]
    pub fn against(cause: impl Into<String>, other: ConcreteAssignment) -> Self {
        let mut set = HashSet::new();
        set.insert(other);
        Self {
            cause: cause.into(),
            conflicting_with: Some(set),
        }
    }

    fn merge_other(&mut self, other: ConcreteAssignment) {
        match &mut self.conflicting_with {
            Some(set) => {
                set.insert(other);
            }
            None => {
                let mut set = HashSet::new();
                set.insert(other);
                self.conflicting_with = Some(set);
            }
        }
    }
}

/// `(Dependency, PinnedVersion) -> DependencyConflict`, recorded symmetrically:
/// `record(a, b)` also records the mirror entry for `b` against `a`.
#[derive(Debug, Clone, Default)]
pub struct ConflictCache {
    entries: HashMap<ConcreteAssignment, DependencyConflict>,
}

impl ConflictCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &ConcreteAssignment) -> Option<&DependencyConflict> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ConcreteAssignment) -> bool {
        self.entries.contains_key(key)
    }

    /// Records that `assignment` conflicts with the root requirements.
    pub fn record_against_root(&mut self, assignment: ConcreteAssignment, cause: impl Into<String>) {
        self.entries
            .entry(assignment)
            .and_modify(|c| c.cause = c.cause.clone())
            .or_insert_with(|| DependencyConflict::against_root(cause));
    }

    /// Records the symmetric conflict `a ⟂ b`.
    pub fn record(&mut self, a: ConcreteAssignment, b: ConcreteAssignment, cause: impl Into<String>) {
        let cause = cause.into();
        self.entries
            .entry(a.clone())
            .and_modify(|c| c.merge_other(b.clone()))
            .or_insert_with(|| DependencyConflict::against(cause.clone(), b.clone()));
        self.entries
            .entry(b)
            .and_modify(|c| c.merge_other(a.clone()))
            .or_insert_with(|| DependencyConflict::against(cause, a));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic_version::SemanticVersion;

    fn assignment(name: &str, version: &str) -> ConcreteAssignment {
        (Dependency::github("org", name), PinnedVersion::from(SemanticVersion::parse(version).unwrap()))
    }

    #[test]
    fn recording_is_symmetric() {
        let mut cache = ConflictCache::new();
        let a = assignment("a", "1.0.0");
        let b = assignment("b", "2.0.0");
        cache.record(a.clone(), b.clone(), "incompatible");

        assert!(cache.get(&a).unwrap().conflicting_with.as_ref().unwrap().contains(&b));
        assert!(cache.get(&b).unwrap().conflicting_with.as_ref().unwrap().contains(&a));
    }

    #[test]
    fn shared_entry_accumulates_multiple_conflicts() {
        let mut cache = ConflictCache::new();
        let a = assignment("a", "1.0.0");
        let b = assignment("b", "2.0.0");
        let c = assignment("c", "3.0.0");
        cache.record(a.clone(), b.clone(), "conflict with b");
        cache.record(a.clone(), c.clone(), "conflict with c");

        let entry = cache.get(&a).unwrap();
        let others = entry.conflicting_with.as_ref().unwrap();
        assert!(others.contains(&b));
        assert!(others.contains(&c));
    }

    #[test]
    fn root_conflicts_have_no_other_assignment() {
        let mut cache = ConflictCache::new();
        let a = assignment("a", "1.0.0");
        cache.record_against_root(a.clone(), "no versions available");
        assert!(cache.get(&a).unwrap().conflicting_with.is_none());
    }
}
