//! `ResolverContext`: memoised Retriever queries, the conflict cache, and the
//! problematic-dependency histogram (spec §4.5).

use std::collections::HashMap;

use crate::concrete_version::{ConcreteVersion, ConcreteVersionSet};
use crate::dependency::Dependency;
use crate::error::ResolveError;
use crate::pinned_version::PinnedVersion;
use crate::resolver::conflict::{ConcreteAssignment, ConflictCache, DependencyConflict};
use crate::retriever::Retriever;
use crate::version_specifier::VersionSpecifier;

type VersionsCacheKey = (Dependency, VersionSpecifier, bool);
type DependencyCacheKey = (Dependency, PinnedVersion);

/// The memoisation layer a `resolve` call consults before ever asking the
/// Retriever twice for the same thing. Scoped to a single `resolve` call and
/// discarded on return (spec §5 "no inter-call persistence").
pub struct ResolverContext<'r, R: Retriever> {
    retriever: &'r R,
    pinned_versions: HashMap<Dependency, PinnedVersion>,
    versions_cache: HashMap<VersionsCacheKey, ConcreteVersionSet>,
    dependency_cache: HashMap<DependencyCacheKey, Vec<(Dependency, VersionSpecifier)>>,
    conflicts: ConflictCache,
    problem_counts: HashMap<Dependency, usize>,
    problematic_sorted: Option<Vec<Dependency>>,
}

impl<'r, R: Retriever> ResolverContext<'r, R> {
    #[must_use]
    pub fn new(retriever: &'r R, pinned_versions: HashMap<Dependency, PinnedVersion>) -> Self {
        Self {
            retriever,
            pinned_versions,
            versions_cache: HashMap::new(),
            dependency_cache: HashMap::new(),
            conflicts: ConflictCache::new(),
            problem_counts: HashMap::new(),
            problematic_sorted: None,
        }
    }

    #[must_use]
    pub fn conflicts(&self) -> &ConflictCache {
        &self.conflicts
    }

    pub fn record_conflict(&mut self, a: ConcreteAssignment, b: ConcreteAssignment, cause: impl Into<String>) {
        *self.problem_counts.entry(a.0.clone()).or_insert(0) += 1;
        *self.problem_counts.entry(b.0.clone()).or_insert(0) += 1;
        self.problematic_sorted = None;
        self.conflicts.record(a, b, cause);
    }

    pub fn record_conflict_against_root(&mut self, assignment: ConcreteAssignment, cause: impl Into<String>) {
        *self.problem_counts.entry(assignment.0.clone()).or_insert(0) += 1;
        self.problematic_sorted = None;
        self.conflicts.record_against_root(assignment, cause);
    }

    pub fn conflict_for(&self, assignment: &ConcreteAssignment) -> Option<&DependencyConflict> {
        self.conflicts.get(assignment)
    }

    /// Stable sort of `dependencies` with the most-conflicted first (spec
    /// §4.5 heuristic 1). Ties keep `dependencies`' relative order, so the
    /// sort is itself deterministic given deterministic input order.
    pub fn sort_by_problematic_first(&mut self, dependencies: &mut [(Dependency, VersionSpecifier)]) {
        if self.problematic_sorted.is_none() {
            let mut ranked: Vec<Dependency> = self.problem_counts.keys().cloned().collect();
            ranked.sort_by(|a, b| self.problem_counts[b].cmp(&self.problem_counts[a]));
            self.problematic_sorted = Some(ranked);
        }
        let counts = &self.problem_counts;
        dependencies.sort_by(|(a, _), (b, _)| counts.get(b).unwrap_or(&0).cmp(counts.get(a).unwrap_or(&0)));
    }

    /// `context.findAllVersions` (spec §4.5): the versions cache.
    pub async fn find_all_versions(
        &mut self,
        dependency: &Dependency,
        specifier: &VersionSpecifier,
        is_updatable: bool,
    ) -> Result<ConcreteVersionSet, ResolveError> {
        let key = (dependency.clone(), specifier.clone(), is_updatable);
        if let Some(cached) = self.versions_cache.get(&key) {
            return Ok(cached.clone());
        }

        if !is_updatable {
            if let Some(pin) = self.pinned_versions.get(dependency) {
                let set = ConcreteVersionSet::pinned(ConcreteVersion::new(pin.clone()));
                self.versions_cache.insert(key, set.clone());
                return Ok(set);
            }
        }

        let set = if let VersionSpecifier::GitReference(git_ref) = specifier {
            let resolved = self
                .retriever
                .resolved_git_reference(dependency, git_ref)
                .await
                .map_err(|e| retriever_error(dependency, e))?;
            let effective = resolved
                .first()
                .map(|p| VersionSpecifier::GitReference(p.commitish().to_string()))
                .unwrap_or_else(|| specifier.clone());
            let mut set = ConcreteVersionSet::from_versions(resolved.into_iter().map(ConcreteVersion::new).collect());
            set.retain_compatible(&effective);
            set
        } else {
            let versions = self
                .retriever
                .versions(dependency)
                .await
                .map_err(|e| retriever_error(dependency, e))?;
            let mut set = ConcreteVersionSet::from_versions(versions.into_iter().map(ConcreteVersion::new).collect());
            set.retain_compatible(specifier);
            set
        };

        self.versions_cache.insert(key, set.clone());
        Ok(set)
    }

    /// `context.findDependencies` (spec §4.5): the dependency cache.
    pub async fn find_dependencies(
        &mut self,
        dependency: &Dependency,
        pin: &PinnedVersion,
    ) -> Result<Vec<(Dependency, VersionSpecifier)>, ResolveError> {
        let key = (dependency.clone(), pin.clone());
        if let Some(cached) = self.dependency_cache.get(&key) {
            return Ok(cached.clone());
        }

        let deps = self
            .retriever
            .dependencies(dependency, pin)
            .await
            .map_err(|e| retriever_error(dependency, e))?;
        self.dependency_cache.insert(key, deps.clone());
        Ok(deps)
    }

    pub fn retriever(&self) -> &'r R {
        self.retriever
    }
}

fn retriever_error<E>(dependency: &Dependency, source: E) -> ResolveError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ResolveError::RetrieverError {
        dependency: dependency.clone(),
        source: Box::new(source),
    }
}
