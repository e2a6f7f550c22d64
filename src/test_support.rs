//! An in-memory, fully scripted [`Retriever`] for tests and doc examples.
//!
//! Gated behind `cfg(test)` / the `test-utils` feature rather than shipped
//! unconditionally, keeping test-only fixtures out of the default build.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::dependency::Dependency;
use crate::pinned_version::PinnedVersion;
use crate::retriever::Retriever;
use crate::version_specifier::VersionSpecifier;

/// The error type a [`MockRetriever`] reports — either a scripted failure or
/// "dependency unknown to this fixture".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("mock retriever: {0}")]
pub struct MockRetrieverError(pub String);

/// A fully in-memory `Retriever` built by chaining `with_*` calls, used by
/// every scenario test (spec §8 S1-S6) and by the property tests that need a
/// concrete `Retriever` to exercise the resolver end to end.
#[derive(Debug, Default)]
pub struct MockRetriever {
    versions: Mutex<HashMap<Dependency, Vec<PinnedVersion>>>,
    dependencies: Mutex<HashMap<(Dependency, PinnedVersion), Vec<(Dependency, VersionSpecifier)>>>,
    git_refs: Mutex<HashMap<(Dependency, String), PinnedVersion>>,
    failing_versions: Mutex<HashMap<Dependency, String>>,
    versions_calls: Mutex<HashMap<Dependency, usize>>,
    dependencies_calls: Mutex<HashMap<(Dependency, PinnedVersion), usize>>,
}

impl MockRetriever {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_versions<'a>(self, dependency: Dependency, versions: impl IntoIterator<Item = &'a str>) -> Self {
        self.versions
            .lock()
            .unwrap()
            .insert(dependency, versions.into_iter().map(PinnedVersion::new).collect());
        self
    }

    #[must_use]
    pub fn with_dependencies(
        self,
        dependency: Dependency,
        pin: PinnedVersion,
        deps: Vec<(Dependency, VersionSpecifier)>,
    ) -> Self {
        self.dependencies.lock().unwrap().insert((dependency, pin), deps);
        self
    }

    #[must_use]
    pub fn with_git_reference(self, dependency: Dependency, git_ref: &str, resolves_to: PinnedVersion) -> Self {
        self.git_refs.lock().unwrap().insert((dependency, git_ref.to_string()), resolves_to);
        self
    }

    #[must_use]
    pub fn with_failing_versions(self, dependency: Dependency, message: impl Into<String>) -> Self {
        self.failing_versions.lock().unwrap().insert(dependency, message.into());
        self
    }

    #[must_use]
    pub fn versions_call_count(&self, dependency: &Dependency) -> usize {
        *self.versions_calls.lock().unwrap().get(dependency).unwrap_or(&0)
    }

    #[must_use]
    pub fn dependencies_call_count(&self, dependency: &Dependency, pin: &PinnedVersion) -> usize {
        *self
            .dependencies_calls
            .lock()
            .unwrap()
            .get(&(dependency.clone(), pin.clone()))
            .unwrap_or(&0)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    type Error = MockRetrieverError;

    async fn versions(&self, dependency: &Dependency) -> Result<Vec<PinnedVersion>, Self::Error> {
        *self.versions_calls.lock().unwrap().entry(dependency.clone()).or_insert(0) += 1;
        if let Some(message) = self.failing_versions.lock().unwrap().get(dependency) {
            return Err(MockRetrieverError(message.clone()));
        }
        Ok(self.versions.lock().unwrap().get(dependency).cloned().unwrap_or_default())
    }

    async fn dependencies(
        &self,
        dependency: &Dependency,
        pin: &PinnedVersion,
    ) -> Result<Vec<(Dependency, VersionSpecifier)>, Self::Error> {
        *self
            .dependencies_calls
            .lock()
            .unwrap()
            .entry((dependency.clone(), pin.clone()))
            .or_insert(0) += 1;
        Ok(self
            .dependencies
            .lock()
            .unwrap()
            .get(&(dependency.clone(), pin.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn resolved_git_reference(
        &self,
        dependency: &Dependency,
        git_ref: &str,
    ) -> Result<Vec<PinnedVersion>, Self::Error> {
        Ok(self
            .git_refs
            .lock()
            .unwrap()
            .get(&(dependency.clone(), git_ref.to_string()))
            .cloned()
            .into_iter()
            .collect())
    }

    async fn resolved_commit_hash(&self, git_ref: &str, dependency: &Dependency) -> Result<String, Self::Error> {
        self.git_refs
            .lock()
            .unwrap()
            .get(&(dependency.clone(), git_ref.to_string()))
            .map(|p| p.commitish().to_string())
            .ok_or_else(|| MockRetrieverError(format!("no resolution scripted for {dependency} @ {git_ref}")))
    }
}
