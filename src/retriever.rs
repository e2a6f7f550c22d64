//! The `Retriever` trait — the core's only inbound boundary (spec §4.3, §6).
//!
//! A `Retriever` is the caller's window into Git hosts, binary registries,
//! and cartfile parsing. The core never fetches, checks out, or downloads
//! anything itself; every version list and every transitive dependency
//! fan-out is learned by asking a `Retriever`.
//!
//! Streams are collected eagerly into `Vec`s rather than returned as a boxed
//! `Stream`: spec §5 requires every Retriever stream to be finite and fully
//! collected before the resolver proceeds, so a `Vec` return carries the same
//! information with no dangling borrow or pinning concerns, and keeps the
//! trait object-safe for `dyn Retriever` without `async-trait`'s boxed-stream
//! machinery.

use async_trait::async_trait;

use crate::dependency::Dependency;
use crate::pinned_version::PinnedVersion;
use crate::version_specifier::VersionSpecifier;

/// Read-only queries a concrete source (GitHub, an arbitrary Git remote, a
/// binary host) must answer for the resolver to function.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// The error type surfaced by this retriever's I/O. Wrapped in
    /// [`crate::error::ResolveError::RetrieverError`] when the core can't
    /// treat it as a local, recoverable conflict.
    type Error: std::error::Error + Send + Sync + 'static;

    /// All known versions of `dependency`.
    async fn versions(&self, dependency: &Dependency) -> Result<Vec<PinnedVersion>, Self::Error>;

    /// The direct dependencies of `dependency` pinned at `pin`.
    async fn dependencies(
        &self,
        dependency: &Dependency,
        pin: &PinnedVersion,
    ) -> Result<Vec<(Dependency, VersionSpecifier)>, Self::Error>;

    /// Resolves a branch or tag name to the commit(s) it currently points
    /// at. A stream for uniformity with `versions`; at most one value is
    /// expected in practice.
    async fn resolved_git_reference(
        &self,
        dependency: &Dependency,
        git_ref: &str,
    ) -> Result<Vec<PinnedVersion>, Self::Error>;

    /// The synchronous-shaped variant used by specifier-effectivisation
    /// (spec §4.7 step 2): resolves `git_ref` against `dependency` to a
    /// single commit-ish string.
    async fn resolved_commit_hash(&self, git_ref: &str, dependency: &Dependency) -> Result<String, Self::Error>;
}
