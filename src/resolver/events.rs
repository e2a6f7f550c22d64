//! The resolver's structured progress event stream (spec §4.6 "Events").
//!
//! Events are non-blocking observations of the search: dropping them must
//! not change resolution outcome. Consumers obtain them through
//! [`crate::resolver::Resolver::events`] after a `resolve` call completes.

use std::collections::BTreeMap;

use crate::concrete_version::ConcreteVersion;
use crate::dependency::Dependency;
use crate::pinned_version::PinnedVersion;
use crate::version_specifier::VersionSpecifier;

/// One observation emitted during a `resolve` call.
#[derive(Debug, Clone)]
pub enum ResolverEvent {
    /// A version list was fetched and filtered for `dependency` against
    /// `specifier`.
    FoundVersions {
        dependency: Dependency,
        specifier: VersionSpecifier,
        versions: Vec<ConcreteVersion>,
    },
    /// A transitive fan-out was fetched for `dependency` pinned at `version`.
    FoundTransitiveDependencies {
        dependency: Dependency,
        version: PinnedVersion,
        dependencies: Vec<(Dependency, VersionSpecifier)>,
    },
    /// The Retriever failed while fetching versions.
    FailedRetrievingVersions {
        dependency: Dependency,
        specifier: VersionSpecifier,
        message: String,
    },
    /// The Retriever failed while fetching a transitive fan-out.
    FailedRetrievingTransitiveDependencies {
        dependency: Dependency,
        version: PinnedVersion,
        message: String,
    },
    /// A candidate was discarded for a recorded cause, carrying the partial
    /// assignment at the point of rejection.
    Rejected {
        partial_assignment: BTreeMap<Dependency, PinnedVersion>,
        reason: String,
    },
}

/// An append-only sink the resolver pushes events into during search. Kept
/// as a plain `Vec` rather than an async channel: spec §5 only requires that
/// subscribers not block the resolver, and a fully in-memory collection
/// trivially satisfies that for a single-threaded, single-`resolve`-call
/// scope.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Vec<ResolverEvent>);

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ResolverEvent) {
        self.0.push(event);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolverEvent> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ResolverEvent> {
        self.0
    }
}
