//! The crate's error type.
//!
//! Mirrors the error kinds enumerated in spec §6: each failure mode the
//! resolver can surface at its boundary gets its own variant with a message
//! that names the offending dependency rather than a generic "resolution
//! failed".

use thiserror::Error;

use crate::dependency::Dependency;
use crate::pinned_version::PinnedVersion;
use crate::version_specifier::VersionSpecifier;

/// One link in an unsatisfiable requirement chain: `defining_dependency`
/// required `required_dependency` at `specifier`, but the dependency was
/// (or would have been) pinned to `observed_pin`, which does not satisfy
/// `specifier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementChainLink {
    /// The dependency whose manifest introduced the requirement, or `None`
    /// for the root (user-supplied) requirements.
    pub defining_dependency: Option<Dependency>,
    /// The dependency the requirement constrains.
    pub required_dependency: Dependency,
    /// The specifier that could not be satisfied.
    pub specifier: VersionSpecifier,
    /// The pin the requirement was checked against, if one had been chosen.
    pub observed_pin: Option<PinnedVersion>,
}

/// Where a duplicate requirement edge was observed during inversion
/// (spec §4.7 step 1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateLocation {
    pub defining_dependency: Option<Dependency>,
    pub required_dependency: Dependency,
}

/// All errors the resolver core can surface at its boundary (spec §6).
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A dependency identity could not be constructed or referenced a
    /// malformed source.
    #[error("invalid dependency: {reason}")]
    InvalidDependency {
        /// Human-readable description of what was wrong.
        reason: String,
    },

    /// The requirements multi-map contained the same `(defining, required)`
    /// edge more than once — an invariant violation, not a resolvable
    /// conflict.
    #[error("duplicate dependency requirement(s) recorded for the same edge")]
    DuplicateDependencies {
        /// Every location the duplicate was observed at.
        locations: Vec<DuplicateLocation>,
    },

    /// No assignment satisfies every requirement; `chain` names the first
    /// unsatisfiable link discovered by walking the conflict cache.
    #[error("could not find a version for '{}' compatible with all requirements", chain.first().map(|l| l.required_dependency.name()).unwrap_or("<unknown>"))]
    IncompatibleRequirements {
        /// The requirement chain that proves the inconsistency, root first.
        chain: Vec<RequirementChainLink>,
    },

    /// A top-level or transitive requirement named a dependency for which
    /// no version information was ever found (an empty candidate set with
    /// no recorded conflict to explain it — e.g. spec §9's open question
    /// about an `Any` specifier against an all-prerelease `versions` stream).
    #[error("no versions available for '{dependency}' satisfying {specifier}")]
    MissingRequirement {
        dependency: Dependency,
        specifier: VersionSpecifier,
    },

    /// The `Retriever` reported a failure that the resolver could not treat
    /// as a local, recoverable "this candidate is dead" conflict.
    #[error("retriever failed for '{dependency}': {source}")]
    RetrieverError {
        dependency: Dependency,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The caller's cancellation flag was observed set at a version
    /// candidate or Retriever-call boundary.
    #[error("resolution cancelled")]
    Cancelled,

    /// A condition the implementation asserts can never happen (e.g. a
    /// conflict cache entry referencing a dependency that was never
    /// assigned) was observed anyway. This always indicates a bug in this
    /// crate, not bad input.
    #[error("internal invariant violated: {message}")]
    InternalInvariantViolation { message: String },
}

pub type Result<T> = std::result::Result<T, ResolveError>;
