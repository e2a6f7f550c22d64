//! `fxpm-resolver` — the dependency resolution core of a package manager for
//! precompiled binary and source-controlled frameworks.
//!
//! Given a set of top-level dependency requirements expressed as version
//! constraints, this crate discovers transitive requirements by consulting
//! an external [`Retriever`](retriever::Retriever), computes a globally
//! consistent assignment of one concrete version per dependency, or reports
//! a precise diagnostic identifying the incompatible requirements.
//!
//! # What this crate is not
//!
//! This crate performs no I/O, no process spawning, and no network access.
//! It does not parse command lines, fetch or checkout Git repositories,
//! download or extract binaries, invoke builds, or copy files. Those
//! concerns belong to a caller that implements [`retriever::Retriever`] and
//! acts on the [`PinnedVersion`](pinned_version::PinnedVersion) assignment
//! this crate produces.
//!
//! # Core Modules
//!
//! - [`semantic_version`] - SemVer 2.0.0 parsing, ordering, and display
//! - [`version_specifier`] - the constraint algebra (`Any`, `Empty`,
//!   `Exactly`, `AtLeast`, `CompatibleWith`, `GitReference`) and its
//!   intersection/satisfaction rules
//! - [`pinned_version`] - a commit-ish with lazily parsed semantic form
//! - [`concrete_version`] - ordered candidate version sets
//! - [`dependency`] - the opaque dependency identity type
//! - [`requirements`] - the requirements multi-map and its inversion
//! - [`retriever`] - the `Retriever` trait, the core's only inbound boundary
//! - [`resolver`] - the backtracking search, caches, and event stream
//! - [`compatibility`] - post-resolution incompatibility diagnostics
//! - [`crawler`] - a read-only dependency-universe explorer
//! - [`cartfile`] - a minimal tokeniser for building test fixtures
//! - [`display`] - textual forms used in tests and persisted state
//! - [`error`] - the crate's error type
//!
//! # Example
//!
//! ```
//! use fxpm_resolver::version_specifier::VersionSpecifier;
//! use fxpm_resolver::semantic_version::SemanticVersion;
//!
//! let compatible = VersionSpecifier::CompatibleWith(SemanticVersion::parse("1.2.0").unwrap());
//! let at_least = VersionSpecifier::AtLeast(SemanticVersion::parse("1.0.0").unwrap());
//! let both = compatible.intersect(&at_least);
//! assert!(!matches!(both, VersionSpecifier::Empty));
//! ```

pub mod cartfile;
pub mod compatibility;
pub mod concrete_version;
pub mod crawler;
pub mod dependency;
pub mod display;
pub mod error;
pub mod pinned_version;
pub mod requirements;
pub mod resolver;
pub mod retriever;
pub mod semantic_version;
pub mod version_specifier;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
