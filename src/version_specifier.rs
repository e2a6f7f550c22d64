//! The constraint algebra (spec §3, §4.2).
//!
//! `VersionSpecifier` is a closed sum type with a total intersection
//! operation and a satisfaction predicate against a [`PinnedVersion`]. Both
//! are specified by exhaustive case analysis in spec §4.2; this module is a
//! direct transcription of that table rather than a derivation from some
//! more general range type, because the "branch pin trumps" and
//! `GitReference`-dominance rules aren't expressible as plain interval
//! arithmetic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pinned_version::PinnedVersion;
use crate::semantic_version::SemanticVersion;

/// A predicate selecting a subset of versions for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VersionSpecifier {
    /// Matches any version except a pre-release (non-semantic pins still
    /// satisfy this — see [`VersionSpecifier::is_satisfied_by`]).
    Any,
    /// The zero element of intersection; matches nothing.
    Empty,
    /// Matches exactly `SemanticVersion`, pre-release included, with no
    /// differing build metadata.
    Exactly(SemanticVersion),
    /// Matches any semantic version `>= SemanticVersion` (pre-release
    /// semantics detailed in [`VersionSpecifier::is_satisfied_by`]).
    AtLeast(SemanticVersion),
    /// Matches `>= SemanticVersion` within the same "compatible" band: same
    /// major (and, for `0.x`, same minor too).
    CompatibleWith(SemanticVersion),
    /// Matches only a pin whose commit-ish is byte-equal to this string.
    GitReference(String),
}

impl VersionSpecifier {
    /// `specifier ⊨ pinned` (spec §4.2 "Satisfaction").
    #[must_use]
    pub fn is_satisfied_by(&self, pinned: &PinnedVersion) -> bool {
        match self {
            Self::Empty => false,
            Self::Any => match pinned.semantic_version() {
                Some(v) => !v.is_prerelease(),
                None => true,
            },
            Self::GitReference(r) => pinned.commitish() == r,
            Self::Exactly(req) => match pinned.semantic_version() {
                Some(pin) => pin == req,
                None => false,
            },
            Self::AtLeast(req) => match pinned.semantic_version() {
                Some(pin) => at_least_satisfied(pin, req),
                None => true,
            },
            Self::CompatibleWith(req) => match pinned.semantic_version() {
                Some(pin) => at_least_satisfied(pin, req) && compatible_band(pin, req),
                None => true,
            },
        }
    }

    /// The total binary intersection operation of spec §4.2's table.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        use VersionSpecifier::{AtLeast, CompatibleWith, Empty, Exactly, GitReference};

        match (self, other) {
            (Self::Empty, _) | (_, Self::Empty) => Self::Empty,

            (Self::Any, Self::Any) => Self::Any,
            (Self::Any, other) | (other, Self::Any) => match other {
                Exactly(r) => Exactly(r.clone()),
                AtLeast(r) => AtLeast(r.discarding_build_metadata()),
                CompatibleWith(r) => CompatibleWith(r.discarding_build_metadata()),
                GitReference(r) => GitReference(r.clone()),
                Self::Any | Self::Empty => unreachable!("handled above"),
            },

            (GitReference(l), GitReference(r)) => {
                if l == r { GitReference(l.clone()) } else { Self::Empty }
            }
            (GitReference(l), _) | (_, GitReference(l)) => GitReference(l.clone()),

            (Exactly(l), Exactly(r)) => {
                if l == r { Exactly(l.clone()) } else { Self::Empty }
            }
            (Exactly(l), AtLeast(r)) | (AtLeast(r), Exactly(l)) => {
                if r <= l { Exactly(l.clone()) } else { Self::Empty }
            }
            (Exactly(l), CompatibleWith(r)) | (CompatibleWith(r), Exactly(l)) => {
                if l >= r && compatible_band(l, r) { Exactly(l.clone()) } else { Self::Empty }
            }

            (AtLeast(l), AtLeast(r)) => AtLeast(max_version(l, r).discarding_build_metadata()),

            (AtLeast(l), CompatibleWith(r)) | (CompatibleWith(r), AtLeast(l)) => {
                if l.major() > r.major() {
                    Self::Empty
                } else if l.major() < r.major() {
                    CompatibleWith(r.clone())
                } else if r.major() == 0 && l.minor() > r.minor() {
                    // `r`'s band is pinned to minor `r.minor()`; `l` demands a
                    // version strictly above that whole band.
                    Self::Empty
                } else if r.major() == 0 && l.minor() < r.minor() {
                    // every version in `r`'s band already exceeds `l`.
                    CompatibleWith(r.clone())
                } else {
                    CompatibleWith(max_version(l, r).clone())
                }
            }

            (CompatibleWith(l), CompatibleWith(r)) => {
                if l.major() != r.major() {
                    Self::Empty
                } else if l.major() == 0 && l.minor() != r.minor() {
                    Self::Empty
                } else {
                    CompatibleWith(max_version(l, r).clone())
                }
            }
        }
    }

    /// Reduce an ordered collection of specifiers with `Any` as the
    /// identity (spec §4.2, last sentence).
    pub fn intersect_all<'a>(specifiers: impl IntoIterator<Item = &'a Self>) -> Self {
        specifiers.into_iter().fold(Self::Any, |acc, s| acc.intersect(s))
    }
}

fn at_least_satisfied(pin: &SemanticVersion, req: &SemanticVersion) -> bool {
    if pin.is_prerelease() {
        req.is_prerelease() && pin.has_same_numeric_components(req) && pin >= req
    } else {
        pin >= req
    }
}

fn compatible_band(pin: &SemanticVersion, req: &SemanticVersion) -> bool {
    if req.major() > 0 {
        pin.major() == req.major()
    } else {
        pin.major() == 0 && pin.minor() == req.minor()
    }
}

fn max_version<'a>(a: &'a SemanticVersion, b: &'a SemanticVersion) -> &'a SemanticVersion {
    if a >= b { a } else { b }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, ""),
            Self::Empty => write!(f, "[]"),
            Self::Exactly(v) => write!(f, "== {v}"),
            Self::AtLeast(v) => write!(f, ">= {v}"),
            Self::CompatibleWith(v) => write!(f, "~> {v}"),
            Self::GitReference(r) => write!(f, "\"{r}\""),
        }
    }
}
