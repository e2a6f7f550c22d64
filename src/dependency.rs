//! The opaque dependency identity type (spec §3 "Dependency").

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a dependency's sources live. Equality and hashing of [`Dependency`]
/// are structural over this tag plus the display name — two dependencies
/// naming the same GitHub repo are the same dependency regardless of what
/// short name a manifest gave them elsewhere, so the name is carried for
/// diagnostics but does not participate in `Eq`/`Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    /// A GitHub-hosted repository, identified by host/owner/repo rather
    /// than by URL so that `github.com` and an enterprise host are
    /// distinguishable.
    GitHub {
        host: String,
        owner: String,
        repo: String,
    },
    /// An arbitrary Git remote.
    Git { url: String },
    /// A precompiled binary artifact addressed by URL (no Git history).
    Binary { url: String },
}

/// The identity of a single dependency in the resolution graph.
///
/// Two `Dependency` values are equal iff their [`SourceKind`]s are equal;
/// the `name` field is informational (used in diagnostics and as the
/// `dependenciesToUpdate` match key) and is intentionally excluded from
/// `Eq`/`Hash` so that a dependency referenced under two different display
/// names from two different manifests is still recognized as one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    source: SourceKind,
    name: String,
}

impl Dependency {
    #[must_use]
    pub fn new(source: SourceKind, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn github(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        let name = repo.clone();
        Self::new(
            SourceKind::GitHub {
                host: "github.com".to_string(),
                owner,
                repo,
            },
            name,
        )
    }

    #[must_use]
    pub fn git(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SourceKind::Git { url: url.into() }, name)
    }

    #[must_use]
    pub fn binary(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(SourceKind::Binary { url: url.into() }, name)
    }

    #[must_use]
    pub fn source(&self) -> &SourceKind {
        &self.source
    }

    /// The short name used for `dependenciesToUpdate` matching and in
    /// diagnostics. Not part of this dependency's identity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Dependency {}

impl std::hash::Hash for Dependency {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordering by description, used for the stable topological emission of
/// spec §8 scenario S6 and for `ResolvedCartfile`'s ascending sort (§6).
impl PartialOrd for Dependency {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dependency {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.description().cmp(&other.description())
    }
}

impl Dependency {
    /// A stable, unambiguous textual form used for ordering and display,
    /// distinct from the short `name` (which two different dependencies
    /// could share).
    #[must_use]
    pub fn description(&self) -> String {
        match &self.source {
            SourceKind::GitHub { host, owner, repo } => {
                if host == "github.com" {
                    format!("github \"{owner}/{repo}\"")
                } else {
                    format!("github \"{host}/{owner}/{repo}\"")
                }
            }
            SourceKind::Git { url } => format!("git \"{url}\""),
            SourceKind::Binary { url } => format!("binary \"{url}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_name() {
        let a = Dependency::github("alice", "lib");
        let b = Dependency::new(
            SourceKind::GitHub {
                host: "github.com".into(),
                owner: "alice".into(),
                repo: "lib".into(),
            },
            "totally-different-name",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn different_source_kinds_are_distinct() {
        let a = Dependency::github("alice", "lib");
        let b = Dependency::git("https://example.com/alice/lib.git", "lib");
        assert_ne!(a, b);
    }

    #[test]
    fn description_orders_lexicographically() {
        let a = Dependency::github("alice", "lib");
        let b = Dependency::github("bob", "lib");
        assert!(a < b);
    }
}
