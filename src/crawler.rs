//! A read-only dependency-universe explorer for offline snapshots (spec §4.8).
//!
//! Unlike [`crate::resolver::Resolver`], the crawler performs no
//! backtracking search: it visits every reachable `(dependency, pin)` once,
//! records what it found, and moves on. It shares the same [`Retriever`]
//! boundary the resolver uses.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::concrete_version::ConcreteVersion;
use crate::dependency::Dependency;
use crate::error::ResolveError;
use crate::pinned_version::PinnedVersion;
use crate::retriever::Retriever;
use crate::version_specifier::VersionSpecifier;

/// Everything discovered for one `(dependency, specifier)` pair: the
/// filtered version set and, for each version, its direct dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRecord {
    pub dependency: Dependency,
    pub specifier: VersionSpecifier,
    pub versions: Vec<ConcreteVersion>,
    pub fan_out: HashMap<PinnedVersion, Vec<(Dependency, VersionSpecifier)>>,
}

/// The injected persistence sink spec §4.8 calls for, left unspecified by
/// the distilled requirements beyond "persists them via an injected store".
/// A single `record` method keeps the crawler decoupled from any particular
/// serialization format.
pub trait CrawlSink {
    fn record(&mut self, record: CrawlRecord);
}

/// A `CrawlSink` that simply collects every record, for tests and small
/// offline snapshots that fit in memory.
#[derive(Debug, Default)]
pub struct VecSink(pub Vec<CrawlRecord>);

impl CrawlSink for VecSink {
    fn record(&mut self, record: CrawlRecord) {
        self.0.push(record);
    }
}

/// A function rewriting a [`Dependency`] before it is persisted, used to
/// scrub source identities (hosts, owners, repos) out of a snapshot meant
/// for sharing.
pub type AnonymizeFn = Box<dyn Fn(&Dependency) -> Dependency + Send + Sync>;

pub struct DependencyCrawler<'r, R: Retriever> {
    retriever: &'r R,
    ignore_errors: bool,
    anonymize: Option<AnonymizeFn>,
    visited: HashSet<(Dependency, PinnedVersion)>,
    version_cache: HashMap<(Dependency, Option<String>), Vec<PinnedVersion>>,
}

impl<'r, R: Retriever> DependencyCrawler<'r, R> {
    #[must_use]
    pub fn new(retriever: &'r R, ignore_errors: bool) -> Self {
        Self {
            retriever,
            ignore_errors,
            anonymize: None,
            visited: HashSet::new(),
            version_cache: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_anonymization(mut self, f: AnonymizeFn) -> Self {
        self.anonymize = Some(f);
        self
    }

    /// Crawl every dependency reachable from `roots`, pushing one
    /// [`CrawlRecord`] per `(dependency, specifier)` pair visited into
    /// `sink`.
    pub async fn crawl<S: CrawlSink>(&mut self, sink: &mut S, roots: Vec<(Dependency, VersionSpecifier)>) -> Result<(), ResolveError> {
        let mut stack = roots;

        while let Some((dependency, specifier)) = stack.pop() {
            let git_ref_key = match &specifier {
                VersionSpecifier::GitReference(r) => Some(r.clone()),
                _ => None,
            };
            let cache_key = (dependency.clone(), git_ref_key);

            let versions = if let Some(cached) = self.version_cache.get(&cache_key) {
                cached.clone()
            } else {
                let fetched = match &specifier {
                    VersionSpecifier::GitReference(r) => self.retriever.resolved_git_reference(&dependency, r).await,
                    _ => self.retriever.versions(&dependency).await,
                };
                match fetched {
                    Ok(v) => {
                        self.version_cache.insert(cache_key, v.clone());
                        v
                    }
                    Err(e) => {
                        if self.ignore_errors {
                            tracing::debug!(dependency = %dependency, error = %e, "ignoring retriever error while crawling versions");
                            Vec::new()
                        } else {
                            return Err(retriever_error(&dependency, e));
                        }
                    }
                }
            };

            let filtered: Vec<ConcreteVersion> =
                versions.into_iter().map(ConcreteVersion::new).filter(|v| specifier.is_satisfied_by(v.pinned())).collect();

            let mut fan_out = HashMap::new();
            for version in &filtered {
                let visited_key = (dependency.clone(), version.pinned().clone());
                if !self.visited.insert(visited_key) {
                    continue;
                }

                let deps = match self.retriever.dependencies(&dependency, version.pinned()).await {
                    Ok(d) => d,
                    Err(e) => {
                        if self.ignore_errors {
                            tracing::debug!(dependency = %dependency, version = %version.pinned(), error = %e, "ignoring retriever error while crawling dependencies");
                            Vec::new()
                        } else {
                            return Err(retriever_error(&dependency, e));
                        }
                    }
                };

                for (child_dep, child_specifier) in &deps {
                    stack.push((child_dep.clone(), child_specifier.clone()));
                }
                fan_out.insert(version.pinned().clone(), deps);
            }

            let (record_dependency, record_fan_out) = match &self.anonymize {
                Some(anon) => (
                    anon(&dependency),
                    fan_out.into_iter().map(|(pin, deps)| (pin, deps.into_iter().map(|(d, s)| (anon(&d), s)).collect())).collect(),
                ),
                None => (dependency, fan_out),
            };

            sink.record(CrawlRecord {
                dependency: record_dependency,
                specifier,
                versions: filtered,
                fan_out: record_fan_out,
            });
        }

        Ok(())
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
