//! The backtracking search, its caches, and its event stream (spec §4.6).
//!
//! [`Resolver::resolve`] performs a depth-first search over
//! `(dependency → version)` assignments. Rather than a mutable
//! assignment plus an explicit undo stack, this implementation takes the
//! "immutable snapshot" option spec §9 calls out as equally valid: each
//! candidate version is tried against a cloned [`SearchState`], so failure
//! simply discards the clone instead of unwinding mutations.

pub mod conflict;
pub mod context;
pub mod events;
pub mod update_scope;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;

use crate::dependency::Dependency;
use crate::error::{RequirementChainLink, ResolveError};
use crate::pinned_version::PinnedVersion;
use crate::requirements::Requirements;
use crate::retriever::Retriever;
use crate::version_specifier::VersionSpecifier;

use conflict::ConcreteAssignment;
use context::ResolverContext;
use events::{EventLog, ResolverEvent};
use update_scope::is_updatable;

/// Bounds on search effort, a cooperative guard against pathological
/// requirement graphs rather than a correctness mechanism (spec §9's search
/// is already guaranteed to terminate on a finite universe).
#[derive(Debug, Clone)]
pub struct ResolverLimits {
    /// Maximum number of (dependency, version) candidates the search will
    /// attempt before surfacing an internal-invariant error instead of
    /// spinning forever on a misbehaving `Retriever`.
    pub max_candidates_tried: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        Self {
            max_candidates_tried: 50_000,
        }
    }
}

/// A cooperative cancellation flag, checked at every version-candidate and
/// Retriever-call boundary (spec §5).
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The search state threaded through the DFS: the partial assignment, the
/// working specifier accumulated per not-yet-assigned dependency, the
/// observed requirement edges, and the event log. Cloned once per candidate
/// attempt (see module docs).
#[derive(Debug, Clone, Default)]
struct SearchState {
    assignment: HashMap<Dependency, crate::concrete_version::ConcreteVersion>,
    working_specifiers: HashMap<Dependency, VersionSpecifier>,
    defining: HashMap<Dependency, Option<Dependency>>,
    requirements: Requirements,
    events: EventLog,
}

fn as_pin_map(assignment: &HashMap<Dependency, crate::concrete_version::ConcreteVersion>) -> BTreeMap<Dependency, PinnedVersion> {
    assignment.iter().map(|(d, v)| (d.clone(), v.pinned().clone())).collect()
}

fn conflicts_with_assignment(
    conflict: &conflict::DependencyConflict,
    assignment: &HashMap<Dependency, crate::concrete_version::ConcreteVersion>,
) -> bool {
    match &conflict.conflicting_with {
        None => true,
        Some(others) => others.iter().any(|(d, v)| assignment.get(d).map(|cv| cv.pinned()) == Some(v)),
    }
}

/// The depth-first backtracking search (spec §4.6 steps 1-4).
#[allow(clippy::too_many_arguments)]
fn resolve_step<'ctx, R: Retriever>(
    context: &'ctx mut ResolverContext<'_, R>,
    mut work_list: Vec<Dependency>,
    mut state: SearchState,
    rejections: &'ctx mut Vec<RequirementChainLink>,
    candidates_tried: &'ctx mut usize,
    last_resolved: Arc<HashMap<Dependency, PinnedVersion>>,
    closure: Arc<Option<HashSet<Dependency>>>,
    cancellation: Cancellation,
    limits: Arc<ResolverLimits>,
) -> BoxFuture<'ctx, Result<Option<SearchState>, ResolveError>> {
    Box::pin(async move {
        let Some(dep) = work_list.pop() else {
            return Ok(Some(state));
        };

        if state.assignment.contains_key(&dep) {
            return resolve_step(context, work_list, state, rejections, candidates_tried, last_resolved, closure, cancellation, limits).await;
        }

        if cancellation.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let specifier = state.working_specifiers.get(&dep).cloned().unwrap_or(VersionSpecifier::Any);
        let updatable = is_updatable(&dep, Some(&last_resolved), closure.as_ref().as_ref());

        tracing::debug!(dependency = %dep, %specifier, updatable, "resolving dependency");

        let versions = match context.find_all_versions(&dep, &specifier, updatable).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(dependency = %dep, error = %e, "retriever failed fetching versions");
                state.events.push(ResolverEvent::FailedRetrievingVersions {
                    dependency: dep.clone(),
                    specifier: specifier.clone(),
                    message: e.to_string(),
                });
                rejections.push(RequirementChainLink {
                    defining_dependency: state.defining.get(&dep).cloned().flatten(),
                    required_dependency: dep.clone(),
                    specifier,
                    observed_pin: None,
                });
                return Ok(None);
            }
        };
        state.events.push(ResolverEvent::FoundVersions {
            dependency: dep.clone(),
            specifier: specifier.clone(),
            versions: versions.iter().cloned().collect(),
        });

        if versions.is_empty() {
            tracing::warn!(dependency = %dep, %specifier, "no versions satisfy specifier");
            state.events.push(ResolverEvent::Rejected {
                partial_assignment: as_pin_map(&state.assignment),
                reason: format!("no versions available for '{dep}' satisfying {specifier}"),
            });
            rejections.push(RequirementChainLink {
                defining_dependency: state.defining.get(&dep).cloned().flatten(),
                required_dependency: dep.clone(),
                specifier,
                observed_pin: None,
            });
            return Ok(None);
        }

        for candidate in versions.iter() {
            if cancellation.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }
            if *candidates_tried >= limits.max_candidates_tried {
                return Err(ResolveError::InternalInvariantViolation {
                    message: "exceeded maximum number of version candidates".to_string(),
                });
            }

            let pin = candidate.pinned().clone();
            let candidate_key: ConcreteAssignment = (dep.clone(), pin.clone());

            if let Some(conflict) = context.conflict_for(&candidate_key) {
                if conflicts_with_assignment(conflict, &state.assignment) {
                    continue;
                }
            }

            *candidates_tried += 1;

            let mut branch_state = state.clone();
            branch_state.assignment.insert(dep.clone(), candidate.clone());

            let transitive = match context.find_dependencies(&dep, &pin).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(dependency = %dep, version = %pin, error = %e, "retriever failed fetching transitive dependencies");
                    branch_state.events.push(ResolverEvent::FailedRetrievingTransitiveDependencies {
                        dependency: dep.clone(),
                        version: pin.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            branch_state.events.push(ResolverEvent::FoundTransitiveDependencies {
                dependency: dep.clone(),
                version: pin.clone(),
                dependencies: transitive.clone(),
            });

            let mut sorted = transitive;
            context.sort_by_problematic_first(&mut sorted);

            let mut branch_work_list = work_list.clone();
            let mut candidate_ok = true;

            for (required, req_specifier) in &sorted {
                if let Err(e) = branch_state.requirements.record_checked(Some(dep.clone()), required.clone(), req_specifier.clone()) {
                    return Err(e);
                }

                if let Some(existing) = branch_state.assignment.get(required) {
                    if !req_specifier.is_satisfied_by(existing.pinned()) {
                        tracing::debug!(dependency = %dep, version = %pin, required = %required, "transitive requirement unsatisfied by existing assignment, backtracking");
                        context.record_conflict(candidate_key.clone(), (required.clone(), existing.pinned().clone()), "transitive requirement not satisfied by existing assignment");
                        rejections.push(RequirementChainLink {
                            defining_dependency: Some(dep.clone()),
                            required_dependency: required.clone(),
                            specifier: req_specifier.clone(),
                            observed_pin: Some(existing.pinned().clone()),
                        });
                        candidate_ok = false;
                        break;
                    }
                } else {
                    let merged = branch_state.working_specifiers.get(required).cloned().unwrap_or(VersionSpecifier::Any).intersect(req_specifier);
                    branch_state.working_specifiers.insert(required.clone(), merged);
                    branch_state.defining.entry(required.clone()).or_insert_with(|| Some(dep.clone()));
                    if !branch_work_list.contains(required) {
                        branch_work_list.push(required.clone());
                    }
                }
            }

            if !candidate_ok {
                continue;
            }

            match resolve_step(context, branch_work_list, branch_state, rejections, candidates_tried, last_resolved.clone(), closure.clone(), cancellation.clone(), limits.clone()).await? {
                Some(solved) => return Ok(Some(solved)),
                None => {
                    // The whole remainder of the work list is unsatisfiable with
                    // `dep` pinned to this candidate, for the rest of this
                    // `resolve` call — a root-level dead end (spec §4.6 steps 2
                    // and 4), not just a conflict with one other assignment.
                    context.record_conflict_against_root(candidate_key.clone(), format!("no solution exists with '{dep}' pinned to {pin}"));
                    continue;
                }
            }
        }

        tracing::warn!(dependency = %dep, "exhausted all candidates, backtracking");
        rejections.push(RequirementChainLink {
            defining_dependency: state.defining.get(&dep).cloned().flatten(),
            required_dependency: dep.clone(),
            specifier: specifier.clone(),
            observed_pin: None,
        });
        state.events.push(ResolverEvent::Rejected {
            partial_assignment: as_pin_map(&state.assignment),
            reason: format!("exhausted all candidates for '{dep}'"),
        });
        Ok(None)
    })
}

/// The dependency resolution search, scoped to a single [`Retriever`].
pub struct Resolver<'r, R: Retriever> {
    retriever: &'r R,
    limits: ResolverLimits,
    events: EventLog,
}

impl<'r, R: Retriever> Resolver<'r, R> {
    #[must_use]
    pub fn new(retriever: &'r R) -> Self {
        Self::with_limits(retriever, ResolverLimits::default())
    }

    #[must_use]
    pub fn with_limits(retriever: &'r R, limits: ResolverLimits) -> Self {
        Self {
            retriever,
            limits,
            events: EventLog::new(),
        }
    }

    /// The event stream recorded by the most recent `resolve` call.
    pub fn events(&self) -> impl Iterator<Item = &ResolverEvent> {
        self.events.iter()
    }

    /// `resolve(dependencies, lastResolved?, dependenciesToUpdate?)` (spec
    /// §4.6, §6).
    #[tracing::instrument(skip_all, fields(top_level = dependencies.len()))]
    pub async fn resolve(
        &mut self,
        dependencies: HashMap<Dependency, VersionSpecifier>,
        last_resolved: Option<HashMap<Dependency, PinnedVersion>>,
        dependencies_to_update: Option<HashSet<String>>,
        cancellation: &Cancellation,
    ) -> Result<BTreeMap<Dependency, PinnedVersion>, ResolveError> {
        let last_resolved_map = last_resolved.unwrap_or_default();
        let mut context = ResolverContext::new(self.retriever, last_resolved_map.clone());

        let closure = update_scope::updatable_closure(&mut context, &last_resolved_map, dependencies_to_update.as_ref()).await?;

        let mut state = SearchState::default();
        let mut work_list: Vec<Dependency> = Vec::new();
        // `dependencies` is a `HashMap`; its iteration order is randomized
        // per process, so the root seed is sorted by description before
        // being pushed onto the work list (spec §8 invariant 1 requires
        // determinism given the same Retriever responses).
        let mut top_level: Vec<(&Dependency, &VersionSpecifier)> = dependencies.iter().collect();
        top_level.sort_by_key(|(dep, _)| dep.description());
        for (dep, specifier) in top_level {
            state.requirements.record_checked(None, dep.clone(), specifier.clone())?;
            let merged = state.working_specifiers.get(dep).cloned().unwrap_or(VersionSpecifier::Any).intersect(specifier);
            state.working_specifiers.insert(dep.clone(), merged);
            state.defining.entry(dep.clone()).or_insert(None);
            if !work_list.contains(dep) {
                work_list.push(dep.clone());
            }
        }

        let mut rejections: Vec<RequirementChainLink> = Vec::new();
        let mut candidates_tried = 0usize;
        let last_resolved_arc = Arc::new(last_resolved_map);
        let closure_arc = Arc::new(closure);
        let limits_arc = Arc::new(self.limits.clone());

        let result = resolve_step(
            &mut context,
            work_list,
            state,
            &mut rejections,
            &mut candidates_tried,
            last_resolved_arc,
            closure_arc,
            cancellation.clone(),
            limits_arc,
        )
        .await?;

        match result {
            Some(solved) => {
                self.events = solved.events;
                Ok(solved.assignment.into_iter().map(|(d, v)| (d, v.into_pinned())).collect())
            }
            None => Err(ResolveError::IncompatibleRequirements { chain: rejections }),
        }
    }
}
