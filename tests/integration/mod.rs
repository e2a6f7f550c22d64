//! Scenario tests exercising `Resolver::resolve` end to end against a
//! scripted `Retriever` (spec §8 S3-S6; S1 and S2 are covered inline in
//! `resolver::tests`).

use std::collections::{HashMap, HashSet};

use fxpm_resolver::dependency::Dependency;
use fxpm_resolver::pinned_version::PinnedVersion;
use fxpm_resolver::resolver::{Cancellation, Resolver};
use fxpm_resolver::semantic_version::SemanticVersion;
use fxpm_resolver::test_support::MockRetriever;
use fxpm_resolver::version_specifier::VersionSpecifier;

fn v(s: &str) -> SemanticVersion {
    SemanticVersion::parse(s).unwrap()
}

/// S3: with `dependenciesToUpdate` scoping, a dependency outside the
/// requested update set stays pinned to its prior resolution even though a
/// newer compatible version exists.
#[tokio::test]
async fn update_scoping_leaves_untouched_dependencies_at_their_prior_pin() {
    let root = Dependency::github("org", "root");
    let updatable = Dependency::github("org", "updatable");
    let frozen = Dependency::github("org", "frozen");

    let retriever = MockRetriever::new()
        .with_versions(root.clone(), ["1.0.0"])
        .with_versions(updatable.clone(), ["1.0.0", "1.1.0"])
        .with_versions(frozen.clone(), ["1.0.0", "1.1.0"])
        .with_dependencies(
            root.clone(),
            PinnedVersion::new("1.0.0"),
            vec![
                (updatable.clone(), VersionSpecifier::CompatibleWith(v("1.0.0"))),
                (frozen.clone(), VersionSpecifier::CompatibleWith(v("1.0.0"))),
            ],
        );

    let mut last_resolved = HashMap::new();
    last_resolved.insert(root.clone(), PinnedVersion::new("1.0.0"));
    last_resolved.insert(updatable.clone(), PinnedVersion::new("1.0.0"));
    last_resolved.insert(frozen.clone(), PinnedVersion::new("1.0.0"));

    // Naming only `updatable`: the closure is forward reachability over the
    // prior graph's requirement edges, so naming `root` here would also pull
    // in `frozen` (root requires both) and defeat the scenario.
    let mut to_update = HashSet::new();
    to_update.insert(updatable.name().to_string());

    let mut resolver = Resolver::new(&retriever);
    let mut deps = HashMap::new();
    deps.insert(root.clone(), VersionSpecifier::Exactly(v("1.0.0")));

    let result = resolver.resolve(deps, Some(last_resolved), Some(to_update), &Cancellation::new()).await.unwrap();

    assert_eq!(result.get(&updatable).unwrap().commitish(), "1.1.0");
    assert_eq!(result.get(&frozen).unwrap().commitish(), "1.0.0");
}

/// S4: backtracking away from a dead-end candidate does not re-query the
/// Retriever for versions or dependencies it already fetched — the versions
/// cache holds exactly one entry per distinct `(dependency, specifier,
/// isUpdatable)` triple regardless of how many times the search revisits it.
#[tokio::test]
async fn backtracking_reuses_cached_versions_and_dependencies() {
    let root = Dependency::github("org", "root");
    let picky = Dependency::github("org", "picky");
    let shared = Dependency::github("org", "shared");

    // `shared` is assigned to 1.0.0 before `picky` is tried. `picky`'s newest
    // candidate (2.0.0) requires shared==2.0.0, which conflicts with the
    // existing assignment, so the search backtracks to picky@1.0.0 (which
    // requires shared==1.0.0) without ever re-fetching shared's versions.
    let retriever = MockRetriever::new()
        .with_versions(root.clone(), ["1.0.0"])
        .with_versions(picky.clone(), ["1.0.0", "2.0.0"])
        .with_versions(shared.clone(), ["1.0.0"])
        .with_dependencies(
            root.clone(),
            PinnedVersion::new("1.0.0"),
            vec![(picky.clone(), VersionSpecifier::Any), (shared.clone(), VersionSpecifier::Exactly(v("1.0.0")))],
        )
        .with_dependencies(picky.clone(), PinnedVersion::new("2.0.0"), vec![(shared.clone(), VersionSpecifier::Exactly(v("2.0.0")))])
        .with_dependencies(picky.clone(), PinnedVersion::new("1.0.0"), vec![(shared.clone(), VersionSpecifier::Exactly(v("1.0.0")))]);

    let mut resolver = Resolver::new(&retriever);
    let mut deps = HashMap::new();
    deps.insert(root, VersionSpecifier::Exactly(v("1.0.0")));

    let result = resolver.resolve(deps, None, None, &Cancellation::new()).await.unwrap();
    assert_eq!(result.get(&shared).unwrap().commitish(), "1.0.0");
    assert_eq!(retriever.versions_call_count(&shared), 1);
}

/// S5: an unpinned `GitReference` specifier (a branch name) resolves through
/// `resolvedGitReference` rather than the general `versions` listing.
#[tokio::test]
async fn git_reference_specifier_resolves_through_the_dedicated_retriever_call() {
    let root = Dependency::github("org", "root");
    let on_branch = Dependency::github("org", "on-branch");

    let retriever = MockRetriever::new()
        .with_versions(root.clone(), ["1.0.0"])
        .with_dependencies(
            root.clone(),
            PinnedVersion::new("1.0.0"),
            vec![(on_branch.clone(), VersionSpecifier::GitReference("feature/x".to_string()))],
        )
        .with_git_reference(on_branch.clone(), "feature/x", PinnedVersion::new("abc1234"));

    let mut resolver = Resolver::new(&retriever);
    let mut deps = HashMap::new();
    deps.insert(root, VersionSpecifier::Exactly(v("1.0.0")));

    let result = resolver.resolve(deps, None, None, &Cancellation::new()).await.unwrap();
    assert_eq!(result.get(&on_branch).unwrap().commitish(), "abc1234");
    assert_eq!(retriever.versions_call_count(&on_branch), 0);
}

/// S6: two siblings with no ordering constraint between them are assigned
/// (and therefore would be emitted) in a deterministic, description-ordered
/// sequence regardless of the order their parent lists them in.
#[tokio::test]
async fn sibling_dependencies_resolve_deterministically_regardless_of_listed_order() {
    let root = Dependency::github("org", "root");
    let zzz = Dependency::github("zzz", "sibling");
    let aaa = Dependency::github("aaa", "sibling");

    let retriever = MockRetriever::new()
        .with_versions(root.clone(), ["1.0.0"])
        .with_versions(zzz.clone(), ["1.0.0"])
        .with_versions(aaa.clone(), ["1.0.0"])
        .with_dependencies(
            root.clone(),
            PinnedVersion::new("1.0.0"),
            vec![(zzz.clone(), VersionSpecifier::Any), (aaa.clone(), VersionSpecifier::Any)],
        );

    let mut resolver = Resolver::new(&retriever);
    let mut deps = HashMap::new();
    deps.insert(root, VersionSpecifier::Exactly(v("1.0.0")));

    let result = resolver.resolve(deps, None, None, &Cancellation::new()).await.unwrap();
    assert_eq!(result.get(&zzz).unwrap().commitish(), "1.0.0");
    assert_eq!(result.get(&aaa).unwrap().commitish(), "1.0.0");

    // the assignment is emitted in ascending `Dependency::description` order
    // regardless of the order `root` listed its dependencies in.
    let names: Vec<_> = result.keys().map(Dependency::description).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}

#[tokio::test]
async fn resolution_is_deterministic_across_repeated_runs() {
    let root = Dependency::github("org", "root");
    let a = Dependency::github("org", "a");
    let b = Dependency::github("org", "b");

    let build_retriever = || {
        MockRetriever::new()
            .with_versions(root.clone(), ["1.0.0"])
            .with_versions(a.clone(), ["1.0.0", "1.1.0"])
            .with_versions(b.clone(), ["1.0.0", "1.1.0"])
            .with_dependencies(
                root.clone(),
                PinnedVersion::new("1.0.0"),
                vec![(a.clone(), VersionSpecifier::Any), (b.clone(), VersionSpecifier::Any)],
            )
    };

    let retriever_one = build_retriever();
    let mut resolver_one = Resolver::new(&retriever_one);
    let mut deps_one = HashMap::new();
    deps_one.insert(root.clone(), VersionSpecifier::Exactly(v("1.0.0")));
    let first = resolver_one.resolve(deps_one, None, None, &Cancellation::new()).await.unwrap();

    let retriever_two = build_retriever();
    let mut resolver_two = Resolver::new(&retriever_two);
    let mut deps_two = HashMap::new();
    deps_two.insert(root, VersionSpecifier::Exactly(v("1.0.0")));
    let second = resolver_two.resolve(deps_two, None, None, &Cancellation::new()).await.unwrap();

    assert_eq!(first, second);
}
