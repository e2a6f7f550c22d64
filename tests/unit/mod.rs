//! Algebraic invariants for the constraint and version types, run against
//! the public API only (spec §8's determinism and invariant checks not
//! already covered by the inline unit tests inside each module).

use std::collections::HashMap;

use fxpm_resolver::compatibility::invert;
use fxpm_resolver::dependency::Dependency;
use fxpm_resolver::requirements::Requirements;
use fxpm_resolver::semantic_version::SemanticVersion;
use fxpm_resolver::version_specifier::VersionSpecifier;
use proptest::prelude::*;

fn arb_version() -> impl Strategy<Value = SemanticVersion> {
    (0u64..5, 0u64..5, 0u64..5).prop_map(|(major, minor, patch)| SemanticVersion::new(major, minor, patch))
}

fn arb_specifier() -> impl Strategy<Value = VersionSpecifier> {
    prop_oneof![
        Just(VersionSpecifier::Any),
        Just(VersionSpecifier::Empty),
        arb_version().prop_map(VersionSpecifier::Exactly),
        arb_version().prop_map(VersionSpecifier::AtLeast),
        arb_version().prop_map(VersionSpecifier::CompatibleWith),
        "[a-z]{1,8}".prop_map(VersionSpecifier::GitReference),
    ]
}

proptest! {
    #[test]
    fn version_parse_print_round_trips(major in 0u64..1000, minor in 0u64..1000, patch in 0u64..1000) {
        let v = SemanticVersion::new(major, minor, patch);
        let printed = v.to_string();
        let reparsed = SemanticVersion::parse(&printed).unwrap();
        prop_assert_eq!(v, reparsed);
    }

    #[test]
    fn intersection_is_commutative(a in arb_specifier(), b in arb_specifier()) {
        prop_assert_eq!(a.intersect(&b), b.intersect(&a));
    }

    #[test]
    fn intersection_is_associative(a in arb_specifier(), b in arb_specifier(), c in arb_specifier()) {
        let left = a.intersect(&b).intersect(&c);
        let right = a.intersect(&b.intersect(&c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn any_is_the_intersection_identity_for_non_empty_specifiers(a in arb_specifier()) {
        let combined = a.intersect(&VersionSpecifier::Any);
        if a != VersionSpecifier::Empty {
            prop_assert_eq!(combined, a);
        } else {
            prop_assert_eq!(combined, VersionSpecifier::Empty);
        }
    }

    #[test]
    fn empty_absorbs_anything(a in arb_specifier()) {
        prop_assert_eq!(a.intersect(&VersionSpecifier::Empty), VersionSpecifier::Empty);
    }
}

#[test]
fn invert_is_a_bijection_over_non_duplicate_edges() {
    let parent_a = Dependency::github("org", "parent-a");
    let parent_b = Dependency::github("org", "parent-b");
    let child = Dependency::github("org", "child");

    let mut requirements = Requirements::new();
    requirements.record(Some(parent_a.clone()), child.clone(), VersionSpecifier::Any);
    requirements.record(Some(parent_b.clone()), child.clone(), VersionSpecifier::AtLeast(SemanticVersion::new(1, 0, 0)));

    let inverted = invert(&requirements).unwrap();
    let inbound = inverted.get(&child).unwrap();
    assert_eq!(inbound.len(), 2);
    let defining: Vec<_> = inbound.iter().map(|r| r.defining_dependency.clone()).collect();
    assert!(defining.contains(&Some(parent_a)));
    assert!(defining.contains(&Some(parent_b)));
}

#[test]
fn dependencies_to_update_scoping_leaves_untouched_deps_at_their_prior_pin() {
    use fxpm_resolver::pinned_version::PinnedVersion;
    use fxpm_resolver::resolver::update_scope::is_updatable;

    let updated = Dependency::github("org", "updated");
    let untouched = Dependency::github("org", "untouched");

    let mut last_resolved = HashMap::new();
    last_resolved.insert(updated.clone(), PinnedVersion::new("1.0.0"));
    last_resolved.insert(untouched.clone(), PinnedVersion::new("1.0.0"));

    let mut closure = std::collections::HashSet::new();
    closure.insert(updated.clone());

    assert!(is_updatable(&updated, Some(&last_resolved), Some(&closure)));
    assert!(!is_updatable(&untouched, Some(&last_resolved), Some(&closure)));
}
