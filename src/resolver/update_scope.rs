//! Update-scope computation: the transitive closure of `dependenciesToUpdate`
//! over the prior resolution's dependency graph (spec §4.6 "Update scoping"),
//! and the stable topological emission order used to compute it (spec §8 S6).

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::dependency::Dependency;
use crate::error::ResolveError;
use crate::pinned_version::PinnedVersion;
use crate::resolver::context::ResolverContext;
use crate::retriever::Retriever;

/// Builds the prior resolution's dependency graph by querying (and thereby
/// populating) the dependency cache for every `(dep, pin)` in `last_resolved`,
/// then returns the transitive closure of `dependencies_to_update`'s names.
///
/// The closure is computed by walking [`stable_topological_order`]'s
/// dependency-before-required ordering and propagating membership forward,
/// rather than an unordered stack-based DFS: this is the "topological walk"
/// spec §4.6 names, and keeps closure computation deterministic end to end
/// even though the closure itself is a set.
///
/// Returns `None` when every dependency is updatable: `last_resolved` is
/// empty (no prior solution) or `dependencies_to_update` is `None` (a full
/// re-resolution was requested).
pub async fn updatable_closure<R: Retriever>(
    context: &mut ResolverContext<'_, R>,
    last_resolved: &HashMap<Dependency, PinnedVersion>,
    dependencies_to_update: Option<&HashSet<String>>,
) -> Result<Option<HashSet<Dependency>>, ResolveError> {
    let Some(to_update) = dependencies_to_update else {
        return Ok(None);
    };
    if last_resolved.is_empty() {
        return Ok(None);
    }

    let nodes: Vec<Dependency> = last_resolved.keys().cloned().collect();
    let known: HashSet<&Dependency> = last_resolved.keys().collect();
    let mut edges: Vec<(Dependency, Dependency)> = Vec::new();
    let mut fan_outs: HashMap<Dependency, Vec<Dependency>> = HashMap::new();
    for (dep, pin) in last_resolved {
        let fan_out = context.find_dependencies(dep, pin).await?;
        let required: Vec<Dependency> = fan_out
            .into_iter()
            .map(|(required, _specifier)| required)
            .filter(|required| known.contains(required))
            .collect();
        for r in &required {
            edges.push((dep.clone(), r.clone()));
        }
        fan_outs.insert(dep.clone(), required);
    }

    let order = stable_topological_order(&nodes, &edges)?;

    let mut closure = HashSet::new();
    for dep in order {
        let seeded = to_update.contains(dep.name());
        if seeded || closure.contains(&dep) {
            closure.insert(dep.clone());
            if let Some(required) = fan_outs.get(&dep) {
                for r in required {
                    closure.insert(r.clone());
                }
            }
        }
    }

    Ok(Some(closure))
}

/// `true` iff `dependency` may diverge from its prior pin, per spec §4.6's
/// update-scoping rule.
#[must_use]
pub fn is_updatable(dependency: &Dependency, last_resolved: Option<&HashMap<Dependency, PinnedVersion>>, closure: Option<&HashSet<Dependency>>) -> bool {
    match (last_resolved, closure) {
        (None, _) => true,
        (Some(_), None) => true,
        (Some(_), Some(closure)) => closure.contains(dependency),
    }
}

/// A stable topological sort of `nodes` given directed `edges` (from a
/// dependency to what it requires): siblings with no ordering constraint
/// between them are emitted in ascending [`Dependency::description`] order
/// (spec §8 scenario S6), via the classic Kahn's-algorithm trick of always
/// popping the lexicographically least ready node instead of an arbitrary
/// one.
pub fn stable_topological_order(nodes: &[Dependency], edges: &[(Dependency, Dependency)]) -> Result<Vec<Dependency>, ResolveError> {
    let mut graph = DiGraph::<Dependency, ()>::new();
    let mut node_index: HashMap<Dependency, NodeIndex> = HashMap::new();
    for node in nodes {
        let idx = graph.add_node(node.clone());
        node_index.insert(node.clone(), idx);
    }
    for (from, to) in edges {
        let (Some(&a), Some(&b)) = (node_index.get(from), node_index.get(to)) else {
            continue;
        };
        graph.add_edge(a, b, ());
    }

    let mut in_degree: HashMap<NodeIndex, usize> = graph.node_indices().map(|idx| (idx, 0)).collect();
    for edge in graph.edge_indices() {
        let (_, target) = graph.edge_endpoints(edge).expect("edge index from this graph");
        *in_degree.entry(target).or_insert(0) += 1;
    }

    let mut ready: std::collections::BTreeSet<Dependency> =
        in_degree.iter().filter(|(_, &deg)| deg == 0).map(|(&idx, _)| graph[idx].clone()).collect();
    let mut remaining_in_degree = in_degree;
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(next) = ready.iter().next().cloned() {
        ready.remove(&next);
        order.push(next.clone());
        let idx = node_index[&next];
        for neighbor in graph.neighbors(idx) {
            let degree = remaining_in_degree.get_mut(&neighbor).expect("neighbor tracked in in_degree map");
            *degree -= 1;
            if *degree == 0 {
                ready.insert(graph[neighbor].clone());
            }
        }
    }

    if order.len() != nodes.len() {
        return Err(ResolveError::InternalInvariantViolation {
            message: "dependency graph contains a cycle".to_string(),
        });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siblings_with_no_ordering_constraint_sort_by_description() {
        let a = Dependency::github("zzz", "a");
        let b = Dependency::github("aaa", "b");
        let c = Dependency::github("mmm", "c");
        let order = stable_topological_order(&[a.clone(), b.clone(), c.clone()], &[]).unwrap();
        assert_eq!(order, vec![b, c, a]);
    }

    #[test]
    fn respects_edges_while_breaking_remaining_ties_by_description() {
        let root = Dependency::github("org", "root");
        let dep_b = Dependency::github("org", "b");
        let dep_a = Dependency::github("org", "a");
        // root -> dep_b, root -> dep_a; dep_a and dep_b have no ordering constraint
        // between themselves, so once both become ready they emit in
        // ascending description order.
        let order = stable_topological_order(
            &[root.clone(), dep_a.clone(), dep_b.clone()],
            &[(root.clone(), dep_a.clone()), (root.clone(), dep_b.clone())],
        )
        .unwrap();
        assert_eq!(order, vec![root, dep_a, dep_b]);
    }

    #[test]
    fn cycles_are_reported_as_internal_invariant_violations() {
        let a = Dependency::github("org", "a");
        let b = Dependency::github("org", "b");
        let err = stable_topological_order(&[a.clone(), b.clone()], &[(a.clone(), b.clone()), (b, a)]).unwrap_err();
        assert!(matches!(err, ResolveError::InternalInvariantViolation { .. }));
    }
}
