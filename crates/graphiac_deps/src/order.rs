//! Deployment ordering of groups.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, warn};

use crate::error::{DepsError, DepsResult};
use crate::index::GroupDependency;

/// Orders groups so every group comes after the groups it depends on.
pub struct DeploymentOrderer;

impl DeploymentOrderer {
    /// Topologically sort `groups` along `edges`.
    ///
    /// Ties are broken lexicographically so identical input always yields an
    /// identical order. Edges touching a group outside `groups` are ignored.
    /// A cycle fails the whole call; no partial order is returned.
    pub fn order(groups: &BTreeSet<String>, edges: &[GroupDependency]) -> DepsResult<Vec<String>> {
        let mut dependencies: BTreeMap<&str, BTreeSet<&str>> =
            groups.iter().map(|g| (g.as_str(), BTreeSet::new())).collect();
        let mut dependents: BTreeMap<&str, BTreeSet<&str>> =
            groups.iter().map(|g| (g.as_str(), BTreeSet::new())).collect();

        for edge in edges {
            let source = edge.source_group.as_str();
            let target = edge.target_group.as_str();
            if source == target {
                continue;
            }
            if !groups.contains(source) || !groups.contains(target) {
                debug!(
                    "Ignoring edge {} -> {} outside the ordered groups",
                    source, target
                );
                continue;
            }
            if let Some(deps) = dependencies.get_mut(source) {
                deps.insert(target);
            }
            if let Some(deps) = dependents.get_mut(target) {
                deps.insert(source);
            }
        }

        let mut in_degree: BTreeMap<&str, usize> = dependencies
            .iter()
            .map(|(group, deps)| (*group, deps.len()))
            .collect();
        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(group, _)| *group)
            .collect();

        let mut ordered = Vec::with_capacity(groups.len());
        while let Some(group) = ready.pop_first() {
            ordered.push(group.to_string());
            for &dependent in &dependents[group] {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if ordered.len() < groups.len() {
            let resolved: BTreeSet<&str> = ordered.iter().map(String::as_str).collect();
            let residual: BTreeSet<&str> = groups
                .iter()
                .map(String::as_str)
                .filter(|g| !resolved.contains(g))
                .collect();
            let cycles = find_cycles(&residual, &dependencies);

            warn!(
                "Cannot order {} group(s): {} cycle(s) detected",
                residual.len(),
                cycles.len()
            );
            return Err(DepsError::CycleDetected {
                groups: residual.into_iter().map(str::to_string).collect(),
                cycles,
            });
        }

        Ok(ordered)
    }
}

/// Strongly connected components of the residual subgraph that form a
/// cycle. Each component is sorted and components are sorted among
/// themselves.
fn find_cycles(
    residual: &BTreeSet<&str>,
    dependencies: &BTreeMap<&str, BTreeSet<&str>>,
) -> Vec<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for &group in residual {
        graph.add_node(group);
        if let Some(targets) = dependencies.get(group) {
            for &target in targets.iter().filter(|t| residual.contains(*t)) {
                graph.add_edge(group, target, ());
            }
        }
    }

    let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .map(|component| {
            let mut names: Vec<String> = component.into_iter().map(str::to_string).collect();
            names.sort();
            names
        })
        .collect();
    cycles.sort();
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn edge(source: &str, target: &str) -> GroupDependency {
        GroupDependency {
            source_group: source.to_string(),
            target_group: target.to_string(),
            count: 1,
            resources: vec![format!("{}-res", source)],
        }
    }

    #[test]
    fn test_independent_groups_sort_lexicographically() {
        let order = DeploymentOrderer::order(&groups(&["zebra", "apple", "mango"]), &[]).unwrap();
        assert_eq!(order, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_targets_come_before_sources() {
        let edges = vec![edge("app", "network"), edge("app", "data"), edge("data", "network")];
        let order =
            DeploymentOrderer::order(&groups(&["app", "data", "network"]), &edges).unwrap();
        assert_eq!(order, vec!["network", "data", "app"]);
    }

    #[test]
    fn test_ready_queue_tie_break_after_release() {
        // "b" and "c" both unlock after "a"; "a0" is independent.
        let edges = vec![edge("c", "a"), edge("b", "a")];
        let order = DeploymentOrderer::order(&groups(&["a", "a0", "b", "c"]), &edges).unwrap();
        assert_eq!(order, vec!["a", "a0", "b", "c"]);
    }

    #[test]
    fn test_two_group_cycle_is_fatal() {
        let edges = vec![edge("A", "B"), edge("B", "A")];
        let err = DeploymentOrderer::order(&groups(&["A", "B"]), &edges).unwrap_err();

        match err {
            DepsError::CycleDetected { groups, cycles } => {
                assert!(groups.contains("A"));
                assert!(groups.contains("B"));
                assert_eq!(cycles, vec![vec!["A".to_string(), "B".to_string()]]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_residual_includes_groups_blocked_by_cycle() {
        // "downstream" is not on the cycle but can never be released.
        let edges = vec![edge("x", "y"), edge("y", "x"), edge("downstream", "x"), edge("x", "base")];
        let err = DeploymentOrderer::order(&groups(&["base", "downstream", "x", "y"]), &edges)
            .unwrap_err();

        match err {
            DepsError::CycleDetected { groups, cycles } => {
                assert_eq!(
                    groups,
                    BTreeSet::from(["downstream".to_string(), "x".to_string(), "y".to_string()])
                );
                assert_eq!(cycles, vec![vec!["x".to_string(), "y".to_string()]]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_long_ring_is_reported_as_one_cycle() {
        let names: Vec<String> = (0..10_000).map(|i| format!("g{:06}", i)).collect();
        let edges: Vec<GroupDependency> = names
            .iter()
            .enumerate()
            .map(|(i, name)| edge(name, &names[(i + 1) % names.len()]))
            .collect();
        let set: BTreeSet<String> = names.iter().cloned().collect();

        match DeploymentOrderer::order(&set, &edges).unwrap_err() {
            DepsError::CycleDetected { groups, cycles } => {
                assert_eq!(groups.len(), names.len());
                assert_eq!(cycles.len(), 1);
                assert_eq!(cycles[0], names);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_edges_outside_group_set_are_ignored() {
        let edges = vec![edge("app", "external")];
        let order = DeploymentOrderer::order(&groups(&["app"]), &edges).unwrap();
        assert_eq!(order, vec!["app"]);
    }

    #[test]
    fn test_order_is_deterministic() {
        let edges = vec![edge("b", "a"), edge("d", "c"), edge("d", "b")];
        let set = groups(&["d", "c", "b", "a", "e"]);
        assert_eq!(
            DeploymentOrderer::order(&set, &edges).unwrap(),
            DeploymentOrderer::order(&set, &edges).unwrap()
        );
    }
}
