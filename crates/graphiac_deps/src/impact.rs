//! What-if analysis for topology changes.
//!
//! Both checks are best effort: they report every severed group edge they
//! can prove, and stay silent about references they cannot resolve.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::extractor::DependencyExtractor;
use crate::index::{aggregate, cross_group_references, GroupDependency, GroupNames};
use crate::model::ResourceDescriptor;
use crate::reference::ResourceReference;

/// What kind of change severs the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactKind {
    GroupRemoved,
    ResourceMoved,
}

/// A reference that a proposed change would break.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactWarning {
    pub kind: ImpactKind,
    pub message: String,
    pub source_group: String,
    pub target_group: String,
    /// Resources whose references would dangle.
    pub resources: Vec<String>,
    /// The group edge the warning originates from.
    pub dependency: GroupDependency,
}

impl fmt::Display for ImpactWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Warnings produced by one impact check.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImpactReport {
    pub warnings: Vec<ImpactWarning>,
}

impl ImpactReport {
    pub fn new(warnings: Vec<ImpactWarning>) -> Self {
        Self { warnings }
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Groups holding at least one resource with a dangling reference.
    pub fn affected_groups(&self) -> BTreeSet<String> {
        self.warnings
            .iter()
            .map(|warning| warning.source_group.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Checks proposed restructurings against existing group edges.
pub struct ImpactAnalyzer;

impl ImpactAnalyzer {
    /// One warning per edge whose target group does not survive.
    ///
    /// Group names are compared case-insensitively.
    pub fn check_group_removal(
        edges: &[GroupDependency],
        surviving_groups: &BTreeSet<String>,
    ) -> Vec<ImpactWarning> {
        let surviving: HashSet<String> = surviving_groups
            .iter()
            .map(|group| group.to_ascii_lowercase())
            .collect();

        edges
            .iter()
            .filter(|edge| !surviving.contains(&edge.target_group.to_ascii_lowercase()))
            .map(|edge| ImpactWarning {
                kind: ImpactKind::GroupRemoved,
                message: format!(
                    "Group '{}' depends on removed group '{}' ({} reference(s) from: {})",
                    edge.source_group,
                    edge.target_group,
                    edge.count,
                    edge.resources.join(", ")
                ),
                source_group: edge.source_group.clone(),
                target_group: edge.target_group.clone(),
                resources: edge.resources.clone(),
                dependency: edge.clone(),
            })
            .collect()
    }

    /// One warning per cross-group reference whose target resource changes
    /// group between `current` and `proposed`.
    ///
    /// Targets are matched by name (and type, when the reference carries
    /// one). Targets missing from either snapshot are skipped.
    pub fn check_resource_move(
        current: &[ResourceDescriptor],
        proposed: &[ResourceDescriptor],
        extractor: &DependencyExtractor<'_>,
    ) -> Vec<ImpactWarning> {
        let names = GroupNames::from_resources(current, extractor);
        let references = cross_group_references(current, extractor, &names);
        let edges = aggregate(&references);
        let edges_by_pair: HashMap<(&str, &str), &GroupDependency> = edges
            .iter()
            .map(|edge| ((edge.source_group.as_str(), edge.target_group.as_str()), edge))
            .collect();

        let current_by_name = index_by_name(current);
        let mut proposed_groups_by_key: HashMap<(&str, String), Vec<&str>> = HashMap::new();
        for candidate in proposed {
            if let Some(group) = extractor.owning_group(candidate) {
                proposed_groups_by_key
                    .entry((candidate.name.as_str(), candidate.resource_type.to_ascii_lowercase()))
                    .or_default()
                    .push(group);
            }
        }

        let mut reported: HashSet<(String, String)> = HashSet::new();
        let mut warnings = Vec::new();

        for crossing in &references {
            let reference = &crossing.reference;
            let Some(target) = find_target(&current_by_name, reference, |candidate| {
                extractor
                    .owning_group(candidate)
                    .is_some_and(|g| g.eq_ignore_ascii_case(&crossing.target_group))
            }) else {
                continue;
            };

            let key = (target.name.as_str(), target.resource_type.to_ascii_lowercase());
            let Some(proposed_groups) = proposed_groups_by_key.get(&key) else {
                continue;
            };
            if proposed_groups
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&crossing.target_group))
            {
                continue;
            }
            let new_group = proposed_groups[0];

            if !reported.insert((crossing.source.name.clone(), target.name.clone())) {
                continue;
            }

            let pair = (crossing.source_group.as_str(), crossing.target_group.as_str());
            let Some(dependency) = edges_by_pair.get(&pair) else {
                continue;
            };

            debug!(
                "Resource '{}' moves from '{}' to '{}'",
                target.name, crossing.target_group, new_group
            );
            warnings.push(ImpactWarning {
                kind: ImpactKind::ResourceMoved,
                message: format!(
                    "Resource '{}' moves from group '{}' to '{}': '{}' in group '{}' still references {}",
                    target.name,
                    crossing.target_group,
                    new_group,
                    crossing.source.name,
                    crossing.source_group,
                    reference.raw
                ),
                source_group: crossing.source_group.clone(),
                target_group: crossing.target_group.clone(),
                resources: vec![crossing.source.name.clone()],
                dependency: (*dependency).clone(),
            });
        }

        warnings
    }
}

/// Resources keyed by name, each with its position in the snapshot.
fn index_by_name(resources: &[ResourceDescriptor]) -> HashMap<&str, Vec<(usize, &ResourceDescriptor)>> {
    let mut by_name: HashMap<&str, Vec<(usize, &ResourceDescriptor)>> = HashMap::new();
    for (position, resource) in resources.iter().enumerate() {
        by_name
            .entry(resource.name.as_str())
            .or_default()
            .push((position, resource));
    }
    by_name
}

/// First resource in snapshot order that `reference` names and that
/// passes `accept`.
fn find_target<'r>(
    by_name: &HashMap<&str, Vec<(usize, &'r ResourceDescriptor)>>,
    reference: &ResourceReference,
    accept: impl Fn(&ResourceDescriptor) -> bool,
) -> Option<&'r ResourceDescriptor> {
    let full = reference.name.as_deref();
    let leaf = reference.leaf_name().filter(|leaf| Some(*leaf) != full);

    [full, leaf]
        .into_iter()
        .flatten()
        .filter_map(|name| by_name.get(name))
        .flatten()
        .filter(|&&(_, candidate)| matches_reference(candidate, reference) && accept(candidate))
        .min_by_key(|&&(position, _)| position)
        .map(|&(_, candidate)| candidate)
}

fn matches_reference(candidate: &ResourceDescriptor, reference: &ResourceReference) -> bool {
    let type_matches = reference
        .resource_type
        .as_deref()
        .map_or(true, |ty| ty.eq_ignore_ascii_case(&candidate.resource_type));
    type_matches && reference.names(&candidate.name)
}
