//! Group-to-group dependency index.
//!
//! Resource-level references that cross group boundaries are aggregated into
//! weighted group edges. The index is the input for ordering and for impact
//! analysis.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extractor::DependencyExtractor;
use crate::model::ResourceDescriptor;
use crate::reference::ResourceReference;
use crate::tier::is_group_root;

/// A dependency of one group on another, with provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDependency {
    /// Group holding the referencing resources.
    pub source_group: String,
    /// Group holding the referenced resources.
    pub target_group: String,
    /// Number of resource-level references behind this edge.
    pub count: usize,
    /// Names of the referencing resources, de-duplicated, in order of first
    /// appearance.
    pub resources: Vec<String>,
}

/// One resource-level reference that crosses a group boundary.
#[derive(Debug, Clone)]
pub struct CrossGroupReference<'a> {
    pub source: &'a ResourceDescriptor,
    pub source_group: String,
    pub target_group: String,
    pub reference: ResourceReference,
}

/// Case-insensitive group and resource identity.
///
/// Cloud names compare case-insensitively. A group is spelled the way its
/// group root names it, else the way the first resource that owns it does.
/// Resources are spelled the way their own descriptor does.
#[derive(Debug, Clone, Default)]
pub struct GroupNames {
    spellings: HashMap<String, String>,
    resources: HashMap<(String, String), String>,
}

impl GroupNames {
    pub fn from_resources(resources: &[ResourceDescriptor], extractor: &DependencyExtractor<'_>) -> Self {
        let mut names = Self::default();
        let (roots, members): (Vec<_>, Vec<_>) = resources
            .iter()
            .partition(|resource| is_group_root(&resource.resource_type));

        for resource in roots.into_iter().chain(members) {
            let Some(group) = extractor.owning_group(resource) else {
                continue;
            };
            let key = group.to_ascii_lowercase();
            names
                .spellings
                .entry(key.clone())
                .or_insert_with(|| group.to_string());
            names
                .resources
                .entry((key, resource.name.to_ascii_lowercase()))
                .or_insert_with(|| resource.name.clone());
        }
        names
    }

    /// Canonical spelling, or `name` itself for groups nobody owns.
    pub fn canonical(&self, name: &str) -> String {
        self.spellings
            .get(&name.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// Spelling of resource `name` in `group`, or `name` itself when the
    /// snapshot holds no such resource.
    pub fn canonical_resource(&self, group: &str, name: &str) -> String {
        self.resources
            .get(&(group.to_ascii_lowercase(), name.to_ascii_lowercase()))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn is_owned(&self, name: &str) -> bool {
        self.spellings.contains_key(&name.to_ascii_lowercase())
    }
}

/// Every reference in `resources` whose target group differs from the
/// referencing resource's own group, in input order.
pub fn cross_group_references<'a>(
    resources: &'a [ResourceDescriptor],
    extractor: &DependencyExtractor<'_>,
    names: &GroupNames,
) -> Vec<CrossGroupReference<'a>> {
    let mut found = Vec::new();
    for resource in resources {
        let Some(group) = extractor.owning_group(resource) else {
            continue;
        };
        let source_group = names.canonical(group);

        for reference in extractor.scanner().references(&resource.properties) {
            let target_group = names.canonical(&reference.group);
            if target_group == source_group {
                continue;
            }
            found.push(CrossGroupReference {
                source: resource,
                source_group: source_group.clone(),
                target_group,
                reference,
            });
        }
    }
    found
}

/// Aggregate cross-group references into one edge per group pair.
///
/// Edges are returned sorted by `(source_group, target_group)`.
pub fn build_cross_group(
    resources: &[ResourceDescriptor],
    extractor: &DependencyExtractor<'_>,
) -> Vec<GroupDependency> {
    let names = GroupNames::from_resources(resources, extractor);
    aggregate(&cross_group_references(resources, extractor, &names))
}

pub(crate) fn aggregate(references: &[CrossGroupReference<'_>]) -> Vec<GroupDependency> {
    let mut edges: BTreeMap<(String, String), GroupDependency> = BTreeMap::new();
    for reference in references {
        let edge = edges
            .entry((reference.source_group.clone(), reference.target_group.clone()))
            .or_insert_with(|| GroupDependency {
                source_group: reference.source_group.clone(),
                target_group: reference.target_group.clone(),
                count: 0,
                resources: Vec::new(),
            });
        edge.count += 1;
        if !edge.resources.contains(&reference.source.name) {
            edge.resources.push(reference.source.name.clone());
        }
    }
    edges.into_values().collect()
}

/// Dependencies and dependents of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupNode {
    /// Resources owned by the group. Zero for groups that are only
    /// referenced.
    pub resource_count: usize,
    /// Groups this group depends on.
    pub dependencies: BTreeSet<String>,
    /// Groups that depend on this group.
    pub dependents: BTreeSet<String>,
}

/// Adjacency view over group edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupDependencyIndex {
    nodes: BTreeMap<String, GroupNode>,
    edges: Vec<GroupDependency>,
}

impl GroupDependencyIndex {
    /// Build the index for a resource snapshot.
    pub fn build(resources: &[ResourceDescriptor], extractor: &DependencyExtractor<'_>) -> Self {
        let names = GroupNames::from_resources(resources, extractor);

        let mut owned: BTreeMap<String, usize> = BTreeMap::new();
        for resource in resources {
            if let Some(group) = extractor.owning_group(resource) {
                *owned.entry(names.canonical(group)).or_default() += 1;
            }
        }

        let edges = aggregate(&cross_group_references(resources, extractor, &names));
        Self::from_parts(owned, edges)
    }

    /// Assemble an index from owned-group counts and edges.
    pub fn from_parts(owned: BTreeMap<String, usize>, edges: Vec<GroupDependency>) -> Self {
        let mut nodes: BTreeMap<String, GroupNode> = owned
            .into_iter()
            .map(|(group, resource_count)| {
                (
                    group,
                    GroupNode {
                        resource_count,
                        ..GroupNode::default()
                    },
                )
            })
            .collect();

        let mut kept = Vec::with_capacity(edges.len());
        for edge in edges {
            if edge.source_group == edge.target_group {
                debug!("Discarding self-edge on group '{}'", edge.source_group);
                continue;
            }
            nodes
                .entry(edge.source_group.clone())
                .or_default()
                .dependencies
                .insert(edge.target_group.clone());
            nodes
                .entry(edge.target_group.clone())
                .or_default()
                .dependents
                .insert(edge.source_group.clone());
            kept.push(edge);
        }

        Self { nodes, edges: kept }
    }

    /// All groups, owned or only referenced.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Groups that own at least one resource.
    pub fn owned_groups(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.resource_count > 0)
            .map(|(group, _)| group.clone())
            .collect()
    }

    pub fn node(&self, group: &str) -> Option<&GroupNode> {
        self.nodes.get(group)
    }

    pub fn dependencies_of(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(group).map(|node| &node.dependencies)
    }

    pub fn dependents_of(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.nodes.get(group).map(|node| &node.dependents)
    }

    pub fn edges(&self) -> &[GroupDependency] {
        &self.edges
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&GroupDependency> {
        self.edges
            .iter()
            .find(|edge| edge.source_group == source && edge.target_group == target)
    }

    /// Every group that depends on `group`, directly or indirectly.
    pub fn transitive_dependents(&self, group: &str) -> BTreeSet<String> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([group]);

        while let Some(current) = queue.pop_front() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            for dependent in &node.dependents {
                if dependent != group && seen.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
