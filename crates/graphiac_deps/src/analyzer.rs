//! Entry points for callers of the dependency engine.
//!
//! [`DependencyAnalyzer`] owns the classifier and scanner and exposes every
//! operation as a pure function of its arguments. It holds no state between
//! calls and can be shared across threads.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::DepsResult;
use crate::extractor::{DependencyExtractor, ResourceDependency};
use crate::impact::{ImpactAnalyzer, ImpactWarning};
use crate::index::{build_cross_group, GroupDependency, GroupDependencyIndex, GroupNames};
use crate::model::ResourceDescriptor;
use crate::order::DeploymentOrderer;
use crate::reference::ReferenceScanner;
use crate::sanitize::IdentifierCache;
use crate::tier::TierClassifier;

/// Resources of one group, in deployment order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPlan<'a> {
    pub group: String,
    /// Sorted by `(tier, name)`.
    pub resources: Vec<ResourceDependency<'a>>,
}

/// Group order combined with the per-resource records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentPlan<'a> {
    /// Resources outside any group. They deploy first.
    pub ungrouped: Vec<ResourceDependency<'a>>,
    pub groups: Vec<GroupPlan<'a>>,
}

impl DeploymentPlan<'_> {
    /// Group names in deployment order.
    pub fn group_order(&self) -> Vec<&str> {
        self.groups.iter().map(|plan| plan.group.as_str()).collect()
    }

    pub fn resource_count(&self) -> usize {
        self.ungrouped.len() + self.groups.iter().map(|plan| plan.resources.len()).sum::<usize>()
    }
}

/// Dependency analysis and deployment ordering over resource snapshots.
#[derive(Debug, Clone, Default)]
pub struct DependencyAnalyzer {
    classifier: TierClassifier,
    scanner: ReferenceScanner,
}

impl DependencyAnalyzer {
    /// Analyzer with the built-in tier table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with configured tier overrides.
    pub fn with_config(config: &AnalyzerConfig) -> DepsResult<Self> {
        config.validate()?;
        Ok(Self {
            classifier: TierClassifier::from_config(config),
            scanner: ReferenceScanner::new(),
        })
    }

    pub fn classifier(&self) -> &TierClassifier {
        &self.classifier
    }

    pub fn extractor(&self) -> DependencyExtractor<'_> {
        DependencyExtractor::new(&self.classifier, &self.scanner)
    }

    /// Tier and `depends_on` set for every resource, in input order.
    pub fn analyze<'r>(&self, resources: &'r [ResourceDescriptor]) -> Vec<ResourceDependency<'r>> {
        self.analyze_with_cache(resources, &mut IdentifierCache::new())
    }

    /// Same as [`analyze`](Self::analyze), reusing a caller-owned
    /// identifier cache.
    pub fn analyze_with_cache<'r>(
        &self,
        resources: &'r [ResourceDescriptor],
        cache: &mut IdentifierCache,
    ) -> Vec<ResourceDependency<'r>> {
        let extractor = self.extractor();
        let names = GroupNames::from_resources(resources, &extractor);
        let mut unknown_types = BTreeSet::new();

        let records: Vec<ResourceDependency<'r>> = resources
            .iter()
            .map(|resource| {
                if !self.classifier.is_known(&resource.resource_type) {
                    unknown_types.insert(resource.resource_type.as_str());
                }
                ResourceDependency {
                    resource,
                    tier: self.classifier.classify(&resource.resource_type),
                    depends_on: extractor.extract_with_names(resource, &names, cache),
                }
            })
            .collect();

        if !unknown_types.is_empty() {
            warn!(
                "{} unknown resource type(s) placed at tier {}: {}",
                unknown_types.len(),
                self.classifier.default_tier(),
                unknown_types.into_iter().collect::<Vec<_>>().join(", ")
            );
        }
        debug!("Analyzed {} resource(s)", records.len());

        records
    }

    /// Group edges for the snapshot.
    pub fn cross_group_dependencies(&self, resources: &[ResourceDescriptor]) -> Vec<GroupDependency> {
        build_cross_group(resources, &self.extractor())
    }

    /// Full adjacency index for the snapshot.
    pub fn group_index(&self, resources: &[ResourceDescriptor]) -> GroupDependencyIndex {
        GroupDependencyIndex::build(resources, &self.extractor())
    }

    /// Order in which the snapshot's groups can be deployed.
    ///
    /// Fails with [`crate::DepsError::CycleDetected`] when groups reference
    /// each other in a loop.
    pub fn deployment_order(&self, resources: &[ResourceDescriptor]) -> DepsResult<Vec<String>> {
        let index = self.group_index(resources);
        let groups = index.owned_groups();
        let order = DeploymentOrderer::order(&groups, index.edges())?;
        info!(
            "Ordered {} group(s) across {} cross-group edge(s)",
            order.len(),
            index.edges().len()
        );
        Ok(order)
    }

    /// Deployment order with each group's resources sorted by tier.
    pub fn plan<'r>(&self, resources: &'r [ResourceDescriptor]) -> DepsResult<DeploymentPlan<'r>> {
        let order = self.deployment_order(resources)?;
        let extractor = self.extractor();
        let names = GroupNames::from_resources(resources, &extractor);

        let mut ungrouped = Vec::new();
        let mut buckets: BTreeMap<String, Vec<ResourceDependency<'r>>> = BTreeMap::new();
        for record in self.analyze(resources) {
            match extractor.owning_group(record.resource) {
                Some(group) if names.is_owned(group) => {
                    buckets.entry(names.canonical(group)).or_default().push(record);
                }
                _ => ungrouped.push(record),
            }
        }

        ungrouped.sort_by(|a, b| by_tier_then_name(a, b));
        let groups = order
            .into_iter()
            .map(|group| {
                let mut resources = buckets.remove(&group).unwrap_or_default();
                resources.sort_by(|a, b| by_tier_then_name(a, b));
                GroupPlan { group, resources }
            })
            .collect();

        Ok(DeploymentPlan { ungrouped, groups })
    }

    /// Warnings for every group edge whose target is not in
    /// `surviving_groups`.
    pub fn impact_of_removal(
        &self,
        resources: &[ResourceDescriptor],
        surviving_groups: &BTreeSet<String>,
    ) -> Vec<ImpactWarning> {
        let edges = self.cross_group_dependencies(resources);
        ImpactAnalyzer::check_group_removal(&edges, surviving_groups)
    }

    /// Warnings for references that a move of resources between groups
    /// would leave dangling.
    pub fn impact_of_move(
        &self,
        current: &[ResourceDescriptor],
        proposed: &[ResourceDescriptor],
    ) -> Vec<ImpactWarning> {
        ImpactAnalyzer::check_resource_move(current, proposed, &self.extractor())
    }
}

fn by_tier_then_name(a: &ResourceDependency<'_>, b: &ResourceDependency<'_>) -> std::cmp::Ordering {
    a.tier
        .cmp(&b.tier)
        .then_with(|| a.resource.name.cmp(&b.resource.name))
        .then_with(|| a.resource.resource_type.cmp(&b.resource.resource_type))
}
