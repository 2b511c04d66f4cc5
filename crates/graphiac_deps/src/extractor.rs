//! Per-resource dependency extraction.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::trace;

use crate::index::GroupNames;
use crate::model::ResourceDescriptor;
use crate::reference::{ReferenceScanner, ResourceReference};
use crate::sanitize::IdentifierCache;
use crate::tier::{is_group_root, normalize_type, TierClassifier};

/// Tier and `depends_on` edges for one input resource.
///
/// This is the record the code emitter consumes directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDependency<'a> {
    pub resource: &'a ResourceDescriptor,
    pub tier: u32,
    /// Sanitized identifiers of the resource's own group and of the
    /// resources it references inside that group.
    pub depends_on: BTreeSet<String>,
}

/// Builds the `depends_on` set of a resource.
///
/// Cross-group references are not returned here; they are aggregated by
/// [`crate::index::build_cross_group`].
#[derive(Debug, Clone, Copy)]
pub struct DependencyExtractor<'a> {
    classifier: &'a TierClassifier,
    scanner: &'a ReferenceScanner,
}

impl<'a> DependencyExtractor<'a> {
    pub fn new(classifier: &'a TierClassifier, scanner: &'a ReferenceScanner) -> Self {
        Self { classifier, scanner }
    }

    pub fn extract(&self, resource: &ResourceDescriptor) -> BTreeSet<String> {
        self.extract_with_cache(resource, &mut IdentifierCache::new())
    }

    pub fn extract_with_cache(
        &self,
        resource: &ResourceDescriptor,
        cache: &mut IdentifierCache,
    ) -> BTreeSet<String> {
        self.collect(resource, None, cache)
    }

    /// Same as [`extract_with_cache`](Self::extract_with_cache), spelling
    /// group and resource names the way the rest of the snapshot does.
    pub fn extract_with_names(
        &self,
        resource: &ResourceDescriptor,
        names: &GroupNames,
        cache: &mut IdentifierCache,
    ) -> BTreeSet<String> {
        self.collect(resource, Some(names), cache)
    }

    fn collect(
        &self,
        resource: &ResourceDescriptor,
        names: Option<&GroupNames>,
        cache: &mut IdentifierCache,
    ) -> BTreeSet<String> {
        let mut depends_on = BTreeSet::new();
        let group = self.owning_group(resource);

        if let Some(group) = group {
            if !is_group_root(&resource.resource_type) {
                let spelled = names.map_or_else(|| group.to_string(), |n| n.canonical(group));
                depends_on.insert(cache.get(&spelled));
            }
        }

        let mut cross_group = 0usize;
        for reference in self.scanner.references(&resource.properties) {
            let same_group = group.is_some_and(|g| g.eq_ignore_ascii_case(&reference.group));
            if !same_group {
                cross_group += 1;
                continue;
            }
            if is_self_reference(resource, &reference) {
                continue;
            }
            if let Some(name) = reference.name.as_deref() {
                let spelled = names.map_or_else(
                    || name.to_string(),
                    |n| n.canonical_resource(&reference.group, name),
                );
                depends_on.insert(cache.get(&spelled));
            }
        }

        if cross_group > 0 {
            trace!(
                "Resource '{}' carries {} cross-group reference(s)",
                resource.name,
                cross_group
            );
        }

        depends_on
    }

    /// The group a resource is deployed into, or `None` for group-less
    /// kinds and resources without a group. A group root owns the group it
    /// names.
    pub fn owning_group<'r>(&self, resource: &'r ResourceDescriptor) -> Option<&'r str> {
        if self.classifier.is_groupless(&resource.resource_type) {
            return None;
        }
        if is_group_root(&resource.resource_type) {
            return resource
                .group_name()
                .or(Some(resource.name.as_str()).filter(|n| !n.is_empty()));
        }
        resource.group_name()
    }

    pub fn scanner(&self) -> &'a ReferenceScanner {
        self.scanner
    }
}

fn is_self_reference(resource: &ResourceDescriptor, reference: &ResourceReference) -> bool {
    if let Some(id) = resource.id.as_deref() {
        if id.trim().eq_ignore_ascii_case(reference.raw.trim()) {
            return true;
        }
    }
    let same_type = reference.resource_type.as_deref().map_or(true, |ty| {
        ty.eq_ignore_ascii_case(normalize_type(&resource.resource_type))
    });
    same_type && reference.names(&resource.name)
}
