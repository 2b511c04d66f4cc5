//! Embedded reference scanning.
//!
//! Resource property blobs point at other resources through fully-qualified
//! identifiers:
//!
//! ```text
//! /subscriptions/{sub}/resourceGroups/{group}/providers/{ns}/{type}/{name}[/{type}/{name}...]
//! ```
//!
//! Anything that does not have this shape is ignored. Missing a reference
//! only leaves the graph under-connected, which is safe.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::trace;

use crate::model::{PropertyValue, PropertyVisitor};

const REFERENCE_PATTERN: &str = r"(?i)^/subscriptions/([^/\s]+)/resourcegroups/([^/\s]+)((?:/providers/[^/\s]+(?:/[^/\s]+/[^/\s]+)+)?)/?$";

/// A parsed cross-resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceReference {
    /// The identifier exactly as found in the property tree.
    pub raw: String,
    pub subscription: String,
    /// Target group, as spelled in the identifier.
    pub group: String,
    /// Provider type, e.g. `Microsoft.Network/virtualNetworks/subnets`.
    /// `None` when the identifier names the group itself.
    pub resource_type: Option<String>,
    /// Resource name; child resources join parent names with `/`.
    pub name: Option<String>,
}

impl ResourceReference {
    /// Whether the identifier points at the group rather than a resource.
    pub fn targets_group(&self) -> bool {
        self.name.is_none()
    }

    /// The last name segment, e.g. `subnet1` for `vnet1/subnet1`.
    pub fn leaf_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(|name| name.rsplit('/').next().unwrap_or(name))
    }

    /// Whether `name` identifies the referenced resource, either by its full
    /// child path or by its leaf segment.
    pub fn names(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name) || self.leaf_name() == Some(name)
    }
}

/// Extracts cross-resource identifiers from property trees.
#[derive(Debug, Clone)]
pub struct ReferenceScanner {
    pattern: Regex,
}

impl ReferenceScanner {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(REFERENCE_PATTERN).expect("reference pattern compiles"),
        }
    }

    /// Every string in the tree that is shaped like a resource identifier.
    pub fn scan(&self, properties: &PropertyValue) -> BTreeSet<String> {
        let mut collector = ReferenceCollector {
            pattern: &self.pattern,
            found: BTreeSet::new(),
        };
        properties.walk(&mut collector);
        collector.found
    }

    /// Scan and parse in one go. Results are ordered by raw identifier.
    pub fn references(&self, properties: &PropertyValue) -> Vec<ResourceReference> {
        self.scan(properties)
            .into_iter()
            .filter_map(|raw| self.parse(&raw))
            .collect()
    }

    /// Parse a single identifier. Returns `None` for anything malformed.
    pub fn parse(&self, raw: &str) -> Option<ResourceReference> {
        let captures = self.pattern.captures(raw.trim())?;
        let subscription = captures.get(1)?.as_str().to_string();
        let group = captures.get(2)?.as_str().to_string();
        let tail = captures.get(3).map(|m| m.as_str()).unwrap_or_default();

        let (resource_type, name) = parse_provider_path(tail);

        Some(ResourceReference {
            raw: raw.to_string(),
            subscription,
            group,
            resource_type,
            name,
        })
    }
}

impl Default for ReferenceScanner {
    fn default() -> Self {
        Self::new()
    }
}

struct ReferenceCollector<'a> {
    pattern: &'a Regex,
    found: BTreeSet<String>,
}

impl PropertyVisitor for ReferenceCollector<'_> {
    fn visit_str(&mut self, value: &str) {
        let candidate = value.trim();
        if self.pattern.is_match(candidate) {
            self.found.insert(candidate.to_string());
        } else if candidate.to_ascii_lowercase().starts_with("/subscriptions/") {
            trace!("Skipping malformed resource identifier '{}'", candidate);
        }
    }
}

/// Split `/providers/{ns}/{type}/{name}/...` into a type path and a name path.
///
/// Extension resources (a nested `/providers/` segment) resolve to the
/// resource they extend.
fn parse_provider_path(tail: &str) -> (Option<String>, Option<String>) {
    let mut segments = tail.split('/').filter(|s| !s.is_empty());
    // Leading "providers" keyword.
    if segments.next().is_none() {
        return (None, None);
    }
    let Some(namespace) = segments.next() else {
        return (None, None);
    };

    let mut types = vec![namespace];
    let mut names = Vec::new();
    while let (Some(ty), Some(name)) = (segments.next(), segments.next()) {
        if ty.eq_ignore_ascii_case("providers") {
            break;
        }
        types.push(ty);
        names.push(name);
    }

    if names.is_empty() {
        return (None, None);
    }
    (Some(types.join("/")), Some(names.join("/")))
}
