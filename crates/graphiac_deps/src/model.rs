//! Resource descriptors and their property trees.
//!
//! Discovered resources arrive as loosely typed property blobs. They are
//! modeled as a tagged union so that reference scanning is a plain recursive
//! walk instead of runtime type inspection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value inside a resource's property tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl Default for PropertyValue {
    fn default() -> Self {
        PropertyValue::Map(BTreeMap::new())
    }
}

impl PropertyValue {
    /// Walk the tree depth-first, handing every string leaf to the visitor.
    ///
    /// Map entries are visited in key order, so the walk is deterministic.
    pub fn walk<V: PropertyVisitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            PropertyValue::String(value) => visitor.visit_str(value),
            PropertyValue::List(items) => {
                for item in items {
                    item.walk(visitor);
                }
            }
            PropertyValue::Map(entries) => {
                for value in entries.values() {
                    value.walk(visitor);
                }
            }
            PropertyValue::Null | PropertyValue::Bool(_) | PropertyValue::Number(_) => {}
        }
    }

    /// Whether the tree holds nothing worth scanning.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Null => true,
            PropertyValue::List(items) => items.is_empty(),
            PropertyValue::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PropertyValue::Null,
            serde_json::Value::Bool(b) => PropertyValue::Bool(b),
            serde_json::Value::Number(n) => PropertyValue::Number(n),
            serde_json::Value::String(s) => PropertyValue::String(s),
            serde_json::Value::Array(items) => {
                PropertyValue::List(items.into_iter().map(PropertyValue::from).collect())
            }
            serde_json::Value::Object(entries) => PropertyValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, PropertyValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

/// Receives string leaves from [`PropertyValue::walk`].
pub trait PropertyVisitor {
    fn visit_str(&mut self, value: &str);
}

/// A discovered cloud resource, as handed over by the discovery step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Provider type string, e.g. `Microsoft.Network/virtualNetworks`.
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Containing deployment group. Absent for group-less kinds.
    #[serde(default, alias = "resourceGroup", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Fully-qualified identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: PropertyValue,
}

impl ResourceDescriptor {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            group: None,
            id: None,
            properties: PropertyValue::default(),
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_properties(mut self, properties: impl Into<PropertyValue>) -> Self {
        self.properties = properties.into();
        self
    }

    /// The containing group, treating an empty string as absent.
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().filter(|g| !g.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Collect(Vec<String>);

    impl PropertyVisitor for Collect {
        fn visit_str(&mut self, value: &str) {
            self.0.push(value.to_string());
        }
    }

    #[test]
    fn test_walk_visits_nested_strings_in_key_order() {
        let tree = PropertyValue::from(json!({
            "b": ["x", {"deep": "y"}, 3, true, null],
            "a": "z"
        }));

        let mut collect = Collect(Vec::new());
        tree.walk(&mut collect);

        assert_eq!(collect.0, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let descriptor: ResourceDescriptor = serde_json::from_value(json!({
            "type": "Microsoft.Network/virtualNetworks",
            "name": "vnet1",
            "resourceGroup": "rg-network"
        }))
        .unwrap();

        assert_eq!(descriptor.group_name(), Some("rg-network"));
        assert!(descriptor.id.is_none());
        assert!(descriptor.properties.is_empty());
    }

    #[test]
    fn test_empty_group_is_treated_as_absent() {
        let descriptor = ResourceDescriptor::new("Microsoft.Graph/users", "alice").in_group("");
        assert_eq!(descriptor.group_name(), None);
    }

    #[test]
    fn test_property_tree_from_yaml() {
        let tree: PropertyValue = serde_yaml::from_str("subnets:\n  - id: abc\n    size: 24\n").unwrap();

        let mut collect = Collect(Vec::new());
        tree.walk(&mut collect);

        assert_eq!(collect.0, vec!["abc"]);
    }
}
