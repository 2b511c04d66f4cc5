//! # graphiac_deps
//!
//! Dependency analysis and deployment ordering for discovered cloud
//! resources.
//!
//! Given an unordered snapshot of resources, this crate:
//!
//! - classifies each resource into a deployment tier
//! - finds the resources and groups it depends on by scanning its property
//!   tree for embedded resource identifiers
//! - orders deployment groups deterministically and reports cycles
//! - answers what-if questions about removing groups or moving resources
//!
//! Every operation is synchronous and side-effect free.
//!
//! ## Example
//!
//! ```rust
//! use graphiac_deps::{DependencyAnalyzer, ResourceDescriptor};
//! use serde_json::json;
//!
//! let resources = vec![
//!     ResourceDescriptor::new("Microsoft.Network/networkInterfaces", "nic1").in_group("rg-network"),
//!     ResourceDescriptor::new("Microsoft.Compute/virtualMachines", "vm1")
//!         .in_group("rg-compute")
//!         .with_properties(json!({
//!             "nic": "/subscriptions/0000/resourceGroups/rg-network/providers/Microsoft.Network/networkInterfaces/nic1"
//!         })),
//! ];
//!
//! let analyzer = DependencyAnalyzer::new();
//! let order = analyzer.deployment_order(&resources).unwrap();
//! assert_eq!(order, vec!["rg-network", "rg-compute"]);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod extractor;
pub mod impact;
pub mod index;
pub mod model;
pub mod order;
pub mod reference;
pub mod sanitize;
pub mod source;
pub mod tier;

pub use analyzer::{DependencyAnalyzer, DeploymentPlan, GroupPlan};
pub use config::AnalyzerConfig;
pub use error::{DepsError, DepsResult};
pub use extractor::{DependencyExtractor, ResourceDependency};
pub use impact::{ImpactAnalyzer, ImpactKind, ImpactReport, ImpactWarning};
pub use index::{build_cross_group, GroupDependency, GroupDependencyIndex, GroupNames, GroupNode};
pub use model::{PropertyValue, PropertyVisitor, ResourceDescriptor};
pub use order::DeploymentOrderer;
pub use reference::{ReferenceScanner, ResourceReference};
pub use sanitize::{sanitize_identifier, IdentifierCache};
pub use source::{ResourceSource, SnapshotFile};
pub use tier::{normalize_type, TierClassifier, MAX_TIER, MID_TIER, MIN_TIER};
