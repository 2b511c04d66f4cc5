//! Deployment tier classification.
//!
//! Tiers are a coarse ordering hint for resources inside one group: lower
//! tiers deploy first. Cross-group ordering is handled by the group index.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::config::AnalyzerConfig;

/// Earliest tier, reserved for group roots.
pub const MIN_TIER: u32 = 0;
/// Tier assigned to types the table does not know.
pub const MID_TIER: u32 = 4;
/// Latest tier.
pub const MAX_TIER: u32 = 7;

/// Canonical type of a deployment group root.
pub const GROUP_ROOT_TYPE: &str = "Microsoft.Resources/resourceGroups";

const TIER_TABLE: &[(&str, u32)] = &[
    (GROUP_ROOT_TYPE, 0),
    // Identity and network foundations
    ("Microsoft.Graph/users", 1),
    ("Microsoft.Graph/groups", 1),
    ("Microsoft.Graph/servicePrincipals", 1),
    ("Microsoft.Graph/applications", 1),
    ("Microsoft.ManagedIdentity/userAssignedIdentities", 1),
    ("Microsoft.Network/virtualNetworks", 1),
    ("Microsoft.Network/networkSecurityGroups", 1),
    ("Microsoft.Network/routeTables", 1),
    ("Microsoft.Network/publicIPAddresses", 1),
    ("Microsoft.Network/natGateways", 1),
    ("Microsoft.Network/privateDnsZones", 1),
    ("Microsoft.OperationalInsights/workspaces", 1),
    // Sub-resources and shared services
    ("Microsoft.Network/virtualNetworks/subnets", 2),
    ("Microsoft.Network/privateDnsZones/virtualNetworkLinks", 2),
    ("Microsoft.KeyVault/vaults", 2),
    ("Microsoft.Storage/storageAccounts", 2),
    ("Microsoft.ContainerRegistry/registries", 2),
    // Attachments and platform servers
    ("Microsoft.Network/networkInterfaces", 3),
    ("Microsoft.Network/loadBalancers", 3),
    ("Microsoft.Network/applicationGateways", 3),
    ("Microsoft.Network/privateEndpoints", 3),
    ("Microsoft.Sql/servers", 3),
    ("Microsoft.DBforPostgreSQL/flexibleServers", 3),
    ("Microsoft.Web/serverfarms", 3),
    // Data
    ("Microsoft.Sql/servers/databases", 4),
    ("Microsoft.KeyVault/vaults/secrets", 4),
    // Compute
    ("Microsoft.Compute/virtualMachines", 5),
    ("Microsoft.Compute/virtualMachineScaleSets", 5),
    ("Microsoft.ContainerService/managedClusters", 5),
    ("Microsoft.Web/sites", 5),
    ("Microsoft.App/containerApps", 5),
    // Decorations applied after the resources they target
    ("Microsoft.Compute/virtualMachines/extensions", 6),
    ("Microsoft.Authorization/roleAssignments", 6),
    ("Microsoft.Insights/diagnosticSettings", 6),
    ("Microsoft.Authorization/locks", 7),
];

/// Short spellings of identity-provider kinds and their canonical types.
const IDENTITY_ALIASES: &[(&str, &str)] = &[
    ("user", "Microsoft.Graph/users"),
    ("users", "Microsoft.Graph/users"),
    ("group", "Microsoft.Graph/groups"),
    ("groups", "Microsoft.Graph/groups"),
    ("serviceprincipal", "Microsoft.Graph/servicePrincipals"),
    ("serviceprincipals", "Microsoft.Graph/servicePrincipals"),
    ("service_principal", "Microsoft.Graph/servicePrincipals"),
    ("application", "Microsoft.Graph/applications"),
    ("applications", "Microsoft.Graph/applications"),
];

/// Identity-provider kinds that live outside any deployment group.
pub const GROUPLESS_TYPES: &[&str] = &[
    "Microsoft.Graph/users",
    "Microsoft.Graph/groups",
    "Microsoft.Graph/servicePrincipals",
    "Microsoft.Graph/applications",
];

/// Resolve alias spellings to their canonical type.
///
/// Anything that is not a known alias is returned trimmed but otherwise
/// untouched.
pub fn normalize_type(resource_type: &str) -> &str {
    let trimmed = resource_type.trim();
    IDENTITY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map_or(trimmed, |(_, canonical)| *canonical)
}

/// Whether the type is a deployment group root.
pub fn is_group_root(resource_type: &str) -> bool {
    normalize_type(resource_type).eq_ignore_ascii_case(GROUP_ROOT_TYPE)
}

/// Maps resource types to deployment tiers.
#[derive(Debug, Clone)]
pub struct TierClassifier {
    tiers: HashMap<String, u32>,
    groupless: HashSet<String>,
    default_tier: u32,
}

impl TierClassifier {
    /// Classifier backed by the built-in table only.
    pub fn new() -> Self {
        Self {
            tiers: TIER_TABLE
                .iter()
                .map(|(ty, tier)| (ty.to_ascii_lowercase(), *tier))
                .collect(),
            groupless: GROUPLESS_TYPES.iter().map(|ty| ty.to_ascii_lowercase()).collect(),
            default_tier: MID_TIER,
        }
    }

    /// Classifier with the configured overrides layered on the built-in table.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let mut classifier = Self::new();
        classifier.default_tier = config.default_tier;
        for (ty, tier) in &config.tier_overrides {
            classifier.tiers.insert(lookup_key(ty), *tier);
        }
        for ty in &config.groupless_types {
            classifier.groupless.insert(lookup_key(ty));
        }
        classifier
    }

    /// Tier for a resource type. Unknown types get the default tier.
    pub fn classify(&self, resource_type: &str) -> u32 {
        match self.tiers.get(&lookup_key(resource_type)) {
            Some(tier) => *tier,
            None => {
                debug!(
                    "Unknown resource type '{}', using default tier {}",
                    resource_type, self.default_tier
                );
                self.default_tier
            }
        }
    }

    /// Whether the type appears in the tier table.
    pub fn is_known(&self, resource_type: &str) -> bool {
        self.tiers.contains_key(&lookup_key(resource_type))
    }

    /// Whether resources of this type never belong to a deployment group.
    pub fn is_groupless(&self, resource_type: &str) -> bool {
        self.groupless.contains(&lookup_key(resource_type))
    }

    pub fn default_tier(&self) -> u32 {
        self.default_tier
    }
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_key(resource_type: &str) -> String {
    normalize_type(resource_type).to_ascii_lowercase()
}
