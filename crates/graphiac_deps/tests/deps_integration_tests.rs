//! Integration tests for dependency analysis and deployment ordering.

use std::collections::BTreeSet;
use std::fs;

use serde_json::json;
use tempfile::tempdir;

use graphiac_deps::{
    sanitize_identifier, DependencyAnalyzer, DepsError, ImpactKind, ResourceDescriptor,
    ResourceSource, SnapshotFile,
};

const SUB: &str = "/subscriptions/00000000-0000-0000-0000-000000000000";

fn id(group: &str, path: &str) -> String {
    format!("{}/resourceGroups/{}/providers/{}", SUB, group, path)
}

/// Resource group, virtual network and subnet in `rg-network`, a NIC that
/// references the subnet, and a VM in `rg-compute` that references the NIC.
fn network_and_compute() -> Vec<ResourceDescriptor> {
    vec![
        ResourceDescriptor::new("Microsoft.Resources/resourceGroups", "rg-network")
            .with_id(format!("{}/resourceGroups/rg-network", SUB)),
        ResourceDescriptor::new("Microsoft.Network/virtualNetworks", "vnet-hub")
            .in_group("rg-network")
            .with_id(id("rg-network", "Microsoft.Network/virtualNetworks/vnet-hub"))
            .with_properties(json!({"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}})),
        ResourceDescriptor::new("Microsoft.Network/virtualNetworks/subnets", "vnet-hub/default")
            .in_group("rg-network")
            .with_id(id("rg-network", "Microsoft.Network/virtualNetworks/vnet-hub/subnets/default"))
            .with_properties(json!({
                "addressPrefix": "10.0.1.0/24",
                "vnet": {"id": id("rg-network", "Microsoft.Network/virtualNetworks/vnet-hub")}
            })),
        ResourceDescriptor::new("Microsoft.Network/networkInterfaces", "nic-app")
            .in_group("rg-network")
            .with_properties(json!({
                "ipConfigurations": [{
                    "name": "ipconfig1",
                    "properties": {
                        "subnet": {"id": id("rg-network", "Microsoft.Network/virtualNetworks/vnet-hub/subnets/default")}
                    }
                }]
            })),
        ResourceDescriptor::new("Microsoft.Compute/virtualMachines", "vm-app")
            .in_group("rg-compute")
            .with_properties(json!({
                "hardwareProfile": {"vmSize": "Standard_B2s"},
                "networkProfile": {
                    "networkInterfaces": [
                        {"id": id("rg-network", "Microsoft.Network/networkInterfaces/nic-app"), "primary": true}
                    ]
                }
            })),
    ]
}

fn in_group(group: &str, name: &str) -> ResourceDescriptor {
    ResourceDescriptor::new("Microsoft.Storage/storageAccounts", name).in_group(group)
}

fn referencing(group: &str, name: &str, target_group: &str) -> ResourceDescriptor {
    in_group(group, name).with_properties(json!({
        "link": id(target_group, &format!("Microsoft.Storage/storageAccounts/{}-target", target_group))
    }))
}

#[test]
fn test_end_to_end_network_before_compute() {
    let analyzer = DependencyAnalyzer::new();
    let resources = network_and_compute();

    let records = analyzer.analyze(&resources);
    let tiers: Vec<u32> = records.iter().map(|r| r.tier).collect();
    assert_eq!(tiers, vec![0, 1, 2, 3, 5]);

    let order = analyzer.deployment_order(&resources).unwrap();
    assert_eq!(order, vec!["rg-network", "rg-compute"]);
}

#[test]
fn test_end_to_end_depends_on_records() {
    let analyzer = DependencyAnalyzer::new();
    let resources = network_and_compute();
    let records = analyzer.analyze(&resources);

    // Group root carries no edge to itself.
    assert!(records[0].depends_on.is_empty());
    // Every grouped resource points at its own group.
    for record in &records[1..] {
        let group = record.resource.group.as_deref().unwrap();
        assert!(record.depends_on.contains(&sanitize_identifier(group)));
    }
    // Same-group references become resource edges.
    assert!(records[2].depends_on.contains("vnet_hub"));
    assert!(records[3].depends_on.contains("vnet_hub_default"));
    // Cross-group references do not.
    assert_eq!(
        records[4].depends_on,
        BTreeSet::from(["rg_compute".to_string()])
    );
}

#[test]
fn test_analysis_is_deterministic() {
    let analyzer = DependencyAnalyzer::new();
    let resources = network_and_compute();

    assert_eq!(analyzer.analyze(&resources), analyzer.analyze(&resources));
    assert_eq!(
        analyzer.deployment_order(&resources).unwrap(),
        analyzer.deployment_order(&resources).unwrap()
    );

    let first = serde_json::to_string(&analyzer.plan(&resources).unwrap()).unwrap();
    let second = serde_json::to_string(&analyzer.plan(&resources).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_order_respects_every_edge() {
    let analyzer = DependencyAnalyzer::new();
    let resources = vec![
        referencing("web", "web1", "api"),
        referencing("web", "web2", "shared"),
        referencing("api", "api1", "data"),
        referencing("api", "api2", "shared"),
        referencing("data", "data1", "shared"),
        in_group("shared", "shared-target"),
        in_group("data", "data-target"),
        in_group("api", "api-target"),
        in_group("standalone", "lonely"),
    ];

    let edges = analyzer.cross_group_dependencies(&resources);
    let order = analyzer.deployment_order(&resources).unwrap();
    let position = |group: &str| order.iter().position(|g| g == group).unwrap();

    assert_eq!(order.len(), 5);
    for edge in &edges {
        assert!(
            position(&edge.target_group) < position(&edge.source_group),
            "{} must deploy before {}",
            edge.target_group,
            edge.source_group
        );
    }
}

#[test]
fn test_self_references_produce_no_edges() {
    let analyzer = DependencyAnalyzer::new();
    let resources = vec![
        referencing("alpha", "a1", "alpha"),
        referencing("alpha", "a2", "ALPHA"),
    ];

    let edges = analyzer.cross_group_dependencies(&resources);
    assert!(edges.is_empty());
    assert_eq!(analyzer.deployment_order(&resources).unwrap(), vec!["alpha"]);
}

#[test]
fn test_mutual_references_are_a_cycle() {
    let analyzer = DependencyAnalyzer::new();
    let resources = vec![referencing("A", "a1", "B"), referencing("B", "b1", "A")];

    let err = analyzer.deployment_order(&resources).unwrap_err();
    assert!(err.is_cycle());
    match err {
        DepsError::CycleDetected { groups, cycles } => {
            assert_eq!(groups, BTreeSet::from(["A".to_string(), "B".to_string()]));
            assert_eq!(cycles.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(analyzer.plan(&resources).is_err());
}

#[test]
fn test_independent_groups_tie_break() {
    let analyzer = DependencyAnalyzer::new();
    let resources = vec![
        in_group("zebra", "z"),
        in_group("apple", "a"),
        in_group("mango", "m"),
    ];

    assert_eq!(
        analyzer.deployment_order(&resources).unwrap(),
        vec!["apple", "mango", "zebra"]
    );
}

#[test]
fn test_removal_of_referenced_group_is_reported() {
    let analyzer = DependencyAnalyzer::new();
    let resources = vec![
        ResourceDescriptor::new("Microsoft.Network/networkInterfaces", "nic1").in_group("network"),
        ResourceDescriptor::new("Microsoft.Compute/virtualMachines", "vm1")
            .in_group("compute")
            .with_properties(json!({
                "networkProfile": {"networkInterfaces": [{"id": id("network", "Microsoft.Network/networkInterfaces/nic1")}]}
            })),
    ];

    let warnings =
        analyzer.impact_of_removal(&resources, &BTreeSet::from(["compute".to_string()]));

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, ImpactKind::GroupRemoved);
    assert_eq!(warnings[0].target_group, "network");
    assert!(warnings[0].resources.iter().any(|r| r == "vm1"));
    assert_eq!(warnings[0].dependency.count, 1);

    let all = BTreeSet::from(["compute".to_string(), "network".to_string()]);
    assert!(analyzer.impact_of_removal(&resources, &all).is_empty());
}

#[test]
fn test_moving_referenced_resource_is_reported() {
    let analyzer = DependencyAnalyzer::new();
    let current = network_and_compute();
    let proposed: Vec<ResourceDescriptor> = current
        .iter()
        .cloned()
        .map(|mut resource| {
            if resource.name == "nic-app" {
                resource.group = Some("rg-compute".to_string());
            }
            resource
        })
        .collect();

    let warnings = analyzer.impact_of_move(&current, &proposed);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, ImpactKind::ResourceMoved);
    assert_eq!(warnings[0].source_group, "rg-compute");
    assert_eq!(warnings[0].target_group, "rg-network");
    assert_eq!(warnings[0].resources, vec!["vm-app"]);

    assert!(analyzer.impact_of_move(&current, &current).is_empty());
}

#[test]
fn test_sanitizer_properties() {
    let long_a = format!("{}-alpha", "resource-name-that-goes-on".repeat(4));
    let long_b = format!("{}-omega", "resource-name-that-goes-on".repeat(4));

    for name in ["rg-network", "9-lives", "", "vnet/subnet", long_a.as_str()] {
        let once = sanitize_identifier(name);
        assert_eq!(sanitize_identifier(&once), once);
    }
    assert_ne!(sanitize_identifier(&long_a), sanitize_identifier(&long_b));
}

#[test]
fn test_snapshot_file_feeds_analyzer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("resources.json");
    let document = json!({"resources": network_and_compute()});
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let resources = SnapshotFile::new(&path).load().unwrap();
    assert_eq!(resources, network_and_compute());

    let order = DependencyAnalyzer::new().deployment_order(&resources).unwrap();
    assert_eq!(order, vec!["rg-network", "rg-compute"]);
}
