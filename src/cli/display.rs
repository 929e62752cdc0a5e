//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use std::collections::BTreeMap;

use super::commands::{CommandResult, ValidationResult};
use super::{InventoryOutput, PlanOutput};
use crate::resources::{Classification, CloudResource, InventoryBucket, SingletonSlot};
use crate::spec::{trim_common_prefix, ApiAccess, ClusterPlan};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Pad each cell to its column width; cells past the last column are
/// appended as-is
fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .enumerate()
        .map(|(i, cell)| match widths.get(i) {
            Some(width) => format!("{:width$}", cell, width = *width),
            None => cell.to_string(),
        })
        .collect();
    let mut line = padded.join("   ").trim_end().to_string();
    line.push('\n');
    line
}

/// Format an aligned table with upper-cased headers, or `empty` when there
/// are no rows
pub fn format_table(headers: &[&str], rows: &[Vec<String>], empty: &str) -> String {
    if rows.is_empty() {
        return format!("{}\n", empty);
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .fold(header.len(), usize::max)
        })
        .collect();

    let upper: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    let mut output = table_line(upper.iter().map(String::as_str), &widths);
    for row in rows {
        output.push_str(&table_line(row.iter().map(String::as_str), &widths));
    }
    output
}

/// Shorten a list of zone or subnet names to their distinguishing suffixes
pub fn format_short_names(names: &[String]) -> String {
    if names.len() < 2 {
        return names.join(",");
    }
    trim_common_prefix(names).join(",")
}

// ============================================================================
// Plan display
// ============================================================================

/// Render a plan in the requested format
pub fn render_plan(plan: &ClusterPlan, output: PlanOutput) -> CommandResult<String> {
    match output {
        PlanOutput::Yaml => Ok(serde_yaml::to_string(plan)?),
        PlanOutput::Json => Ok(serde_json::to_string_pretty(plan)? + "\n"),
        PlanOutput::Summary => Ok(format_plan_summary(plan)),
    }
}

fn format_api_access(api: &ApiAccess) -> String {
    match api {
        ApiAccess::Dns => "dns".to_string(),
        ApiAccess::LoadBalancer {
            lb_type,
            ssl_certificate: Some(_),
        } => format!("load-balancer ({}, tls)", lb_type),
        ApiAccess::LoadBalancer { lb_type, .. } => format!("load-balancer ({})", lb_type),
    }
}

/// Human-readable summary of a plan
pub fn format_plan_summary(plan: &ClusterPlan) -> String {
    let spec = &plan.spec;
    let mut output = String::new();

    output.push_str(&format!("Cluster:      {}\n", spec.name));
    output.push_str(&format!("Cloud:        {}\n", spec.cloud_provider));
    output.push_str(&format!("Kubernetes:   {}\n", spec.kubernetes_version));
    output.push_str(&format!("Topology:     {}\n", spec.topology.masters));
    output.push_str(&format!("Networking:   {}\n", spec.networking.kind()));
    output.push_str(&format!("API access:   {}\n", format_api_access(&spec.api)));
    output.push_str(&format!("Authorization: {}\n", spec.authorization));
    if let Some(bastion) = &spec.topology.bastion {
        output.push_str(&format!("Bastion:      {}\n", bastion.bastion_public_name));
    }
    if let Some(config_base) = &spec.config_base {
        output.push_str(&format!("Config base:  {}\n", config_base));
    }
    output.push_str(&format!("Fingerprint:  {}\n", plan.fingerprint()));

    if !spec.cloud_labels.is_empty() {
        output.push_str("Labels:\n");
        for (k, v) in &spec.cloud_labels {
            output.push_str(&format!("  {}={}\n", k, v));
        }
    }

    output.push_str("\nSubnets:\n");
    let subnet_rows: Vec<Vec<String>> = spec
        .subnets
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                s.zone.clone(),
                format!("{:?}", s.subnet_type),
            ]
        })
        .collect();
    output.push_str(&format_table(
        &["NAME", "ZONE", "TYPE"],
        &subnet_rows,
        "No subnets.",
    ));

    output.push_str("\nInstance groups:\n");
    let group_rows: Vec<Vec<String>> = plan
        .instance_groups
        .iter()
        .map(|ig| {
            vec![
                ig.name.clone(),
                ig.role.to_string(),
                ig.machine_type.clone(),
                format!("{}/{}", ig.min_size, ig.max_size),
                format_short_names(&ig.subnets),
            ]
        })
        .collect();
    output.push_str(&format_table(
        &["NAME", "ROLE", "MACHINE", "MIN/MAX", "SUBNETS"],
        &group_rows,
        "No instance groups.",
    ));

    output.push_str("\nEtcd clusters:\n");
    let etcd_rows: Vec<Vec<String>> = spec
        .etcd_clusters
        .iter()
        .map(|c| {
            let members: Vec<String> = c.members.iter().map(|m| m.name.clone()).collect();
            vec![
                c.name.clone(),
                c.version.clone(),
                format_short_names(&members),
            ]
        })
        .collect();
    output.push_str(&format_table(
        &["NAME", "VERSION", "MEMBERS"],
        &etcd_rows,
        "No etcd clusters.",
    ));

    output
}

// ============================================================================
// Validation display
// ============================================================================

pub fn format_validation_result(result: &ValidationResult) -> String {
    if result.valid {
        format!(
            "✓ {} is valid (fingerprint {})\n",
            result.cluster.as_deref().unwrap_or("cluster"),
            result.fingerprint.as_deref().unwrap_or("-")
        )
    } else {
        let mut output = "✗ Validation failed:\n".to_string();
        for err in &result.errors {
            output.push_str(&format!("  - {}\n", err));
        }
        output
    }
}

// ============================================================================
// Resource display
// ============================================================================

/// Render a classification in the requested format
pub fn render_inventory(
    classification: &Classification,
    output: InventoryOutput,
) -> CommandResult<String> {
    match output {
        InventoryOutput::Json => {
            let attributes = classification.inventory.attributes();
            Ok(serde_json::to_string_pretty(&attributes)? + "\n")
        }
        InventoryOutput::Table => Ok(format_inventory_table(classification)),
    }
}

/// Format non-empty inventory buckets as a table, followed by warnings
pub fn format_inventory_table(classification: &Classification) -> String {
    let inventory = &classification.inventory;

    let mut rows: Vec<Vec<String>> = SingletonSlot::ALL
        .iter()
        .filter_map(|slot| {
            inventory
                .singleton(*slot)
                .map(|id| vec![slot.attribute_name().to_string(), id.to_string()])
        })
        .collect();
    rows.extend(
        InventoryBucket::ALL
            .iter()
            .filter(|bucket| !inventory.ids(**bucket).is_empty())
            .map(|bucket| {
                vec![
                    bucket.attribute_name().to_string(),
                    inventory.ids(*bucket).join(","),
                ]
            }),
    );

    let mut output = format_table(&["ATTRIBUTE", "IDS"], &rows, "No resources classified.");
    if !classification.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &classification.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }
    output
}

/// Format the resources a teardown would delete
pub fn format_deletion_set(resources: &[CloudResource]) -> String {
    let rows: Vec<Vec<String>> = resources
        .iter()
        .map(|r| vec![r.id.clone(), r.resource_type.clone(), r.name.clone()])
        .collect();
    format_table(&["ID", "TYPE", "NAME"], &rows, "Nothing to delete.")
}

// ============================================================================
// Label display
// ============================================================================

pub fn format_labels(labels: &BTreeMap<String, String>) -> String {
    let rows: Vec<Vec<String>> = labels
        .iter()
        .map(|(k, v)| vec![k.clone(), v.clone()])
        .collect();
    format_table(&["KEY", "VALUE"], &rows, "No labels.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::base_config;
    use crate::spec::synthesize;

    #[test]
    fn test_format_table() {
        let output = format_table(
            &["name", "role"],
            &[vec!["nodes".to_string(), "Node".to_string()]],
            "No groups.",
        );
        assert_eq!(output, "NAME    ROLE\nnodes   Node\n");
    }

    #[test]
    fn test_format_table_extra_cells_unpadded() {
        let output = format_table(
            &["id"],
            &[
                vec!["sg-1".to_string(), "extra".to_string()],
                vec!["sg-22".to_string()],
            ],
            "-",
        );
        assert_eq!(output, "ID\nsg-1    extra\nsg-22\n");
    }

    #[test]
    fn test_format_table_empty() {
        assert_eq!(format_table(&["a"], &[], "No subnets."), "No subnets.\n");
        assert_eq!(format_deletion_set(&[]), "Nothing to delete.\n");
    }

    #[test]
    fn test_short_names() {
        let zones = vec!["us-east-1a".to_string(), "us-east-1b".to_string()];
        assert_eq!(format_short_names(&zones), "a,b");
        assert_eq!(format_short_names(&["us-east-1a".to_string()]), "us-east-1a");
    }

    #[test]
    fn test_plan_summary() {
        let plan = synthesize(&base_config()).unwrap();
        let summary = format_plan_summary(&plan);

        assert!(summary.contains("Cluster:      dev.example.com"));
        assert!(summary.contains("API access:   dns"));
        assert!(summary.contains("master-us-east-1a"));
        assert!(summary.contains(&plan.fingerprint()));
    }

    #[test]
    fn test_render_plan_formats() {
        let plan = synthesize(&base_config()).unwrap();

        let yaml = render_plan(&plan, PlanOutput::Yaml).unwrap();
        assert!(yaml.contains("instanceGroups:"));

        let json = render_plan(&plan, PlanOutput::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["spec"]["name"], "dev.example.com");
    }

    #[test]
    fn test_inventory_table_lists_warnings() {
        let resources = vec![
            CloudResource::new("vpc-1", "dev", "vpc"),
            CloudResource::new("nat-1", "nat", "nat-gateway"),
        ];
        let classification = crate::resources::classify(&resources);
        let output = format_inventory_table(&classification);

        assert!(output.contains("vpc_id"));
        assert!(output.contains("vpc-1"));
        assert!(output.contains("Warnings:"));
        assert!(output.contains("nat-gateway"));
    }

    #[test]
    fn test_validation_result_display() {
        let failed = ValidationResult {
            valid: false,
            cluster: None,
            fingerprint: None,
            errors: vec!["Invalid master_zones".to_string()],
        };
        assert!(format_validation_result(&failed).contains("Invalid master_zones"));
    }

    #[test]
    fn test_format_labels() {
        let mut labels = BTreeMap::new();
        labels.insert("Owner".to_string(), "John Doe".to_string());
        assert!(format_labels(&labels).contains("John Doe"));
        assert_eq!(format_labels(&BTreeMap::new()), "No labels.\n");
    }
}
