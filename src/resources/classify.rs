//! Resource classification
//!
//! Buckets non-shared resources first by type, then (for types that serve
//! several roles) by the first keyword found in the resource name. Keyword
//! order matters: "master" is tested before "nodes", so a name containing
//! both lands in the master bucket. Changing the order changes which
//! resources a teardown would remove.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{CloudResource, ResourceType};

/// List-valued inventory buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryBucket {
    AutoscalingConfigMasters,
    AutoscalingConfigNodes,
    AutoscalingGroupMasters,
    AutoscalingGroupNodes,
    IamInstanceProfileMasters,
    IamInstanceProfileNodes,
    IamRoleMasters,
    IamRoleNodes,
    InstanceMasters,
    InstanceNodes,
    InstanceBastion,
    Route53RecordsApi,
    Route53RecordsEtcd,
    SecurityGroupMasters,
    SecurityGroupNodes,
    SecurityGroupElbs,
    SecurityGroupBastion,
    Subnets,
    EtcdVolumes,
}

impl InventoryBucket {
    pub const ALL: [InventoryBucket; 19] = [
        InventoryBucket::AutoscalingConfigMasters,
        InventoryBucket::AutoscalingConfigNodes,
        InventoryBucket::AutoscalingGroupMasters,
        InventoryBucket::AutoscalingGroupNodes,
        InventoryBucket::IamInstanceProfileMasters,
        InventoryBucket::IamInstanceProfileNodes,
        InventoryBucket::IamRoleMasters,
        InventoryBucket::IamRoleNodes,
        InventoryBucket::InstanceMasters,
        InventoryBucket::InstanceNodes,
        InventoryBucket::InstanceBastion,
        InventoryBucket::Route53RecordsApi,
        InventoryBucket::Route53RecordsEtcd,
        InventoryBucket::SecurityGroupMasters,
        InventoryBucket::SecurityGroupNodes,
        InventoryBucket::SecurityGroupElbs,
        InventoryBucket::SecurityGroupBastion,
        InventoryBucket::Subnets,
        InventoryBucket::EtcdVolumes,
    ];

    /// Read-back attribute name
    pub fn attribute_name(&self) -> &'static str {
        match self {
            InventoryBucket::AutoscalingConfigMasters => "autoscaling_config_masters_id",
            InventoryBucket::AutoscalingConfigNodes => "autoscaling_config_nodes_id",
            InventoryBucket::AutoscalingGroupMasters => "autoscaling_group_masters_id",
            InventoryBucket::AutoscalingGroupNodes => "autoscaling_group_nodes_id",
            InventoryBucket::IamInstanceProfileMasters => "iam_instance_profile_masters_id",
            InventoryBucket::IamInstanceProfileNodes => "iam_instance_profile_nodes_id",
            InventoryBucket::IamRoleMasters => "iam_role_masters_id",
            InventoryBucket::IamRoleNodes => "iam_role_nodes_id",
            InventoryBucket::InstanceMasters => "instance_masters_id",
            InventoryBucket::InstanceNodes => "instance_nodes_id",
            InventoryBucket::InstanceBastion => "instance_bastion_id",
            InventoryBucket::Route53RecordsApi => "route53_records_api",
            InventoryBucket::Route53RecordsEtcd => "route53_records_etcd_id",
            InventoryBucket::SecurityGroupMasters => "security_group_masters_id",
            InventoryBucket::SecurityGroupNodes => "security_group_nodes_id",
            InventoryBucket::SecurityGroupElbs => "security_group_elbs_id",
            InventoryBucket::SecurityGroupBastion => "security_group_bastion_id",
            InventoryBucket::Subnets => "subnets_id",
            InventoryBucket::EtcdVolumes => "etcd_volumes_id",
        }
    }
}

impl fmt::Display for InventoryBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// Types a cluster has at most one of
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SingletonSlot {
    Vpc,
    DhcpOptions,
    InternetGateway,
    RouteTable,
    LoadBalancer,
    Keypair,
}

impl SingletonSlot {
    pub const ALL: [SingletonSlot; 6] = [
        SingletonSlot::Vpc,
        SingletonSlot::DhcpOptions,
        SingletonSlot::InternetGateway,
        SingletonSlot::RouteTable,
        SingletonSlot::LoadBalancer,
        SingletonSlot::Keypair,
    ];

    pub fn attribute_name(&self) -> &'static str {
        match self {
            SingletonSlot::Vpc => "vpc_id",
            SingletonSlot::DhcpOptions => "dhcp_options_id",
            SingletonSlot::InternetGateway => "internet_gateway_id",
            SingletonSlot::RouteTable => "route_table_id",
            SingletonSlot::LoadBalancer => "load_balancer_id",
            SingletonSlot::Keypair => "keypair_id",
        }
    }
}

impl fmt::Display for SingletonSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name())
    }
}

/// Where a resource of a given type goes
enum Placement {
    Singleton(SingletonSlot),
    /// Ordered keyword rules; the first keyword contained in the name wins.
    /// `fallback` takes names that match no keyword, `None` drops them.
    Roles {
        rules: &'static [(&'static str, InventoryBucket)],
        fallback: Option<InventoryBucket>,
    },
}

fn placement(kind: ResourceType) -> Placement {
    use InventoryBucket as B;

    match kind {
        ResourceType::Vpc => Placement::Singleton(SingletonSlot::Vpc),
        ResourceType::DhcpOptions => Placement::Singleton(SingletonSlot::DhcpOptions),
        ResourceType::InternetGateway => Placement::Singleton(SingletonSlot::InternetGateway),
        ResourceType::RouteTable => Placement::Singleton(SingletonSlot::RouteTable),
        ResourceType::LoadBalancer => Placement::Singleton(SingletonSlot::LoadBalancer),
        ResourceType::Keypair => Placement::Singleton(SingletonSlot::Keypair),
        ResourceType::AutoscalingConfig => Placement::Roles {
            rules: &[("master", B::AutoscalingConfigMasters)],
            fallback: Some(B::AutoscalingConfigNodes),
        },
        ResourceType::AutoscalingGroup => Placement::Roles {
            rules: &[("master", B::AutoscalingGroupMasters)],
            fallback: Some(B::AutoscalingGroupNodes),
        },
        ResourceType::IamInstanceProfile => Placement::Roles {
            rules: &[("master", B::IamInstanceProfileMasters)],
            fallback: Some(B::IamInstanceProfileNodes),
        },
        ResourceType::IamRole => Placement::Roles {
            rules: &[("master", B::IamRoleMasters)],
            fallback: Some(B::IamRoleNodes),
        },
        ResourceType::Instance => Placement::Roles {
            rules: &[("master", B::InstanceMasters), ("nodes", B::InstanceNodes)],
            fallback: Some(B::InstanceBastion),
        },
        ResourceType::SecurityGroup => Placement::Roles {
            rules: &[
                ("master", B::SecurityGroupMasters),
                ("nodes", B::SecurityGroupNodes),
                ("elb", B::SecurityGroupElbs),
            ],
            fallback: Some(B::SecurityGroupBastion),
        },
        ResourceType::Route53Record => Placement::Roles {
            rules: &[("api", B::Route53RecordsApi), ("etcd", B::Route53RecordsEtcd)],
            fallback: None,
        },
        ResourceType::Subnet => Placement::Roles {
            rules: &[],
            fallback: Some(B::Subnets),
        },
        ResourceType::Volume => Placement::Roles {
            rules: &[],
            fallback: Some(B::EtcdVolumes),
        },
    }
}

/// Pick the bucket for a multi-role resource name
fn match_role(
    name: &str,
    rules: &[(&str, InventoryBucket)],
    fallback: Option<InventoryBucket>,
) -> Option<InventoryBucket> {
    rules
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, bucket)| *bucket)
        .or(fallback)
}

/// Ids of classified resources, by bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceInventory {
    /// Ids in encounter order
    pub lists: BTreeMap<InventoryBucket, Vec<String>>,
    pub singletons: BTreeMap<SingletonSlot, String>,
}

impl ResourceInventory {
    pub fn ids(&self, bucket: InventoryBucket) -> &[String] {
        self.lists.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn singleton(&self, slot: SingletonSlot) -> Option<&str> {
        self.singletons.get(&slot).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.lists.values().all(Vec::is_empty) && self.singletons.is_empty()
    }

    /// Flat read-back attributes: every list attribute (possibly empty) plus
    /// every singleton (null when absent)
    pub fn attributes(&self) -> Value {
        let mut map = Map::new();
        for slot in SingletonSlot::ALL {
            let value = self
                .singleton(slot)
                .map(|id| Value::String(id.to_string()))
                .unwrap_or(Value::Null);
            map.insert(slot.attribute_name().to_string(), value);
        }
        for bucket in InventoryBucket::ALL {
            let ids = self
                .ids(bucket)
                .iter()
                .map(|id| Value::String(id.clone()))
                .collect();
            map.insert(bucket.attribute_name().to_string(), Value::Array(ids));
        }
        Value::Object(map)
    }
}

/// A resource whose type the classifier does not know
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnclassifiedResource {
    pub id: String,
    pub name: String,
    pub resource_type: String,
}

impl fmt::Display for UnclassifiedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resource type '{}' is not classified (id: {}, name: {})",
            self.resource_type, self.id, self.name
        )
    }
}

impl From<&CloudResource> for UnclassifiedResource {
    fn from(resource: &CloudResource) -> Self {
        Self {
            id: resource.id.clone(),
            name: resource.name.clone(),
            resource_type: resource.resource_type.clone(),
        }
    }
}

/// Result of one classification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    pub inventory: ResourceInventory,
    pub warnings: Vec<UnclassifiedResource>,
}

// ============================================================================
// SBIO: Pure classification (no I/O)
// ============================================================================

/// Non-shared resources, each id once (first occurrence wins)
fn owned_resources<'a, I>(resources: I) -> impl Iterator<Item = &'a CloudResource>
where
    I: IntoIterator<Item = &'a CloudResource>,
{
    let mut seen = HashSet::new();
    resources
        .into_iter()
        .filter(|r| !r.shared)
        .filter(move |r: &&'a CloudResource| {
            let resource: &'a CloudResource = *r;
            let first = seen.insert(resource.id.as_str());
            if !first {
                warn!(
                    "Ignoring repeated resource id {} ({})",
                    resource.id, resource.name
                );
            }
            first
        })
}

/// Classify resources into a fresh inventory. Shared resources are skipped
/// entirely; unknown types are reported and left out.
pub fn classify<'a, I>(resources: I) -> Classification
where
    I: IntoIterator<Item = &'a CloudResource>,
{
    let mut result = Classification::default();

    for resource in owned_resources(resources) {
        let Some(kind) = resource.kind() else {
            let unclassified = UnclassifiedResource::from(resource);
            warn!("{}", unclassified);
            result.warnings.push(unclassified);
            continue;
        };

        match placement(kind) {
            Placement::Singleton(slot) => {
                if let Some(previous) = result
                    .inventory
                    .singletons
                    .insert(slot, resource.id.clone())
                {
                    warn!(
                        "Multiple {} resources found; {} replaces {}",
                        kind, resource.id, previous
                    );
                }
            }
            Placement::Roles { rules, fallback } => {
                match match_role(&resource.name, rules, fallback) {
                    Some(bucket) => result
                        .inventory
                        .lists
                        .entry(bucket)
                        .or_default()
                        .push(resource.id.clone()),
                    None => debug!(
                        "Skipping {} {} ({}): no matching role",
                        kind, resource.id, resource.name
                    ),
                }
            }
        }
    }

    debug!(
        "Classified {} list bucket(s), {} singleton(s), {} warning(s)",
        result.inventory.lists.len(),
        result.inventory.singletons.len(),
        result.warnings.len()
    );
    result
}

/// Resources handed to teardown: every non-shared resource, in encounter
/// order. Unknown types are still deleted, since the engine enumerated them,
/// but they are warned about.
pub fn deletion_set<'a, I>(resources: I) -> Vec<CloudResource>
where
    I: IntoIterator<Item = &'a CloudResource>,
{
    owned_resources(resources)
        .inspect(|r| {
            if r.kind().is_none() {
                warn!("{}", UnclassifiedResource::from(*r));
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CloudResource> {
        vec![
            CloudResource::new("vpc-1", "dev.example.com", "vpc"),
            CloudResource::new("sg-m", "masters.dev.example.com", "security-group"),
            CloudResource::new("sg-n", "nodes.dev.example.com", "security-group"),
            CloudResource::new("sg-e", "api-elb.dev.example.com", "security-group"),
            CloudResource::new("i-1", "master-us-east-1a.masters.dev", "instance"),
            CloudResource::new("i-2", "nodes.dev.example.com", "instance"),
            CloudResource::new("i-3", "bastions.dev.example.com", "instance"),
            CloudResource::new("r-1", "api.dev.example.com", "route53-record"),
            CloudResource::new("r-2", "etcd-a.internal.dev", "route53-record"),
            CloudResource::new("subnet-1", "us-east-1a.dev", "subnet"),
            CloudResource::new("vol-1", "a.etcd-main.dev", "volume"),
            CloudResource::new("subnet-shared", "shared", "subnet").shared(),
        ]
    }

    #[test]
    fn test_classify_buckets() {
        let resources = sample();
        let result = classify(&resources);
        let inv = &result.inventory;

        assert_eq!(inv.singleton(SingletonSlot::Vpc), Some("vpc-1"));
        assert_eq!(inv.ids(InventoryBucket::SecurityGroupMasters), ["sg-m"]);
        assert_eq!(inv.ids(InventoryBucket::SecurityGroupNodes), ["sg-n"]);
        assert_eq!(inv.ids(InventoryBucket::SecurityGroupElbs), ["sg-e"]);
        assert_eq!(inv.ids(InventoryBucket::InstanceMasters), ["i-1"]);
        assert_eq!(inv.ids(InventoryBucket::InstanceNodes), ["i-2"]);
        assert_eq!(inv.ids(InventoryBucket::InstanceBastion), ["i-3"]);
        assert_eq!(inv.ids(InventoryBucket::Route53RecordsApi), ["r-1"]);
        assert_eq!(inv.ids(InventoryBucket::Route53RecordsEtcd), ["r-2"]);
        assert_eq!(inv.ids(InventoryBucket::Subnets), ["subnet-1"]);
        assert_eq!(inv.ids(InventoryBucket::EtcdVolumes), ["vol-1"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_master_keyword_wins_over_nodes() {
        let resources = vec![CloudResource::new("sg-1", "master-nodes-sg", "security-group")];
        let inv = classify(&resources).inventory;

        assert_eq!(inv.ids(InventoryBucket::SecurityGroupMasters), ["sg-1"]);
        assert!(inv.ids(InventoryBucket::SecurityGroupNodes).is_empty());
    }

    #[test]
    fn test_shared_resources_never_classified_or_deleted() {
        let resources = sample();
        let inv = classify(&resources).inventory;
        let all_ids: Vec<&String> = inv
            .lists
            .values()
            .flatten()
            .chain(inv.singletons.values())
            .collect();
        assert!(!all_ids.iter().any(|id| id.as_str() == "subnet-shared"));

        let doomed = deletion_set(&resources);
        assert!(doomed.iter().all(|r| !r.shared));
        assert_eq!(doomed.len(), resources.len() - 1);
    }

    #[test]
    fn test_encounter_order_preserved() {
        let resources = vec![
            CloudResource::new("subnet-z", "z", "subnet"),
            CloudResource::new("subnet-a", "a", "subnet"),
            CloudResource::new("subnet-m", "m", "subnet"),
        ];
        let inv = classify(&resources).inventory;
        assert_eq!(
            inv.ids(InventoryBucket::Subnets),
            ["subnet-z", "subnet-a", "subnet-m"]
        );

        let ids: Vec<String> = deletion_set(&resources).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["subnet-z", "subnet-a", "subnet-m"]);
    }

    #[test]
    fn test_repeated_id_classified_and_deleted_once() {
        let resources = vec![
            CloudResource::new("sg-1", "masters.dev", "security-group"),
            CloudResource::new("sg-1", "masters.dev", "security-group"),
            CloudResource::new("sg-2", "nodes.dev", "security-group"),
        ];
        let inv = classify(&resources).inventory;
        assert_eq!(inv.ids(InventoryBucket::SecurityGroupMasters), ["sg-1"]);
        assert_eq!(inv.ids(InventoryBucket::SecurityGroupNodes), ["sg-2"]);

        let ids: Vec<String> = deletion_set(&resources).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["sg-1", "sg-2"]);
    }

    #[test]
    fn test_unknown_type_is_warned_and_excluded() {
        let resources = vec![
            CloudResource::new("nat-1", "nat.dev", "nat-gateway"),
            CloudResource::new("subnet-1", "a", "subnet"),
        ];
        let result = classify(&resources);

        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].id, "nat-1");
        assert_eq!(result.warnings[0].resource_type, "nat-gateway");
        assert_eq!(result.inventory.ids(InventoryBucket::Subnets), ["subnet-1"]);
        assert_eq!(result.inventory.lists.len(), 1);
    }

    #[test]
    fn test_unknown_type_still_deleted() {
        let resources = vec![CloudResource::new("nat-1", "nat.dev", "nat-gateway")];
        assert_eq!(deletion_set(&resources).len(), 1);
    }

    #[test]
    fn test_single_role_types_fall_back_to_nodes() {
        let resources = vec![
            CloudResource::new("asg-1", "master-a.masters.dev", "autoscaling-group"),
            CloudResource::new("asg-2", "bastions.dev", "autoscaling-group"),
            CloudResource::new("role-1", "masters.dev", "iam-role"),
            CloudResource::new("role-2", "nodes.dev", "iam-role"),
            CloudResource::new("lc-1", "nodes.dev-123", "autoscaling-config"),
            CloudResource::new("prof-1", "masters.dev", "iam-instance-profile"),
        ];
        let inv = classify(&resources).inventory;

        assert_eq!(inv.ids(InventoryBucket::AutoscalingGroupMasters), ["asg-1"]);
        assert_eq!(inv.ids(InventoryBucket::AutoscalingGroupNodes), ["asg-2"]);
        assert_eq!(inv.ids(InventoryBucket::IamRoleMasters), ["role-1"]);
        assert_eq!(inv.ids(InventoryBucket::IamRoleNodes), ["role-2"]);
        assert_eq!(inv.ids(InventoryBucket::AutoscalingConfigNodes), ["lc-1"]);
        assert_eq!(
            inv.ids(InventoryBucket::IamInstanceProfileMasters),
            ["prof-1"]
        );
    }

    #[test]
    fn test_unmatched_security_group_goes_to_bastion() {
        let resources = vec![CloudResource::new("sg-b", "bastion.dev", "security-group")];
        let inv = classify(&resources).inventory;
        assert_eq!(inv.ids(InventoryBucket::SecurityGroupBastion), ["sg-b"]);
    }

    #[test]
    fn test_unmatched_dns_record_dropped() {
        let resources = vec![CloudResource::new("r-1", "bastion.dev", "route53-record")];
        let result = classify(&resources);
        assert!(result.inventory.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_singleton_last_wins() {
        let resources = vec![
            CloudResource::new("rt-1", "dev", "route-table"),
            CloudResource::new("rt-2", "dev", "route-table"),
        ];
        let inv = classify(&resources).inventory;
        assert_eq!(inv.singleton(SingletonSlot::RouteTable), Some("rt-2"));
    }

    #[test]
    fn test_attributes_cover_every_bucket() {
        let resources = sample();
        let attrs = classify(&resources).inventory.attributes();
        let obj = attrs.as_object().unwrap();

        assert_eq!(
            obj.len(),
            InventoryBucket::ALL.len() + SingletonSlot::ALL.len()
        );
        assert_eq!(obj["vpc_id"], "vpc-1");
        assert!(obj["keypair_id"].is_null());
        assert_eq!(obj["security_group_masters_id"][0], "sg-m");
        assert_eq!(obj["autoscaling_group_nodes_id"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_classification_is_fresh_each_call() {
        let resources = sample();
        assert_eq!(classify(&resources), classify(&resources));
    }

    #[test]
    fn test_empty_input() {
        let resources: Vec<CloudResource> = Vec::new();
        let result = classify(&resources);
        assert!(result.inventory.is_empty());
        assert!(deletion_set(&resources).is_empty());
    }
}
