//! Instance group and etcd membership planning
//!
//! Masters are spread round-robin over the master zones, one group per
//! replica. Every etcd role gets one member per master group, so etcd
//! membership must be planned again whenever the master set changes.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::synthesize::SynthesisError;
use super::topology::subnet_name_for_zone;
use super::{EtcdCluster, EtcdMember, InstanceGroup, InstanceGroupRole, Subnet, SubnetType};
use crate::config::ClusterConfig;

/// Logical etcd clusters run on every master
pub const ETCD_CLUSTER_ROLES: [&str; 2] = ["main", "events"];

pub const MASTER_GROUP_PREFIX: &str = "master-";
pub const NODE_GROUP_NAME: &str = "nodes";
pub const BASTION_GROUP_NAME: &str = "bastions";

// ============================================================================
// SBIO: Pure planning functions (no I/O)
// ============================================================================

/// Plan one master instance group per requested replica.
///
/// Replica `i` lands in `master_zones[i % len]`. The first group in a zone is
/// named `master-<zone>`; later ones in the same zone get a 1-based
/// occurrence suffix (`master-<zone>-2`, ...). A suffixed name that matches
/// another zone's group (zones `a` and `a-2`) is rejected.
pub fn plan_masters(config: &ClusterConfig) -> Result<Vec<InstanceGroup>, SynthesisError> {
    let zones = &config.master_zones;
    if zones.is_empty() {
        return Err(SynthesisError::NoMasterZones);
    }

    let mut occurrences: HashMap<&str, u32> = HashMap::new();
    let mut taken = HashSet::new();
    let mut masters = Vec::with_capacity(config.master_count as usize);

    for i in 0..config.master_count as usize {
        let zone = zones[i % zones.len()].as_str();
        let occurrence = occurrences.entry(zone).or_insert(0);
        *occurrence += 1;

        let name = if *occurrence > 1 {
            format!("{}{}-{}", MASTER_GROUP_PREFIX, zone, occurrence)
        } else {
            format!("{}{}", MASTER_GROUP_PREFIX, zone)
        };
        if !taken.insert(name.clone()) {
            return Err(SynthesisError::DuplicateName {
                kind: "master instance group",
                name,
            });
        }

        masters.push(InstanceGroup {
            name,
            role: InstanceGroupRole::Master,
            image: config.image.clone(),
            machine_type: config.master_size.clone(),
            root_volume_size: Some(config.master_volume_size),
            subnets: vec![subnet_name_for_zone(zone)],
            min_size: config.master_group_size,
            max_size: config.master_group_size,
            associate_public_ip: Some(config.associate_public_ip),
            additional_security_groups: config.master_security_groups.clone(),
        });
    }

    debug!(
        "Planned {} master group(s) over {} zone(s)",
        masters.len(),
        zones.len()
    );
    Ok(masters)
}

/// Plan the etcd clusters: one per role, one member per master group
pub fn plan_etcd_clusters(
    masters: &[InstanceGroup],
    version: &str,
    encrypted_volumes: bool,
) -> Vec<EtcdCluster> {
    ETCD_CLUSTER_ROLES
        .iter()
        .map(|role| EtcdCluster {
            name: role.to_string(),
            version: version.to_string(),
            members: masters
                .iter()
                .map(|master| EtcdMember {
                    name: master.name.clone(),
                    instance_group: master.name.clone(),
                    encrypted_volume: encrypted_volumes,
                })
                .collect(),
        })
        .collect()
}

/// Plan the single node group spanning every node zone
pub fn plan_nodes(config: &ClusterConfig) -> InstanceGroup {
    InstanceGroup {
        name: NODE_GROUP_NAME.to_string(),
        role: InstanceGroupRole::Node,
        image: config.image.clone(),
        machine_type: config.node_size.clone(),
        root_volume_size: Some(config.node_volume_size),
        subnets: config
            .node_zones
            .iter()
            .map(|zone| subnet_name_for_zone(zone))
            .collect(),
        min_size: config.node_min_size,
        max_size: config.node_max_size,
        associate_public_ip: Some(config.associate_public_ip),
        additional_security_groups: config.node_security_groups.clone(),
    }
}

/// Plan the bastion group inside the utility subnets
pub fn plan_bastion(config: &ClusterConfig, subnets: &[Subnet]) -> InstanceGroup {
    InstanceGroup {
        name: BASTION_GROUP_NAME.to_string(),
        role: InstanceGroupRole::Bastion,
        image: config.image.clone(),
        machine_type: config.bastion_machine_type.clone(),
        root_volume_size: None,
        subnets: subnets
            .iter()
            .filter(|s| s.subnet_type == SubnetType::Utility)
            .map(|s| s.name.clone())
            .collect(),
        min_size: 1,
        max_size: 1,
        associate_public_ip: None,
        additional_security_groups: Vec::new(),
    }
}
