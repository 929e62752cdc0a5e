//! Topology and subnet layout
//!
//! Public topology puts every zone in one public subnet. Private topology puts
//! every zone in one private subnet and pairs it with a utility subnet that
//! carries load balancers, NAT and the optional bastion.

use std::collections::HashSet;

use tracing::debug;

use super::networking::NetworkingKind;
use super::synthesize::SynthesisError;
use super::{BastionSpec, DnsType, Subnet, SubnetType, Topology, TopologySpec};

/// Prefix of the utility subnet paired with each private subnet
pub const UTILITY_SUBNET_PREFIX: &str = "utility-";

/// Prefix of the bastion's public DNS name
pub const BASTION_NAME_PREFIX: &str = "bastion.";

/// Name of the utility subnet paired with a private subnet
pub fn utility_subnet_name(private_subnet: &str) -> String {
    format!("{}{}", UTILITY_SUBNET_PREFIX, private_subnet)
}

/// Name of the subnet hosting a zone. Each zone owns exactly one subnet.
pub fn subnet_name_for_zone(zone: &str) -> String {
    zone.to_string()
}

/// Zones from nodes then masters, first occurrence wins
fn unique_zones<'a>(node_zones: &'a [String], master_zones: &'a [String]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    node_zones
        .iter()
        .chain(master_zones)
        .map(String::as_str)
        .filter(|zone| seen.insert(*zone))
        .collect()
}

// ============================================================================
// SBIO: Pure topology logic (no I/O)
// ============================================================================

/// Resolve the topology section, validating bastion and networking choices
pub fn build_topology(
    topology: Topology,
    dns: DnsType,
    bastion: bool,
    networking: NetworkingKind,
    cluster_name: &str,
) -> Result<TopologySpec, SynthesisError> {
    match topology {
        Topology::Public => {
            if bastion {
                return Err(SynthesisError::IncompatibleBastion(topology));
            }
            Ok(TopologySpec {
                masters: Topology::Public,
                nodes: Topology::Public,
                dns,
                bastion: None,
            })
        }
        Topology::Private => {
            if !networking.supports_private_topology() {
                return Err(SynthesisError::IncompatibleNetworking {
                    networking,
                    topology,
                });
            }
            let bastion = bastion.then(|| BastionSpec {
                bastion_public_name: format!("{}{}", BASTION_NAME_PREFIX, cluster_name),
            });
            Ok(TopologySpec {
                masters: Topology::Private,
                nodes: Topology::Private,
                dns,
                bastion,
            })
        }
    }
}

/// Derive the subnet set for a topology, one subnet per distinct zone.
///
/// Fails when a zone name collides with a derived utility subnet name
/// (zones `a` and `utility-a` under private topology).
pub fn build_subnets(
    topology: Topology,
    node_zones: &[String],
    master_zones: &[String],
) -> Result<Vec<Subnet>, SynthesisError> {
    let zones = unique_zones(node_zones, master_zones);

    let subnets: Vec<Subnet> = match topology {
        Topology::Public => zones
            .iter()
            .map(|zone| Subnet {
                name: subnet_name_for_zone(zone),
                zone: zone.to_string(),
                subnet_type: SubnetType::Public,
            })
            .collect(),
        Topology::Private => {
            let private: Vec<Subnet> = zones
                .iter()
                .map(|zone| Subnet {
                    name: subnet_name_for_zone(zone),
                    zone: zone.to_string(),
                    subnet_type: SubnetType::Private,
                })
                .collect();
            let utility: Vec<Subnet> = private
                .iter()
                .map(|subnet| Subnet {
                    name: utility_subnet_name(&subnet.name),
                    zone: subnet.zone.clone(),
                    subnet_type: SubnetType::Utility,
                })
                .collect();
            private.into_iter().chain(utility).collect()
        }
    };

    let mut names = HashSet::new();
    if let Some(clash) = subnets.iter().find(|s| !names.insert(s.name.as_str())) {
        return Err(SynthesisError::DuplicateName {
            kind: "subnet",
            name: clash.name.clone(),
        });
    }

    debug!(
        "Built {} subnet(s) for {} topology across {} zone(s)",
        subnets.len(),
        topology,
        zones.len()
    );

    Ok(subnets)
}
