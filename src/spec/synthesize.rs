//! Cluster specification synthesis
//!
//! Runs the sub-builders in a fixed order (networking, topology and subnets,
//! API access, masters and etcd, nodes) and assembles one [`ClusterPlan`].
//! Any failure aborts the whole call; a partial plan is never returned.

use thiserror::Error;
use tracing::{debug, info};

use super::api_access::resolve_api_access;
use super::instance_groups::{plan_bastion, plan_etcd_clusters, plan_masters, plan_nodes};
use super::networking::{select_networking, NetworkingKind};
use super::topology::{build_subnets, build_topology};
use super::{ClusterPlan, ClusterSpec, IamSpec, KubeletSpec, Topology};
use crate::config::{normalize, ClusterConfig, ClusterParams, NormalizeError, SynthesisDefaults};

/// Errors that abort synthesis
#[derive(Error, Debug, PartialEq)]
pub enum SynthesisError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] NormalizeError),

    #[error("A bastion cannot be created with {0} topology")]
    IncompatibleBastion(Topology),

    #[error("Networking '{networking}' does not support {topology} topology")]
    IncompatibleNetworking {
        networking: NetworkingKind,
        topology: Topology,
    },

    #[error("No master zones to place masters in")]
    NoMasterZones,

    #[error("Generated {kind} name '{name}' is not unique")]
    DuplicateName { kind: &'static str, name: String },
}

// ============================================================================
// SBIO: Pure synthesis (no I/O)
// ============================================================================

/// Synthesize the cluster plan from normalized configuration
pub fn synthesize(config: &ClusterConfig) -> Result<ClusterPlan, SynthesisError> {
    debug!("Synthesizing cluster {}", config.name);

    let networking = select_networking(config.networking, &config.cloud);

    let topology = build_topology(
        config.topology,
        config.dns,
        config.bastion,
        config.networking,
        &config.name,
    )?;
    let subnets = build_subnets(config.topology, &config.node_zones, &config.master_zones)?;

    let api = resolve_api_access(
        config.api_load_balancer_type,
        topology.masters,
        &config.name,
        config.api_ssl_certificate.as_deref(),
    );

    let masters = plan_masters(config)?;
    let etcd_clusters =
        plan_etcd_clusters(&masters, &config.etcd_version, config.encrypt_etcd_storage);
    let nodes = plan_nodes(config);

    let mut instance_groups = Vec::with_capacity(masters.len() + 2);
    if topology.bastion.is_some() {
        instance_groups.push(plan_bastion(config, &subnets));
    }
    instance_groups.extend(masters);
    instance_groups.push(nodes);

    let config_base = config
        .state_store
        .as_ref()
        .map(|store| format!("{}/{}", store.trim_end_matches('/'), config.name));

    let spec = ClusterSpec {
        name: config.name.clone(),
        channel: config.channel.clone(),
        cloud_provider: config.cloud.clone(),
        config_base,
        network_cidr: config.network_cidr.clone(),
        network_id: config.vpc_id.clone(),
        non_masquerade_cidr: config.non_masquerade_cidr.clone(),
        kubernetes_version: config.k8s_version.clone(),
        kubernetes_api_access: config.admin_access.clone(),
        ssh_access: config.ssh_access.clone(),
        networking,
        topology,
        api,
        authorization: config.authorization,
        kubelet: KubeletSpec::default(),
        iam: IamSpec::default(),
        subnets,
        etcd_clusters,
        cloud_labels: config.cloud_labels.clone(),
    };

    let plan = ClusterPlan {
        spec,
        instance_groups,
    };

    info!(
        "Synthesized cluster {}: {} subnet(s), {} instance group(s), {} etcd cluster(s)",
        plan.spec.name,
        plan.spec.subnets.len(),
        plan.instance_groups.len(),
        plan.spec.etcd_clusters.len()
    );

    Ok(plan)
}

/// Normalize raw parameters and synthesize in one step
pub fn synthesize_params(
    params: &ClusterParams,
    defaults: &SynthesisDefaults,
) -> Result<ClusterPlan, SynthesisError> {
    let config = normalize(params, defaults)?;
    synthesize(&config)
}
