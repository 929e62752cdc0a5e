//! Cluster specification model and synthesis
//!
//! The types in this module are the output of synthesis: a [`ClusterSpec`]
//! plus the [`InstanceGroup`] list that an apply engine turns into cloud
//! infrastructure. They are built once per call and never mutated after
//! being handed off.

pub mod api_access;
pub mod instance_groups;
pub mod names;
pub mod networking;
pub mod synthesize;
pub mod topology;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub use api_access::resolve_api_access;
pub use instance_groups::{
    plan_bastion, plan_etcd_clusters, plan_masters, plan_nodes, ETCD_CLUSTER_ROLES,
};
pub use names::{is_gossip_name, trim_common_prefix};
pub use networking::{select_networking, Networking, NetworkingKind};
pub use synthesize::{synthesize, synthesize_params, SynthesisError};
pub use topology::{build_subnets, build_topology, utility_subnet_name};

/// Error returned when a string does not name a known variant
#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Network placement of masters and nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    Public,
    Private,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Public => write!(f, "public"),
            Topology::Private => write!(f, "private"),
        }
    }
}

impl FromStr for Topology {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Topology::Public),
            "private" => Ok(Topology::Private),
            _ => Err(ParseEnumError::new("topology", s)),
        }
    }
}

/// Kind of hosted zone used for cluster DNS records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsType {
    #[default]
    Public,
    Private,
}

impl FromStr for DnsType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(DnsType::Public),
            "private" => Ok(DnsType::Private),
            _ => Err(ParseEnumError::new("dns type", s)),
        }
    }
}

/// API server authorization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Authorization {
    #[default]
    AlwaysAllow,
    #[serde(rename = "RBAC")]
    Rbac,
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authorization::AlwaysAllow => write!(f, "AlwaysAllow"),
            Authorization::Rbac => write!(f, "RBAC"),
        }
    }
}

impl FromStr for Authorization {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("AlwaysAllow") {
            Ok(Authorization::AlwaysAllow)
        } else if s.eq_ignore_ascii_case("RBAC") {
            Ok(Authorization::Rbac)
        } else {
            Err(ParseEnumError::new("authorization mode", s))
        }
    }
}

/// Scheme of the API load balancer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadBalancerType {
    #[default]
    Public,
    Internal,
}

impl fmt::Display for LoadBalancerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadBalancerType::Public => write!(f, "public"),
            LoadBalancerType::Internal => write!(f, "internal"),
        }
    }
}

impl FromStr for LoadBalancerType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(LoadBalancerType::Public),
            "internal" => Ok(LoadBalancerType::Internal),
            _ => Err(ParseEnumError::new("load balancer type", s)),
        }
    }
}

/// How the Kubernetes API is exposed. Exactly one mode is ever active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ApiAccess {
    Dns,
    LoadBalancer {
        #[serde(rename = "type")]
        lb_type: LoadBalancerType,
        #[serde(rename = "sslCertificate", skip_serializing_if = "Option::is_none")]
        ssl_certificate: Option<String>,
    },
}

impl ApiAccess {
    pub fn is_load_balancer(&self) -> bool {
        matches!(self, ApiAccess::LoadBalancer { .. })
    }
}

/// Role of a subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubnetType {
    Public,
    Private,
    Utility,
}

/// A cluster subnet. Names are unique within a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub name: String,
    pub zone: String,
    #[serde(rename = "type")]
    pub subnet_type: SubnetType,
}

/// Bastion settings attached to a private topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BastionSpec {
    pub bastion_public_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySpec {
    pub masters: Topology,
    pub nodes: Topology,
    pub dns: DnsType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bastion: Option<BastionSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeletSpec {
    pub anonymous_auth: bool,
    pub authentication_token_webhook: bool,
    pub authorization_mode: String,
}

impl Default for KubeletSpec {
    fn default() -> Self {
        Self {
            anonymous_auth: false,
            authentication_token_webhook: true,
            authorization_mode: "Webhook".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IamSpec {
    pub allow_container_registry: bool,
    pub legacy: bool,
}

impl Default for IamSpec {
    fn default() -> Self {
        Self {
            allow_container_registry: true,
            legacy: false,
        }
    }
}

/// Member of an etcd cluster, bound to one master instance group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtcdMember {
    pub name: String,
    pub instance_group: String,
    pub encrypted_volume: bool,
}

/// One logical etcd cluster ("main", "events")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtcdCluster {
    pub name: String,
    pub version: String,
    pub members: Vec<EtcdMember>,
}

/// The synthesized cluster specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    pub channel: String,
    pub cloud_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_base: Option<String>,
    pub network_cidr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub non_masquerade_cidr: String,
    pub kubernetes_version: String,
    pub kubernetes_api_access: Vec<String>,
    pub ssh_access: Vec<String>,
    pub networking: Networking,
    pub topology: TopologySpec,
    pub api: ApiAccess,
    pub authorization: Authorization,
    pub kubelet: KubeletSpec,
    pub iam: IamSpec,
    pub subnets: Vec<Subnet>,
    pub etcd_clusters: Vec<EtcdCluster>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub cloud_labels: BTreeMap<String, String>,
}

impl ClusterSpec {
    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets.iter().find(|s| s.name == name)
    }

    pub fn etcd_cluster(&self, name: &str) -> Option<&EtcdCluster> {
        self.etcd_clusters.iter().find(|c| c.name == name)
    }
}

/// Role of an instance group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceGroupRole {
    Master,
    Node,
    Bastion,
}

impl fmt::Display for InstanceGroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceGroupRole::Master => write!(f, "Master"),
            InstanceGroupRole::Node => write!(f, "Node"),
            InstanceGroupRole::Bastion => write!(f, "Bastion"),
        }
    }
}

/// A homogeneous group of machines with one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceGroup {
    pub name: String,
    pub role: InstanceGroupRole,
    pub image: String,
    pub machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_volume_size: Option<u32>,
    pub subnets: Vec<String>,
    pub min_size: u32,
    pub max_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associate_public_ip: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_security_groups: Vec<String>,
}

/// The complete synthesis output handed to an apply engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterPlan {
    pub spec: ClusterSpec,
    pub instance_groups: Vec<InstanceGroup>,
}

impl ClusterPlan {
    /// Instance groups with the given role, in plan order
    pub fn groups_with_role(&self, role: InstanceGroupRole) -> Vec<&InstanceGroup> {
        self.instance_groups
            .iter()
            .filter(|ig| ig.role == role)
            .collect()
    }

    /// SHA-256 over the canonical JSON form of the plan.
    ///
    /// Two plans synthesized from the same configuration share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain structs and BTreeMaps to a Vec cannot fail
        let canonical = serde_json::to_vec(self).unwrap_or_default();
        hasher.update(&canonical);
        format!("{:x}", hasher.finalize())
    }
}
