//! Named synthesis defaults
//!
//! Values used when a parameter is absent. They are injected at the boundary
//! (built-in, or loaded from a defaults file) rather than written into the
//! synthesis code.

use serde::{Deserialize, Serialize};

use crate::spec::{NetworkingKind, Topology};

pub const DEFAULT_CLOUD: &str = "aws";
pub const DEFAULT_CHANNEL: &str = "stable";
pub const DEFAULT_IMAGE: &str = "ami-03b850a018c8cd25e";
pub const DEFAULT_KUBERNETES_VERSION: &str = "v1.11.5";
pub const DEFAULT_ETCD_VERSION: &str = "3.2.24";
pub const DEFAULT_NON_MASQUERADE_CIDR: &str = "100.64.0.1/10";
pub const DEFAULT_BASTION_MACHINE_TYPE: &str = "t2.micro";

/// CIDR granting access from anywhere
pub const OPEN_ACCESS_CIDR: &str = "0.0.0.0/0";

/// Defaults applied by normalization when a parameter is absent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisDefaults {
    pub cloud: String,
    pub channel: String,
    pub image: String,
    pub k8s_version: String,
    pub etcd_version: String,
    pub non_masquerade_cidr: String,
    pub networking: NetworkingKind,
    pub topology: Topology,
    pub bastion_machine_type: String,
    pub admin_access: Vec<String>,
    /// Machines per master instance group
    pub master_group_size: u32,
}

impl Default for SynthesisDefaults {
    fn default() -> Self {
        Self {
            cloud: DEFAULT_CLOUD.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            k8s_version: DEFAULT_KUBERNETES_VERSION.to_string(),
            etcd_version: DEFAULT_ETCD_VERSION.to_string(),
            non_masquerade_cidr: DEFAULT_NON_MASQUERADE_CIDR.to_string(),
            networking: NetworkingKind::Kubenet,
            topology: Topology::Public,
            bastion_machine_type: DEFAULT_BASTION_MACHINE_TYPE.to_string(),
            admin_access: vec![OPEN_ACCESS_CIDR.to_string()],
            master_group_size: 1,
        }
    }
}
