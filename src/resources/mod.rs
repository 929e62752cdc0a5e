//! Cloud resources enumerated by the provisioning engine
//!
//! The engine owns these records; this module only reads them, classifies
//! them into an inventory and picks the set handed to teardown.

pub mod classify;

pub use classify::{
    classify, deletion_set, Classification, InventoryBucket, ResourceInventory, SingletonSlot,
    UnclassifiedResource,
};

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// A resource as reported by the engine's enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudResource {
    /// Filled from the map key when the snapshot is keyed by id
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Raw type tag, e.g. "security-group". Kept as a string because the
    /// engine may report types this crate does not know.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Not owned exclusively by this cluster
    #[serde(default)]
    pub shared: bool,
}

impl CloudResource {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resource_type: resource_type.into(),
            shared: false,
        }
    }

    /// Mark the resource as shared with other clusters
    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    /// The recognized type, if any
    pub fn kind(&self) -> Option<ResourceType> {
        self.resource_type.parse().ok()
    }
}

/// Resource types the classifier understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Vpc,
    DhcpOptions,
    InternetGateway,
    RouteTable,
    LoadBalancer,
    Keypair,
    AutoscalingConfig,
    AutoscalingGroup,
    IamInstanceProfile,
    IamRole,
    Instance,
    #[serde(rename = "route53-record")]
    Route53Record,
    SecurityGroup,
    Subnet,
    Volume,
}

impl ResourceType {
    pub const ALL: [ResourceType; 15] = [
        ResourceType::Vpc,
        ResourceType::DhcpOptions,
        ResourceType::InternetGateway,
        ResourceType::RouteTable,
        ResourceType::LoadBalancer,
        ResourceType::Keypair,
        ResourceType::AutoscalingConfig,
        ResourceType::AutoscalingGroup,
        ResourceType::IamInstanceProfile,
        ResourceType::IamRole,
        ResourceType::Instance,
        ResourceType::Route53Record,
        ResourceType::SecurityGroup,
        ResourceType::Subnet,
        ResourceType::Volume,
    ];

    /// Type tag as reported by the engine
    pub fn tag(&self) -> &'static str {
        match self {
            ResourceType::Vpc => "vpc",
            ResourceType::DhcpOptions => "dhcp-options",
            ResourceType::InternetGateway => "internet-gateway",
            ResourceType::RouteTable => "route-table",
            ResourceType::LoadBalancer => "load-balancer",
            ResourceType::Keypair => "keypair",
            ResourceType::AutoscalingConfig => "autoscaling-config",
            ResourceType::AutoscalingGroup => "autoscaling-group",
            ResourceType::IamInstanceProfile => "iam-instance-profile",
            ResourceType::IamRole => "iam-role",
            ResourceType::Instance => "instance",
            ResourceType::Route53Record => "route53-record",
            ResourceType::SecurityGroup => "security-group",
            ResourceType::Subnet => "subnet",
            ResourceType::Volume => "volume",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .iter()
            .find(|t| t.tag() == s)
            .copied()
            .ok_or_else(|| s.to_string())
    }
}

/// Errors loading a resource snapshot
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid resource snapshot: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// A resource enumeration as written to disk: either a list, or a map keyed
/// by resource id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ResourceSnapshot {
    List(Vec<CloudResource>),
    Keyed(BTreeMap<String, CloudResource>),
}

impl ResourceSnapshot {
    /// Flatten into resources. Keyed snapshots come out in id order; in list
    /// snapshots the first record for an id wins.
    pub fn into_resources(self) -> Vec<CloudResource> {
        match self {
            ResourceSnapshot::List(mut resources) => {
                let mut seen = HashSet::new();
                resources.retain(|r| {
                    let first = seen.insert(r.id.clone());
                    if !first {
                        warn!("Dropping repeated resource id {} from snapshot", r.id);
                    }
                    first
                });
                resources
            }
            ResourceSnapshot::Keyed(map) => map
                .into_iter()
                .map(|(key, mut resource)| {
                    if resource.id.is_empty() {
                        resource.id = key;
                    }
                    resource
                })
                .collect(),
        }
    }
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

pub fn parse_snapshot(content: &str) -> Result<Vec<CloudResource>, ResourceError> {
    let snapshot: ResourceSnapshot = serde_json::from_str(content)?;
    Ok(snapshot.into_resources())
}

// ============================================================================
// I/O boundary functions
// ============================================================================

pub fn load_snapshot_file(path: &Path) -> Result<Vec<CloudResource>, ResourceError> {
    let content = std::fs::read_to_string(path).map_err(|source| ResourceError::IoError {
        path: path.to_path_buf(),
        source,
    })?;
    parse_snapshot(&content)
}
