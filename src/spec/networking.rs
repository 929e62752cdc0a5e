//! Networking backend selection
//!
//! A cluster runs exactly one networking backend. The requested backend is a
//! closed set of names; anything else is rejected before synthesis goes on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Largest frame AWS instances accept (jumbo frames)
pub const AWS_MAX_FRAME_SIZE: u32 = 9001;

/// Bytes weave adds to every packet (encapsulation + encryption headers)
pub const WEAVE_PACKET_OVERHEAD: u32 = 87;

/// Requested networking backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkingKind {
    Classic,
    Kubenet,
    External,
    Cni,
    KopeioVxlan,
    Weave,
    FlannelVxlan,
    FlannelUdp,
    Calico,
    Canal,
    KubeRouter,
    Romana,
    AmazonVpcRoutedEni,
    Cilium,
    LyftVpc,
}

impl NetworkingKind {
    pub const ALL: [NetworkingKind; 15] = [
        NetworkingKind::Classic,
        NetworkingKind::Kubenet,
        NetworkingKind::External,
        NetworkingKind::Cni,
        NetworkingKind::KopeioVxlan,
        NetworkingKind::Weave,
        NetworkingKind::FlannelVxlan,
        NetworkingKind::FlannelUdp,
        NetworkingKind::Calico,
        NetworkingKind::Canal,
        NetworkingKind::KubeRouter,
        NetworkingKind::Romana,
        NetworkingKind::AmazonVpcRoutedEni,
        NetworkingKind::Cilium,
        NetworkingKind::LyftVpc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NetworkingKind::Classic => "classic",
            NetworkingKind::Kubenet => "kubenet",
            NetworkingKind::External => "external",
            NetworkingKind::Cni => "cni",
            NetworkingKind::KopeioVxlan => "kopeio-vxlan",
            NetworkingKind::Weave => "weave",
            NetworkingKind::FlannelVxlan => "flannel-vxlan",
            NetworkingKind::FlannelUdp => "flannel-udp",
            NetworkingKind::Calico => "calico",
            NetworkingKind::Canal => "canal",
            NetworkingKind::KubeRouter => "kube-router",
            NetworkingKind::Romana => "romana",
            NetworkingKind::AmazonVpcRoutedEni => "amazon-vpc-routed-eni",
            NetworkingKind::Cilium => "cilium",
            NetworkingKind::LyftVpc => "lyft-vpc",
        }
    }

    /// Whether pods can reach each other without public node addresses
    pub fn supports_private_topology(&self) -> bool {
        !matches!(
            self,
            NetworkingKind::Classic | NetworkingKind::Kubenet | NetworkingKind::External
        )
    }
}

impl fmt::Display for NetworkingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NetworkingKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kopeio" => return Ok(NetworkingKind::KopeioVxlan),
            "flannel" => return Ok(NetworkingKind::FlannelVxlan),
            _ => {}
        }
        NetworkingKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ParseEnumError::new("networking backend", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlannelBackend {
    Vxlan,
    Udp,
}

/// The selected backend with its backend-specific settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "kebab-case")]
pub enum Networking {
    Classic,
    Kubenet,
    External,
    Cni,
    Kopeio,
    Weave {
        #[serde(skip_serializing_if = "Option::is_none")]
        mtu: Option<u32>,
    },
    Flannel {
        #[serde(rename = "type")]
        backend: FlannelBackend,
    },
    Calico {
        #[serde(rename = "majorVersion")]
        major_version: String,
    },
    Canal,
    KubeRouter,
    Romana,
    AmazonVpc,
    Cilium,
    LyftVpc,
}

impl Networking {
    pub fn kind(&self) -> NetworkingKind {
        match self {
            Networking::Classic => NetworkingKind::Classic,
            Networking::Kubenet => NetworkingKind::Kubenet,
            Networking::External => NetworkingKind::External,
            Networking::Cni => NetworkingKind::Cni,
            Networking::Kopeio => NetworkingKind::KopeioVxlan,
            Networking::Weave { .. } => NetworkingKind::Weave,
            Networking::Flannel {
                backend: FlannelBackend::Vxlan,
            } => NetworkingKind::FlannelVxlan,
            Networking::Flannel {
                backend: FlannelBackend::Udp,
            } => NetworkingKind::FlannelUdp,
            Networking::Calico { .. } => NetworkingKind::Calico,
            Networking::Canal => NetworkingKind::Canal,
            Networking::KubeRouter => NetworkingKind::KubeRouter,
            Networking::Romana => NetworkingKind::Romana,
            Networking::AmazonVpc => NetworkingKind::AmazonVpcRoutedEni,
            Networking::Cilium => NetworkingKind::Cilium,
            Networking::LyftVpc => NetworkingKind::LyftVpc,
        }
    }
}

// ============================================================================
// SBIO: Pure selection logic (no I/O)
// ============================================================================

/// MTU that fits a weave packet into the largest frame, kept 4-byte aligned
pub fn weave_mtu(max_frame_size: u32) -> u32 {
    let usable = max_frame_size.saturating_sub(WEAVE_PACKET_OVERHEAD);
    usable - usable % 4
}

/// Build the networking section for a backend on a cloud provider
pub fn select_networking(kind: NetworkingKind, cloud: &str) -> Networking {
    match kind {
        NetworkingKind::Classic => Networking::Classic,
        NetworkingKind::Kubenet => Networking::Kubenet,
        NetworkingKind::External => Networking::External,
        NetworkingKind::Cni => Networking::Cni,
        NetworkingKind::KopeioVxlan => Networking::Kopeio,
        NetworkingKind::Weave => {
            let mtu = (cloud == "aws").then(|| weave_mtu(AWS_MAX_FRAME_SIZE));
            Networking::Weave { mtu }
        }
        NetworkingKind::FlannelVxlan => Networking::Flannel {
            backend: FlannelBackend::Vxlan,
        },
        NetworkingKind::FlannelUdp => Networking::Flannel {
            backend: FlannelBackend::Udp,
        },
        NetworkingKind::Calico => Networking::Calico {
            major_version: "v3".to_string(),
        },
        NetworkingKind::Canal => Networking::Canal,
        NetworkingKind::KubeRouter => Networking::KubeRouter,
        NetworkingKind::Romana => Networking::Romana,
        NetworkingKind::AmazonVpcRoutedEni => Networking::AmazonVpc,
        NetworkingKind::Cilium => Networking::Cilium,
        NetworkingKind::LyftVpc => Networking::LyftVpc,
    }
}
