use serde::{Deserialize, Serialize};

/// Flat cluster parameters as written by the user.
///
/// Optional values stay `None` here; defaults are applied by
/// [`normalize`](super::normalize) so that an absent value and an explicit
/// value can be told apart.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ClusterParams {
    /// Cluster name, also the DNS suffix of cluster records
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<String>,

    /// Versioned object store holding cluster state (e.g. "s3://bucket")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_store: Option<String>,

    #[serde(default)]
    pub master_zones: Vec<String>,

    #[serde(default)]
    pub node_zones: Vec<String>,

    pub master_count: u32,

    /// Machines per master instance group (default 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_group_size: Option<u32>,

    /// Master machine type, e.g. "t2.medium"
    pub master_size: String,

    /// Node machine type, e.g. "t2.medium"
    pub node_size: String,

    pub master_volume_size: u32,
    pub node_volume_size: u32,
    pub node_min_size: u32,
    pub node_max_size: u32,

    /// CIDRs allowed to reach the API. Absent means open access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_access: Option<Vec<String>>,

    /// CIDRs allowed to SSH. Absent means the admin access list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_access: Option<Vec<String>>,

    /// "public" or "internal"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_load_balancer_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_ssl_certificate: Option<String>,

    /// "AlwaysAllow" or "RBAC"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associate_public_ip: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bastion: Option<bool>,

    /// Comma-separated key=value labels, e.g. `Owner=John Doe,Team=infra`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_labels: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Hosted zone type: "public" or "private"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<String>,

    /// "public" or "private"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<String>,

    pub network_cidr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_masquerade_cidr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k8s_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_etcd_storage: Option<bool>,

    /// Existing VPC to build the cluster in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,

    /// Path of the SSH public key registered for the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_public_key: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub master_security_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_security_groups: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_params() {
        let yaml = r#"
name: dev.example.com
master_zones: [us-east-1a]
node_zones: [us-east-1a, us-east-1b]
master_count: 1
master_size: t2.medium
node_size: t2.medium
master_volume_size: 64
node_volume_size: 128
node_min_size: 1
node_max_size: 3
network_cidr: 10.0.0.0/16
"#;
        let params: ClusterParams = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params.name, "dev.example.com");
        assert_eq!(params.node_zones.len(), 2);
        assert!(params.admin_access.is_none());
        assert!(params.bastion.is_none());
    }

    #[test]
    fn test_parse_json_params() {
        let json = r#"{
            "name": "dev.k8s.local",
            "master_zones": ["a"],
            "node_zones": ["a"],
            "master_count": 3,
            "master_size": "m5.large",
            "node_size": "m5.large",
            "master_volume_size": 64,
            "node_volume_size": 128,
            "node_min_size": 2,
            "node_max_size": 4,
            "network_cidr": "10.0.0.0/16",
            "admin_access": [],
            "topology": "private",
            "networking": "weave",
            "bastion": true
        }"#;
        let params: ClusterParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.admin_access, Some(vec![]));
        assert_eq!(params.topology.as_deref(), Some("private"));
        assert_eq!(params.bastion, Some(true));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let yaml = "name: dev.example.com\nmaster_count: 1\n";
        assert!(serde_yaml::from_str::<ClusterParams>(yaml).is_err());
    }
}
