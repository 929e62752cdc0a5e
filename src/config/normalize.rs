//! Parameter normalization
//!
//! Turns [`ClusterParams`] into a typed [`ClusterConfig`]. Defaults only fill
//! in values that are absent (or empty strings); an explicit value that is not
//! recognized is always an error.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::defaults::SynthesisDefaults;
use super::labels::{parse_cloud_labels, LabelError};
use super::params::ClusterParams;
use crate::spec::{Authorization, DnsType, LoadBalancerType, NetworkingKind, Topology};

/// Errors raised while normalizing parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Unknown {field} '{value}'")]
    UnknownValue { field: &'static str, value: String },

    #[error("Unknown networking backend '{0}'")]
    UnknownNetworking(String),

    #[error("Invalid cloud labels: {0}")]
    Labels(#[from] LabelError),
}

impl NormalizeError {
    fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        NormalizeError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Typed, defaulted configuration consumed by synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub name: String,
    pub cloud: String,
    pub channel: String,
    pub state_store: Option<String>,
    pub master_zones: Vec<String>,
    pub node_zones: Vec<String>,
    pub master_count: u32,
    pub master_group_size: u32,
    pub master_size: String,
    pub node_size: String,
    pub master_volume_size: u32,
    pub node_volume_size: u32,
    pub node_min_size: u32,
    pub node_max_size: u32,
    pub admin_access: Vec<String>,
    pub ssh_access: Vec<String>,
    /// Only set when the user asked for a specific load balancer type
    pub api_load_balancer_type: Option<LoadBalancerType>,
    pub api_ssl_certificate: Option<String>,
    pub authorization: Authorization,
    pub associate_public_ip: bool,
    pub bastion: bool,
    pub bastion_machine_type: String,
    pub cloud_labels: BTreeMap<String, String>,
    pub image: String,
    pub dns: DnsType,
    pub topology: Topology,
    pub networking: NetworkingKind,
    pub network_cidr: String,
    pub non_masquerade_cidr: String,
    pub etcd_version: String,
    pub k8s_version: String,
    pub encrypt_etcd_storage: bool,
    pub vpc_id: Option<String>,
    pub ssh_public_key: Option<String>,
    pub master_security_groups: Vec<String>,
    pub node_security_groups: Vec<String>,
}

// ============================================================================
// SBIO: Pure normalization (no I/O)
// ============================================================================

/// Treat missing and blank strings alike
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a value only if one was given
fn parse_optional<T>(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<T>, NormalizeError>
where
    T: FromStr,
{
    present(value)
        .map(|raw| {
            raw.parse().map_err(|_| NormalizeError::UnknownValue {
                field,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn parse_or_default<T>(
    field: &'static str,
    value: &Option<String>,
    default: T,
) -> Result<T, NormalizeError>
where
    T: FromStr,
{
    Ok(parse_optional(field, value)?.unwrap_or(default))
}

/// Check that a string is an `address/prefix` CIDR block
pub fn validate_cidr(field: &'static str, value: &str) -> Result<(), NormalizeError> {
    let (addr, prefix) = value
        .split_once('/')
        .ok_or_else(|| NormalizeError::validation(field, format!("'{}' is not a CIDR", value)))?;

    let addr: IpAddr = addr.parse().map_err(|_| {
        NormalizeError::validation(field, format!("'{}' has an invalid address", value))
    })?;
    let prefix: u8 = prefix.parse().map_err(|_| {
        NormalizeError::validation(field, format!("'{}' has an invalid prefix", value))
    })?;

    let max_prefix = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max_prefix {
        return Err(NormalizeError::validation(
            field,
            format!("'{}' prefix exceeds /{}", value, max_prefix),
        ));
    }

    Ok(())
}

/// Check that a cluster name is a DNS-style name
pub fn validate_cluster_name(name: &str) -> Result<(), NormalizeError> {
    let valid = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .map(|re| re.is_match(name))
        .unwrap_or(false);

    if name.is_empty() {
        Err(NormalizeError::validation("name", "cluster name is required"))
    } else if !valid {
        Err(NormalizeError::validation(
            "name",
            format!("'{}' is not a valid DNS name", name),
        ))
    } else {
        Ok(())
    }
}

fn validate_zones(field: &'static str, zones: &[String]) -> Result<Vec<String>, NormalizeError> {
    if zones.is_empty() {
        return Err(NormalizeError::validation(
            field,
            "at least one zone is required",
        ));
    }

    let mut seen = HashSet::new();
    for zone in zones {
        let zone = zone.trim();
        if zone.is_empty() {
            return Err(NormalizeError::validation(field, "zone names cannot be empty"));
        }
        if !seen.insert(zone) {
            return Err(NormalizeError::validation(
                field,
                format!("zone '{}' is listed more than once", zone),
            ));
        }
    }

    Ok(zones.iter().map(|z| z.trim().to_string()).collect())
}

fn access_list(
    field: &'static str,
    value: &Option<Vec<String>>,
    default: &[String],
) -> Result<Vec<String>, NormalizeError> {
    let list = match value {
        None => default.to_vec(),
        Some(list) if list.is_empty() => {
            return Err(NormalizeError::validation(
                field,
                "an explicit empty list would deny all access",
            ))
        }
        Some(list) => list.iter().map(|c| c.trim().to_string()).collect(),
    };

    for cidr in &list {
        validate_cidr(field, cidr)?;
    }
    Ok(list)
}

fn required(field: &'static str, value: &str) -> Result<String, NormalizeError> {
    let value = value.trim();
    if value.is_empty() {
        Err(NormalizeError::validation(field, "a value is required"))
    } else {
        Ok(value.to_string())
    }
}

/// Normalize raw parameters against the given defaults
pub fn normalize(
    params: &ClusterParams,
    defaults: &SynthesisDefaults,
) -> Result<ClusterConfig, NormalizeError> {
    let name = params.name.trim().to_string();
    validate_cluster_name(&name)?;

    let master_zones = validate_zones("master_zones", &params.master_zones)?;
    let node_zones = validate_zones("node_zones", &params.node_zones)?;

    if params.master_count == 0 {
        return Err(NormalizeError::validation(
            "master_count",
            "at least one master is required",
        ));
    }

    let master_group_size = params.master_group_size.unwrap_or(defaults.master_group_size);
    if master_group_size == 0 {
        return Err(NormalizeError::validation(
            "master_group_size",
            "master groups need at least one machine",
        ));
    }

    if params.node_min_size > params.node_max_size {
        return Err(NormalizeError::validation(
            "node_min_size",
            format!(
                "min size {} exceeds max size {}",
                params.node_min_size, params.node_max_size
            ),
        ));
    }

    let admin_access = access_list("admin_access", &params.admin_access, &defaults.admin_access)?;
    let ssh_access = access_list("ssh_access", &params.ssh_access, &admin_access)?;

    let api_load_balancer_type: Option<LoadBalancerType> =
        parse_optional("api_load_balancer_type", &params.api_load_balancer_type)?;

    let networking = match present(&params.networking) {
        Some(raw) => raw
            .parse::<NetworkingKind>()
            .map_err(|_| NormalizeError::UnknownNetworking(raw.to_string()))?,
        None => defaults.networking,
    };

    let network_cidr = required("network_cidr", &params.network_cidr)?;
    validate_cidr("network_cidr", &network_cidr)?;

    let non_masquerade_cidr = present(&params.non_masquerade_cidr)
        .unwrap_or(&defaults.non_masquerade_cidr)
        .to_string();
    validate_cidr("non_masquerade_cidr", &non_masquerade_cidr)?;

    let cloud_labels = match present(&params.cloud_labels) {
        Some(raw) => parse_cloud_labels(raw)?,
        None => BTreeMap::new(),
    };

    let text_or = |value: &Option<String>, default: &str| -> String {
        present(value).unwrap_or(default).to_string()
    };
    let text = |value: &Option<String>| present(value).map(String::from);

    let config = ClusterConfig {
        cloud: text_or(&params.cloud, &defaults.cloud),
        channel: defaults.channel.clone(),
        state_store: text(&params.state_store),
        master_zones,
        node_zones,
        master_count: params.master_count,
        master_group_size,
        master_size: required("master_size", &params.master_size)?,
        node_size: required("node_size", &params.node_size)?,
        master_volume_size: params.master_volume_size,
        node_volume_size: params.node_volume_size,
        node_min_size: params.node_min_size,
        node_max_size: params.node_max_size,
        admin_access,
        ssh_access,
        api_load_balancer_type,
        api_ssl_certificate: text(&params.api_ssl_certificate),
        authorization: parse_or_default(
            "authorization",
            &params.authorization,
            Authorization::default(),
        )?,
        associate_public_ip: params.associate_public_ip.unwrap_or(true),
        bastion: params.bastion.unwrap_or(false),
        bastion_machine_type: defaults.bastion_machine_type.clone(),
        cloud_labels,
        image: text_or(&params.image, &defaults.image),
        dns: parse_or_default("dns", &params.dns, DnsType::default())?,
        topology: parse_or_default("topology", &params.topology, defaults.topology)?,
        networking,
        network_cidr,
        non_masquerade_cidr,
        etcd_version: text_or(&params.etcd_version, &defaults.etcd_version),
        k8s_version: text_or(&params.k8s_version, &defaults.k8s_version),
        encrypt_etcd_storage: params.encrypt_etcd_storage.unwrap_or(true),
        vpc_id: text(&params.vpc_id),
        ssh_public_key: text(&params.ssh_public_key),
        master_security_groups: params.master_security_groups.clone(),
        node_security_groups: params.node_security_groups.clone(),
        name,
    };

    debug!(
        "Normalized {}: topology={}, networking={}, masters={}",
        config.name, config.topology, config.networking, config.master_count
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::base_params;

    fn defaults() -> SynthesisDefaults {
        SynthesisDefaults::default()
    }

    #[test]
    fn test_defaults_applied() {
        let config = normalize(&base_params(), &defaults()).unwrap();

        assert_eq!(config.admin_access, vec!["0.0.0.0/0"]);
        assert_eq!(config.ssh_access, vec!["0.0.0.0/0"]);
        assert_eq!(config.authorization, Authorization::AlwaysAllow);
        assert_eq!(config.topology, Topology::Public);
        assert_eq!(config.networking, NetworkingKind::Kubenet);
        assert_eq!(config.api_load_balancer_type, None);
        assert_eq!(config.cloud, "aws");
        assert_eq!(config.k8s_version, "v1.11.5");
        assert_eq!(config.non_masquerade_cidr, "100.64.0.1/10");
        assert!(config.associate_public_ip);
        assert!(config.encrypt_etcd_storage);
        assert!(!config.bastion);
        assert!(config.cloud_labels.is_empty());
    }

    #[test]
    fn test_blank_string_counts_as_absent() {
        let mut params = base_params();
        params.authorization = Some("  ".to_string());
        params.api_load_balancer_type = Some(String::new());

        let config = normalize(&params, &defaults()).unwrap();
        assert_eq!(config.authorization, Authorization::AlwaysAllow);
        assert_eq!(config.api_load_balancer_type, None);
    }

    #[test]
    fn test_zero_master_zones() {
        let mut params = base_params();
        params.master_zones.clear();
        assert!(matches!(
            normalize(&params, &defaults()),
            Err(NormalizeError::Validation {
                field: "master_zones",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_node_zones() {
        let mut params = base_params();
        params.node_zones.clear();
        assert!(matches!(
            normalize(&params, &defaults()),
            Err(NormalizeError::Validation {
                field: "node_zones",
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_zones_rejected() {
        let mut params = base_params();
        params.master_zones = vec!["a".to_string(), "a".to_string()];
        assert!(normalize(&params, &defaults()).is_err());
    }

    #[test]
    fn test_explicit_empty_admin_access_rejected() {
        let mut params = base_params();
        params.admin_access = Some(vec![]);
        assert!(matches!(
            normalize(&params, &defaults()),
            Err(NormalizeError::Validation {
                field: "admin_access",
                ..
            })
        ));
    }

    #[test]
    fn test_ssh_access_falls_back_to_admin_access() {
        let mut params = base_params();
        params.admin_access = Some(vec!["10.1.0.0/16".to_string()]);

        let config = normalize(&params, &defaults()).unwrap();
        assert_eq!(config.ssh_access, vec!["10.1.0.0/16"]);
    }

    #[test]
    fn test_unknown_authorization() {
        let mut params = base_params();
        params.authorization = Some("ABAC".to_string());
        assert_eq!(
            normalize(&params, &defaults()),
            Err(NormalizeError::UnknownValue {
                field: "authorization",
                value: "ABAC".to_string()
            })
        );
    }

    #[test]
    fn test_rbac_case_insensitive() {
        let mut params = base_params();
        params.authorization = Some("rbac".to_string());
        let config = normalize(&params, &defaults()).unwrap();
        assert_eq!(config.authorization, Authorization::Rbac);
    }

    #[test]
    fn test_unknown_topology() {
        let mut params = base_params();
        params.topology = Some("hybrid".to_string());
        assert!(matches!(
            normalize(&params, &defaults()),
            Err(NormalizeError::UnknownValue {
                field: "topology",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_load_balancer_type() {
        let mut params = base_params();
        params.api_load_balancer_type = Some("external".to_string());
        assert!(matches!(
            normalize(&params, &defaults()),
            Err(NormalizeError::UnknownValue {
                field: "api_load_balancer_type",
                ..
            })
        ));
    }

    #[test]
    fn test_explicit_load_balancer_type_kept() {
        let mut params = base_params();
        params.api_load_balancer_type = Some(" internal ".to_string());
        let config = normalize(&params, &defaults()).unwrap();
        assert_eq!(
            config.api_load_balancer_type,
            Some(LoadBalancerType::Internal)
        );
    }

    #[test]
    fn test_unknown_networking() {
        let mut params = base_params();
        params.networking = Some("contiv".to_string());
        assert_eq!(
            normalize(&params, &defaults()),
            Err(NormalizeError::UnknownNetworking("contiv".to_string()))
        );
    }

    #[test]
    fn test_malformed_labels() {
        let mut params = base_params();
        params.cloud_labels = Some("Owner=me,broken".to_string());
        assert!(matches!(
            normalize(&params, &defaults()),
            Err(NormalizeError::Labels(LabelError::Malformed { .. }))
        ));
    }

    #[test]
    fn test_labels_parsed() {
        let mut params = base_params();
        params.cloud_labels = Some("Owner=John Doe,Team=\"a=b\"".to_string());
        let config = normalize(&params, &defaults()).unwrap();
        assert_eq!(config.cloud_labels["Owner"], "John Doe");
        assert_eq!(config.cloud_labels["Team"], "a=b");
    }

    #[test]
    fn test_node_sizes_ordered() {
        let mut params = base_params();
        params.node_min_size = 5;
        params.node_max_size = 2;
        assert!(normalize(&params, &defaults()).is_err());
    }

    #[test]
    fn test_zero_masters_rejected() {
        let mut params = base_params();
        params.master_count = 0;
        assert!(normalize(&params, &defaults()).is_err());
    }

    #[test]
    fn test_validate_cidr() {
        assert!(validate_cidr("f", "10.0.0.0/16").is_ok());
        assert!(validate_cidr("f", "100.64.0.1/10").is_ok());
        assert!(validate_cidr("f", "fd00::/8").is_ok());
        assert!(validate_cidr("f", "10.0.0.0").is_err());
        assert!(validate_cidr("f", "10.0.0.0/33").is_err());
        assert!(validate_cidr("f", "bogus/8").is_err());
    }

    #[test]
    fn test_validate_cluster_name() {
        assert!(validate_cluster_name("dev.example.com").is_ok());
        assert!(validate_cluster_name("dev.k8s.local").is_ok());
        assert!(validate_cluster_name("").is_err());
        assert!(validate_cluster_name("Dev_Cluster").is_err());
        assert!(validate_cluster_name("-dev.example.com").is_err());
    }

    #[test]
    fn test_custom_defaults_are_used() {
        let custom = SynthesisDefaults {
            image: "ami-custom".to_string(),
            networking: NetworkingKind::Calico,
            ..SynthesisDefaults::default()
        };
        let config = normalize(&base_params(), &custom).unwrap();
        assert_eq!(config.image, "ami-custom");
        assert_eq!(config.networking, NetworkingKind::Calico);
    }
}
