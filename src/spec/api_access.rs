//! Kubernetes API exposure

use tracing::debug;

use super::names::is_gossip_name;
use super::{ApiAccess, LoadBalancerType, Topology};

/// Decide how the API server is reached.
///
/// An explicit load balancer type always wins. Otherwise public masters get a
/// DNS record unless the cluster name is gossip-style (external resolvers
/// cannot see it), and private masters always sit behind a load balancer.
/// The TLS certificate only applies to load balancer access.
pub fn resolve_api_access(
    explicit_lb_type: Option<LoadBalancerType>,
    masters: Topology,
    cluster_name: &str,
    ssl_certificate: Option<&str>,
) -> ApiAccess {
    let load_balancer = |lb_type: LoadBalancerType| ApiAccess::LoadBalancer {
        lb_type,
        ssl_certificate: ssl_certificate.map(String::from),
    };

    let access = match (explicit_lb_type, masters) {
        (Some(lb_type), _) => load_balancer(lb_type),
        (None, Topology::Public) if is_gossip_name(cluster_name) => {
            load_balancer(LoadBalancerType::default())
        }
        (None, Topology::Public) => ApiAccess::Dns,
        (None, Topology::Private) => load_balancer(LoadBalancerType::default()),
    };

    debug!("API access for {}: {:?}", cluster_name, access);
    access
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_type_wins() {
        let access = resolve_api_access(
            Some(LoadBalancerType::Internal),
            Topology::Public,
            "dev.example.com",
            None,
        );
        assert_eq!(
            access,
            ApiAccess::LoadBalancer {
                lb_type: LoadBalancerType::Internal,
                ssl_certificate: None
            }
        );
    }

    #[test]
    fn test_public_normal_name_uses_dns() {
        let access = resolve_api_access(None, Topology::Public, "dev.example.com", Some("arn:cert"));
        assert_eq!(access, ApiAccess::Dns);
    }

    #[test]
    fn test_public_gossip_name_uses_public_load_balancer() {
        let access = resolve_api_access(None, Topology::Public, "dev.k8s.local", None);
        assert_eq!(
            access,
            ApiAccess::LoadBalancer {
                lb_type: LoadBalancerType::Public,
                ssl_certificate: None
            }
        );
    }

    #[test]
    fn test_private_uses_load_balancer_with_certificate() {
        let access = resolve_api_access(
            None,
            Topology::Private,
            "dev.example.com",
            Some("arn:aws:acm:cert"),
        );
        assert_eq!(
            access,
            ApiAccess::LoadBalancer {
                lb_type: LoadBalancerType::Public,
                ssl_certificate: Some("arn:aws:acm:cert".to_string())
            }
        );
    }
}
