//! Cluster lifecycle driver
//!
//! create: synthesize, apply, then wait for readiness.
//! read: classify the current resource snapshot.
//! delete: classify, then hand the deletion set to teardown.
//!
//! Nothing is rolled back. A cluster that misses the readiness deadline
//! keeps whatever the apply engine created.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use super::{ApplyEngine, ClusterValidator, EngineError, Readiness, TeardownEngine};
use crate::config::ClusterConfig;
use crate::resources::{classify, deletion_set, Classification, CloudResource};
use crate::spec::{synthesize, ClusterPlan, SynthesisError};

/// Default interval between readiness checks
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Default hard deadline for readiness
pub const DEFAULT_READY_DEADLINE: Duration = Duration::from_secs(15 * 60);

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("Failed to apply cluster: {0}")]
    Apply(#[source] EngineError),

    #[error("Failed to delete cluster resources: {0}")]
    Teardown(#[source] EngineError),

    #[error("Cluster {cluster} not ready after {waited:?}")]
    NotReady {
        cluster: String,
        waited: Duration,
        last_error: Option<String>,
    },
}

/// Bounded readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub deadline: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_CHECK_INTERVAL,
            deadline: DEFAULT_READY_DEADLINE,
        }
    }
}

/// Re-check readiness every `interval` until the validator reports ready or
/// the deadline passes. Validator errors count as still converging.
pub async fn wait_for_ready(
    cluster_name: &str,
    validator: &dyn ClusterValidator,
    policy: &WaitPolicy,
) -> Result<(), LifecycleError> {
    let mut last_error: Option<String> = None;

    let polled = timeout(policy.deadline, async {
        let mut checks = 0u32;
        loop {
            checks += 1;
            match validator.validate(cluster_name).await {
                Ok(Readiness::Ready) => {
                    info!("Cluster {} ready after {} check(s)", cluster_name, checks);
                    return;
                }
                Ok(Readiness::Converging) => {
                    debug!("Cluster {} still converging", cluster_name);
                }
                Err(e) => {
                    debug!("Validation of {} failed: {}", cluster_name, e);
                    last_error = Some(e.to_string());
                }
            }
            sleep(policy.interval).await;
        }
    })
    .await;

    match polled {
        Ok(()) => Ok(()),
        Err(_) => {
            warn!(
                "Cluster {} did not become ready within {:?} (last error: {})",
                cluster_name,
                policy.deadline,
                last_error.as_deref().unwrap_or("none")
            );
            Err(LifecycleError::NotReady {
                cluster: cluster_name.to_string(),
                waited: policy.deadline,
                last_error,
            })
        }
    }
}

/// Synthesize, apply and wait. Returns the applied plan.
pub async fn create_cluster(
    config: &ClusterConfig,
    engine: &dyn ApplyEngine,
    validator: &dyn ClusterValidator,
    policy: &WaitPolicy,
) -> Result<ClusterPlan, LifecycleError> {
    let plan = synthesize(config)?;

    info!("Applying cluster {} ({})", plan.spec.name, plan.fingerprint());
    engine.apply(&plan).await.map_err(LifecycleError::Apply)?;

    wait_for_ready(&plan.spec.name, validator, policy).await?;
    Ok(plan)
}

/// Classify the current resources for read-back
pub fn read_cluster(resources: &[CloudResource]) -> Classification {
    classify(resources)
}

/// Delete every non-shared resource. Returns the ids handed to teardown.
pub async fn delete_cluster(
    resources: &[CloudResource],
    engine: &dyn TeardownEngine,
) -> Result<Vec<String>, LifecycleError> {
    let doomed = deletion_set(resources);
    if doomed.is_empty() {
        info!("No cluster resources to delete");
        return Ok(Vec::new());
    }

    info!(
        "Deleting {} resource(s), keeping {} shared",
        doomed.len(),
        resources.len() - doomed.len()
    );
    engine.delete(&doomed).await.map_err(LifecycleError::Teardown)?;

    Ok(doomed.into_iter().map(|r| r.id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::testing::base_config;
    use crate::engine::mock::{MockApplyEngine, MockTeardownEngine, MockValidator};
    use crate::resources::InventoryBucket;
    use tokio_test::{assert_err, assert_ok};

    fn fast_policy() -> WaitPolicy {
        WaitPolicy {
            interval: Duration::from_secs(10),
            deadline: Duration::from_secs(60),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_when_ready() {
        let validator = MockValidator::ready_after(2);
        assert_ok!(wait_for_ready("dev.example.com", &validator, &fast_policy()).await);
        assert_eq!(validator.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_hits_deadline() {
        let validator = MockValidator::never_ready();
        let result = wait_for_ready("dev.example.com", &validator, &fast_policy()).await;

        match result {
            Err(LifecycleError::NotReady {
                cluster, waited, ..
            }) => {
                assert_eq!(cluster, "dev.example.com");
                assert_eq!(waited, Duration::from_secs(60));
            }
            other => panic!("expected NotReady, got {:?}", other),
        }
        assert!(validator.call_count() >= 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validator_errors_are_retried() {
        let validator = MockValidator::new(vec![
            Err(EngineError::new("validate", "api unreachable")),
            Ok(Readiness::Ready),
        ]);
        assert_ok!(wait_for_ready("dev.example.com", &validator, &fast_policy()).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_keeps_last_error() {
        let validator = MockValidator::new(vec![Err(EngineError::new("validate", "dns"))]);
        let result = wait_for_ready("dev.example.com", &validator, &fast_policy()).await;
        assert!(matches!(
            result,
            Err(LifecycleError::NotReady {
                last_error: Some(ref e),
                ..
            }) if e.contains("dns")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_applies_plan() {
        let engine = MockApplyEngine::default();
        let validator = MockValidator::ready_after(0);

        let plan = create_cluster(&base_config(), &engine, &validator, &fast_policy())
            .await
            .unwrap();

        let applied = engine.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0], plan);
    }

    #[tokio::test]
    async fn test_create_stops_on_synthesis_error() {
        let mut config = base_config();
        config.bastion = true;
        let engine = MockApplyEngine::default();
        let validator = MockValidator::ready_after(0);

        let result = create_cluster(&config, &engine, &validator, &fast_policy()).await;
        assert!(matches!(result, Err(LifecycleError::Synthesis(_))));
        assert!(engine.applied().is_empty());
        assert_eq!(validator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_surfaces_apply_failure() {
        let engine = MockApplyEngine::failing("quota exceeded");
        let validator = MockValidator::ready_after(0);

        let err = assert_err!(
            create_cluster(&base_config(), &engine, &validator, &fast_policy()).await
        );
        assert!(matches!(err, LifecycleError::Apply(_)));
        assert_eq!(validator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_skips_shared() {
        let resources = vec![
            CloudResource::new("vpc-1", "dev", "vpc").shared(),
            CloudResource::new("sg-1", "masters.dev", "security-group"),
            CloudResource::new("i-1", "nodes.dev", "instance"),
        ];
        let engine = MockTeardownEngine::default();

        let deleted = assert_ok!(delete_cluster(&resources, &engine).await);
        assert_eq!(deleted, vec!["sg-1", "i-1"]);
        assert_eq!(engine.deleted(), vec!["sg-1", "i-1"]);
    }

    #[test]
    fn test_delete_nothing_owned() {
        let resources = vec![CloudResource::new("vpc-1", "dev", "vpc").shared()];
        let engine = MockTeardownEngine::default();

        let deleted = tokio_test::block_on(delete_cluster(&resources, &engine)).unwrap();
        assert!(deleted.is_empty());
        assert!(engine.deleted().is_empty());
    }

    #[test]
    fn test_read_cluster_classifies() {
        let resources = vec![CloudResource::new("subnet-1", "a.dev", "subnet")];
        let result = read_cluster(&resources);
        assert_eq!(result.inventory.ids(InventoryBucket::Subnets), ["subnet-1"]);
    }

    #[test]
    fn test_default_policy() {
        let policy = WaitPolicy::default();
        assert!(policy.interval < policy.deadline);

        let err = LifecycleError::NotReady {
            cluster: "dev.example.com".to_string(),
            waited: Duration::from_secs(90),
            last_error: None,
        };
        assert_eq!(err.to_string(), "Cluster dev.example.com not ready after 90s");
    }
}
