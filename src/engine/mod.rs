//! External cluster engines
//!
//! Provisioning, teardown and validation happen outside this crate. The
//! traits here are the boundary; [`lifecycle`] drives them.

pub mod lifecycle;

pub use lifecycle::{
    create_cluster, delete_cluster, read_cluster, wait_for_ready, LifecycleError, WaitPolicy,
};

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::CloudResource;
use crate::spec::ClusterPlan;

/// Failure reported by an external engine
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{operation} failed: {message}")]
pub struct EngineError {
    pub operation: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Cluster state as seen by a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    Converging,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readiness::Ready => write!(f, "ready"),
            Readiness::Converging => write!(f, "converging"),
        }
    }
}

// ============================================================================
// SBIO: Traits for abstraction (allows mocking in tests)
// ============================================================================

/// Creates or updates the cloud infrastructure for a plan
#[async_trait]
pub trait ApplyEngine: Send + Sync {
    async fn apply(&self, plan: &ClusterPlan) -> Result<(), EngineError>;
}

/// Deletes enumerated cloud resources
#[async_trait]
pub trait TeardownEngine: Send + Sync {
    async fn delete(&self, resources: &[CloudResource]) -> Result<(), EngineError>;
}

/// Checks whether a cluster has converged
#[async_trait]
pub trait ClusterValidator: Send + Sync {
    async fn validate(&self, cluster_name: &str) -> Result<Readiness, EngineError>;
}

// ============================================================================
// SBIO: Mock implementations for testing (no I/O)
// ============================================================================
