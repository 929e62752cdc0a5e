//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, I/O is handled by caller

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::config::{
    load_params_file, parse_cloud_labels, ConfigError, LabelError, SynthesisDefaults,
};
use crate::resources::{
    classify, deletion_set, load_snapshot_file, Classification, CloudResource, ResourceError,
};
use crate::spec::{synthesize_params, ClusterPlan, SynthesisError};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Resources(#[from] ResourceError),

    #[error(transparent)]
    Labels(#[from] LabelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Plan commands
// ============================================================================

/// Load parameters and synthesize a plan
pub fn plan_from_file(path: &Path, defaults: &SynthesisDefaults) -> CommandResult<ClusterPlan> {
    let params = load_params_file(path)?;
    Ok(synthesize_params(&params, defaults)?)
}

/// Outcome of validating a parameters file
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub cluster: Option<String>,
    pub fingerprint: Option<String>,
    pub errors: Vec<String>,
}

/// Validate a parameters file: it must load, normalize and synthesize
pub fn validate_params_file(path: &Path, defaults: &SynthesisDefaults) -> ValidationResult {
    match plan_from_file(path, defaults) {
        Ok(plan) => ValidationResult {
            valid: true,
            cluster: Some(plan.spec.name.clone()),
            fingerprint: Some(plan.fingerprint()),
            errors: Vec::new(),
        },
        Err(e) => ValidationResult {
            valid: false,
            cluster: None,
            fingerprint: None,
            errors: vec![e.to_string()],
        },
    }
}

// ============================================================================
// Resource commands
// ============================================================================

/// Load a snapshot and classify it
pub fn inventory_from_file(path: &Path) -> CommandResult<Classification> {
    let resources = load_snapshot_file(path)?;
    Ok(classify(&resources))
}

/// Load a snapshot and select the resources teardown would delete
pub fn deletion_set_from_file(path: &Path) -> CommandResult<Vec<CloudResource>> {
    let resources = load_snapshot_file(path)?;
    Ok(deletion_set(&resources))
}

// ============================================================================
// Label commands
// ============================================================================

pub fn parse_labels(input: &str) -> CommandResult<BTreeMap<String, String>> {
    Ok(parse_cloud_labels(input)?)
}
