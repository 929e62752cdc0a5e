pub mod defaults;
pub mod labels;
pub mod normalize;
pub mod params;

pub use defaults::SynthesisDefaults;
pub use labels::{parse_cloud_labels, LabelError};
pub use normalize::{normalize, validate_cidr, validate_cluster_name, ClusterConfig, NormalizeError};
pub use params::ClusterParams;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a defaults override file
pub const DEFAULTS_ENV_VAR: &str = "KOPSPLAN_DEFAULTS";

/// Default defaults-override location: ~/.kopsplan/defaults.yaml
pub fn default_defaults_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kopsplan")
        .join("defaults.yaml")
}

/// Errors for file I/O operations (separate from pure parsing errors)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },
}

// ============================================================================
// SBIO: Pure parsing (no I/O)
// ============================================================================

/// Parse cluster parameters from YAML (or JSON, which YAML accepts)
pub fn parse_params(content: &str) -> Result<ClusterParams, serde_yaml::Error> {
    let mut params: ClusterParams = serde_yaml::from_str(content)?;
    params.ssh_public_key = params
        .ssh_public_key
        .map(|path| shellexpand::tilde(&path).into_owned());
    Ok(params)
}

/// Parse a defaults override; missing keys keep their built-in values
pub fn parse_defaults(content: &str) -> Result<SynthesisDefaults, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(SynthesisDefaults::default());
    }
    serde_yaml::from_str(content)
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load cluster parameters from disk
pub fn load_params_file(path: &Path) -> Result<ClusterParams, ConfigError> {
    let content = read_file(path)?;
    parse_params(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load a defaults override file from disk
pub fn load_defaults_file(path: &Path) -> Result<SynthesisDefaults, ConfigError> {
    let content = read_file(path)?;
    parse_defaults(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Resolve the defaults to synthesize with.
///
/// An explicit path must exist. Without one, the home-directory file is used
/// if present, else the built-in defaults.
pub fn resolve_defaults(explicit: Option<&Path>) -> Result<SynthesisDefaults, ConfigError> {
    match explicit {
        Some(path) => load_defaults_file(path),
        None => {
            let path = default_defaults_path();
            if path.exists() {
                load_defaults_file(&path)
            } else {
                Ok(SynthesisDefaults::default())
            }
        }
    }
}
