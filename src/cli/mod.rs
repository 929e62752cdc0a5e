//! CLI module for kopsplan
//!
//! Provides dry-run subcommands:
//! - `kopsplan plan` - Synthesize a cluster plan from a parameters file
//! - `kopsplan validate` - Check a parameters file without printing the plan
//! - `kopsplan inventory` - Classify a resource snapshot
//! - `kopsplan deletion-set` - Show what a teardown would remove
//! - `kopsplan labels` - Parse a cloud label string

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::DEFAULTS_ENV_VAR;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "kopsplan")]
#[command(about = "Synthesize kops cluster specs and classify cluster cloud resources")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to a .env file loaded before anything else
    #[arg(long, value_name = "FILE", global = true)]
    pub env_file: Option<PathBuf>,

    /// Synthesis defaults override (default: ~/.kopsplan/defaults.yaml)
    #[arg(long, value_name = "FILE", global = true, env = DEFAULTS_ENV_VAR)]
    pub defaults: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize and print a cluster plan (nothing is applied)
    Plan(PlanArgs),

    /// Validate a parameters file
    Validate(ValidateArgs),

    /// Classify a resource snapshot into an inventory
    Inventory(InventoryArgs),

    /// Print the resource ids a teardown would delete
    #[command(name = "deletion-set")]
    DeletionSet(DeletionSetArgs),

    /// Parse a cloud label string
    Labels(LabelsArgs),
}

/// Plan output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlanOutput {
    #[default]
    Yaml,
    Json,
    Summary,
}

/// Inventory output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InventoryOutput {
    #[default]
    Table,
    Json,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Cluster parameters file (YAML or JSON)
    pub file: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = PlanOutput::Yaml)]
    pub output: PlanOutput,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Cluster parameters file (YAML or JSON)
    pub file: PathBuf,
}

/// Arguments for the inventory command
#[derive(Parser, Debug)]
pub struct InventoryArgs {
    /// Resource snapshot (JSON list, or map keyed by id)
    pub file: PathBuf,

    #[arg(short, long, value_enum, default_value_t = InventoryOutput::Table)]
    pub output: InventoryOutput,
}

/// Arguments for the deletion-set command
#[derive(Parser, Debug)]
pub struct DeletionSetArgs {
    /// Resource snapshot (JSON list, or map keyed by id)
    pub file: PathBuf,
}

/// Arguments for the labels command
#[derive(Parser, Debug)]
pub struct LabelsArgs {
    /// Label string, e.g. 'Owner=John Doe,Team="a=b"'
    pub labels: String,
}
