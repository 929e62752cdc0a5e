use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use kopsplan::cli::{
    deletion_set_from_file, format_deletion_set, format_labels, format_validation_result,
    inventory_from_file, parse_labels, plan_from_file, render_inventory, render_plan,
    validate_params_file, Cli, Commands,
};
use kopsplan::config::{resolve_defaults, SynthesisDefaults, DEFAULTS_ENV_VAR};

fn load_defaults(path: Option<&Path>) -> Result<SynthesisDefaults> {
    resolve_defaults(path).context("Failed to load synthesis defaults")
}

fn run(cli: Cli) -> Result<()> {
    // The env file may set the defaults path after clap has already looked
    let defaults_path = cli
        .defaults
        .or_else(|| std::env::var_os(DEFAULTS_ENV_VAR).map(PathBuf::from));

    match cli.command {
        Commands::Plan(args) => {
            let defaults = load_defaults(defaults_path.as_deref())?;
            let plan = plan_from_file(&args.file, &defaults)
                .with_context(|| format!("Failed to plan {}", args.file.display()))?;
            print!("{}", render_plan(&plan, args.output)?);
        }
        Commands::Validate(args) => {
            let defaults = load_defaults(defaults_path.as_deref())?;
            let result = validate_params_file(&args.file, &defaults);
            print!("{}", format_validation_result(&result));
            if !result.valid {
                process::exit(1);
            }
        }
        Commands::Inventory(args) => {
            let classification = inventory_from_file(&args.file)
                .with_context(|| format!("Failed to classify {}", args.file.display()))?;
            print!("{}", render_inventory(&classification, args.output)?);
        }
        Commands::DeletionSet(args) => {
            let doomed = deletion_set_from_file(&args.file)
                .with_context(|| format!("Failed to read {}", args.file.display()))?;
            print!("{}", format_deletion_set(&doomed));
        }
        Commands::Labels(args) => {
            let labels = parse_labels(&args.labels)?;
            print!("{}", format_labels(&labels));
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if specified
    if let Some(ref env_file) = cli.env_file {
        if let Err(e) = dotenvy::from_path(env_file) {
            error!("Failed to load env file {}: {}", env_file.display(), e);
            process::exit(1);
        }
        debug!("Loaded environment from {}", env_file.display());
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}
