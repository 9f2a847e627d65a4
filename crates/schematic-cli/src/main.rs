//! # schematic CLI entry point
//!
//! Parses command-line arguments, loads the configured metadata model, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use schematic_cli::query::{
    run_order, run_requirements, run_schema, OrderArgs, RequirementsArgs, SchemaArgs,
};
use schematic_cli::submit::{run_submit, SubmitArgs};
use schematic_cli::validate::{run_validate, ValidateArgs};
use schematic_cli::{load_model, DEFAULT_CONFIG_FILE};

/// Metadata model toolkit.
///
/// Validates tabular metadata manifests against a JSON-LD metadata model,
/// stores validated manifests, and inspects the model's components.
#[derive(Parser, Debug)]
#[command(name = "schematic", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a manifest against a component.
    Validate(ValidateArgs),

    /// Validate (optionally) and associate a manifest with a dataset.
    Submit(SubmitArgs),

    /// Print the validation schema compiled for a component.
    Schema(SchemaArgs),

    /// Print a component's attributes, prerequisites first.
    Order(OrderArgs),

    /// Print the components a component requires.
    Requirements(RequirementsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(config = %cli.config.display(), "schematic CLI starting");

    let result = load_model(&cli.config).and_then(|(config, model)| match &cli.command {
        Commands::Validate(args) => run_validate(args, &model, &config),
        Commands::Submit(args) => run_submit(args, &model),
        Commands::Schema(args) => run_schema(args, &model),
        Commands::Order(args) => run_order(args, &model),
        Commands::Requirements(args) => run_requirements(args, &model),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
