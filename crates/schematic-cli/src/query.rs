//! # Model Query Subcommands
//!
//! Read-only views of the metadata model: the compiled validation schema,
//! the ordered attributes of a component, and component requirements.
//! Output is JSON on stdout.

use anyhow::{Context, Result};
use clap::Args;

use schematic_graph::relationship;
use schematic_model::MetadataModel;

/// Arguments for `schematic schema`.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Component whose validation schema is printed.
    #[arg(long)]
    pub root: String,
}

/// Arguments for `schematic order`.
#[derive(Args, Debug)]
pub struct OrderArgs {
    /// Component whose descendants are ordered.
    #[arg(long)]
    pub root: String,

    /// Relation to traverse.
    #[arg(long, default_value = relationship::REQUIRES_DEPENDENCY)]
    pub relationship: String,
}

/// Arguments for `schematic requirements`.
#[derive(Args, Debug)]
pub struct RequirementsArgs {
    /// Component whose required components are listed.
    #[arg(long)]
    pub component: String,
}

/// Print the compiled validation schema.
pub fn run_schema(args: &SchemaArgs, model: &MetadataModel) -> Result<u8> {
    let schema = model
        .validation_schema(&args.root)
        .with_context(|| format!("failed to compile validation schema for {}", args.root))?;
    println!("{}", serde_json::to_string_pretty(&schema.to_json())?);
    Ok(0)
}

/// Print the prerequisite-first node order.
pub fn run_order(args: &OrderArgs, model: &MetadataModel) -> Result<u8> {
    let nodes = model
        .ordered_model_nodes(&args.root, &args.relationship)
        .with_context(|| format!("failed to order {} over {}", args.root, args.relationship))?;
    println!("{}", serde_json::to_string_pretty(&nodes)?);
    Ok(0)
}

/// Print the components required by a component.
pub fn run_requirements(args: &RequirementsArgs, model: &MetadataModel) -> Result<u8> {
    let components = model
        .component_requirements(&args.component)
        .with_context(|| format!("failed to list requirements of {}", args.component))?;
    println!("{}", serde_json::to_string_pretty(&components)?);
    Ok(0)
}
