//! Command-line parsing for the growth-curve carbon tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the conversion and fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gc", version, about = "Growth curve to biomass carbon converter")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build carbon curves for every stand in the yield CSV and print a summary.
    Curve(CurveArgs),
    /// Print the carbon increments of one stand at one age.
    Increments(IncrementArgs),
}

/// Inputs shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Yield CSV (`growth_curve_id,spu_id,species,age,merchantable_volume`).
    #[arg(long, value_name = "CSV")]
    pub yields: PathBuf,

    /// PERD factor CSV (one row per species group).
    #[arg(long, value_name = "CSV")]
    pub perd: PathBuf,

    /// Optional single-row turnover rate CSV.
    #[arg(long, value_name = "CSV")]
    pub turnover: Option<PathBuf>,

    /// Keep raw converted carbon at low ages.
    #[arg(long)]
    pub no_smoothing: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CurveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Export every generated curve to JSON.
    #[arg(long = "export-curve", value_name = "JSON")]
    pub export_curve: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct IncrementArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[arg(long)]
    pub growth_curve: i64,

    #[arg(long)]
    pub spu: i64,

    /// Stand age (years).
    #[arg(long)]
    pub age: usize,

    /// Current pool value, e.g. `--pool SoftwoodMerch=12.5`. Repeatable.
    /// Supplying pools floors declines and adds root increments.
    #[arg(long = "pool", value_name = "NAME=VALUE", value_parser = parse_pool)]
    pub pools: Vec<(String, f64)>,
}

fn parse_pool(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid pool value '{value}'"))?;
    Ok((name.trim().to_string(), value))
}
