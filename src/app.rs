//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs curve generation
//! - prints reports
//! - writes optional exports

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, CurveArgs, IncrementArgs, InputArgs};
use crate::domain::{CurveKey, RunConfig, StandPools};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `gc` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Curve(args) => handle_curve(args),
        Command::Increments(args) => handle_increments(args),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_curve(args: CurveArgs) -> Result<(), AppError> {
    let config = RunConfig {
        export_curve: args.export_curve.clone(),
        ..run_config_from_args(&args.input)
    };
    let run = pipeline::run_curves(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.ingest, &run.summaries, &run.failures, &config)
    );

    if let Some(path) = &config.export_curve {
        crate::io::write_curve_json(path, &run.curve_file())?;
        tracing::info!(path = %path.display(), "curve JSON written");
    }

    run.cache.clear();
    Ok(())
}

fn handle_increments(args: IncrementArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.input);
    let key = CurveKey::new(args.growth_curve, args.spu);

    let pools = (!args.pools.is_empty()).then(|| {
        args.pools
            .iter()
            .fold(StandPools::new(), |pools, (name, value)| pools.with(name.as_str(), *value))
    });

    let out = pipeline::run_increments(&config, key, args.age, pools.as_ref())?;
    println!("{}", crate::report::format_increments(out.key, out.age, &out.increments));
    Ok(())
}

pub fn run_config_from_args(args: &InputArgs) -> RunConfig {
    RunConfig {
        yields_path: args.yields.clone(),
        perd_path: args.perd.clone(),
        turnover_path: args.turnover.clone(),
        smoothing: !args.no_smoothing,
        export_curve: None,
        only: None,
    }
}
