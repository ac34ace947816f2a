//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - turns flags into config structs
//! - runs the pipeline and prints the terminal summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ForecastArgs, PrepareArgs, ReportArgs};
use crate::domain::{ArimaOrder, ForecastConfig, PrepareConfig, ReportConfig, demo_overrides};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `radar` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Prepare(args) => handle_prepare(&args),
        Command::Forecast(args) => handle_forecast(&args),
        Command::Report(args) => handle_report(&args),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_prepare(args: &PrepareArgs) -> Result<(), AppError> {
    let config = prepare_config_from_args(args);
    let tables = pipeline::run_prepare(&config)?;
    println!(
        "Prepared {} products ({} daily rows) in {}",
        tables.inventory.len(),
        tables.sales.len(),
        config.output_dir.display()
    );
    Ok(())
}

fn handle_forecast(args: &ForecastArgs) -> Result<(), AppError> {
    let config = forecast_config_from_args(args);
    let records = pipeline::run_forecast(&args.input, &args.output, &config)?;
    println!("Wrote {} forecasts to {}", records.len(), args.output.display());
    Ok(())
}

fn handle_report(args: &ReportArgs) -> Result<(), AppError> {
    let config = report_config_from_args(args)?;
    let doc = pipeline::run_report(&config)?;
    print!("{}", crate::report::format_report_summary(&doc, config.top_n));
    println!("\nWrote {}", config.output.display());
    Ok(())
}

pub fn prepare_config_from_args(args: &PrepareArgs) -> PrepareConfig {
    PrepareConfig {
        input: args.input.clone(),
        output_dir: args.output.clone(),
        top_products: args.top_products,
    }
}

pub fn forecast_config_from_args(args: &ForecastArgs) -> ForecastConfig {
    ForecastConfig {
        method: args.method,
        window: args.window,
        order: ArimaOrder {
            p: args.p,
            d: args.d,
            q: args.q,
        },
        max_products: args.max_products,
        jobs: args.jobs,
    }
}

/// Resolve overrides (`--demo`, then `--overrides` entries on top) and the
/// product selection (`--product` ids or a `--select` CSV).
pub fn report_config_from_args(args: &ReportArgs) -> Result<ReportConfig, AppError> {
    let mut overrides = if args.demo { demo_overrides() } else { Default::default() };
    if let Some(path) = &args.overrides {
        overrides.extend(crate::io::load_overrides(path)?);
    }

    let selection = match &args.select {
        Some(path) => Some(crate::io::load_selection(path)?),
        None if !args.products.is_empty() => Some(args.products.clone()),
        None => None,
    };

    Ok(ReportConfig {
        data_dir: args.data_dir.clone(),
        output: args.output.clone(),
        overrides,
        selection,
        top_n: args.top,
    })
}
