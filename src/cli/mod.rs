//! Command-line parsing for the inventory risk radar.
//!
//! Parsing lives here and dispatch lives in `app`, so the analytics code never
//! sees clap types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ForecastMethod;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "radar", version, about = "Inventory stockout / dead-stock risk radar")]
pub struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build sales, inventory and catalog tables from a raw store/item export.
    Prepare(PrepareArgs),
    /// Forecast 7-day demand per product and write `forecast.csv`.
    Forecast(ForecastArgs),
    /// Score every product and write the report JSON.
    Report(ReportArgs),
}

#[derive(Debug, Args, Clone)]
pub struct PrepareArgs {
    /// Raw CSV with `date, store, item, sales` columns.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Directory that receives the prepared tables.
    #[arg(long, value_name = "DIR")]
    pub output: PathBuf,

    /// Keep this many products (by total sales).
    #[arg(long, default_value_t = 50)]
    pub top_products: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    /// Daily sales table (`date, product_id, sales`).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Forecast table to write.
    #[arg(long, value_name = "CSV")]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = ForecastMethod::Arima)]
    pub method: ForecastMethod,

    /// Trailing window (days) for the moving-average method.
    #[arg(long, default_value_t = 7)]
    pub window: usize,

    /// Autoregressive order.
    #[arg(long, default_value_t = 1)]
    pub p: usize,

    /// Differencing order.
    #[arg(long, default_value_t = 0)]
    pub d: usize,

    /// Moving-average order.
    #[arg(long, default_value_t = 1)]
    pub q: usize,

    /// Fit at most this many products with ARIMA.
    #[arg(long, default_value_t = 50)]
    pub max_products: usize,

    /// Worker threads (0 = one per core).
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Directory holding the four input tables.
    #[arg(long, env = "RADAR_DATA_DIR", value_name = "DIR")]
    pub data_dir: PathBuf,

    /// Report JSON to write.
    #[arg(long, value_name = "JSON", default_value = "result.json")]
    pub output: PathBuf,

    /// Apply the built-in demo inventory overrides.
    #[arg(long)]
    pub demo: bool,

    /// Inventory override table (JSON). Entries win over `--demo`.
    #[arg(long, value_name = "JSON")]
    pub overrides: Option<PathBuf>,

    /// Only report these product ids (repeatable).
    #[arg(long = "product", value_name = "ID")]
    pub products: Vec<String>,

    /// Only report products listed in a CSV with `store, item` columns.
    #[arg(long, value_name = "CSV", conflicts_with = "products")]
    pub select: Option<PathBuf>,

    /// Rows in the terminal summary.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn forecast_defaults() {
        let cli = Cli::try_parse_from(["radar", "forecast", "--input", "s.csv", "--output", "f.csv"]).unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.method, ForecastMethod::Arima);
        assert_eq!((args.p, args.d, args.q), (1, 0, 1));
        assert_eq!(args.max_products, 50);
        assert!(!cli.verbose);
    }

    #[test]
    fn report_accepts_repeated_products() {
        let cli = Cli::try_parse_from([
            "radar", "report", "--data-dir", "data", "--product", "1_1", "--product", "1_2", "-v",
        ])
        .unwrap();
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(args.products, vec!["1_1", "1_2"]);
        assert_eq!(args.output, PathBuf::from("result.json"));
        assert!(cli.verbose);
    }

    #[test]
    fn method_flag_is_kebab_case() {
        let cli = Cli::try_parse_from([
            "radar", "forecast", "--input", "s.csv", "--output", "f.csv", "--method", "moving-average",
        ])
        .unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.method, ForecastMethod::MovingAverage);
    }
}
