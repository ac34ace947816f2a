//! Shared pipeline logic behind the CLI subcommands.
//!
//! Each `run_*` function takes a plain config struct, does the I/O around the
//! analytics, and returns what it computed so callers decide how to present it.

use std::path::Path;

use tracing::info;

use crate::data::{PreparedTables, prepare};
use crate::domain::{ForecastConfig, ForecastRecord, PrepareConfig, ReportConfig, ReportDocument};
use crate::error::AppError;
use crate::forecast::forecast_batch;
use crate::io::{
    CATALOG_FILE, INVENTORY_FILE, SALES_FILE, load_raw_sales, load_sales, load_tables, write_catalog_csv,
    write_forecast_csv, write_inventory_csv, write_report_json, write_sales_csv,
};
use crate::report::{Lookups, assemble_report, select_series};
use crate::series::group_by_product;

/// Load the data directory, score every (selected) product, and write the
/// report JSON.
pub fn run_report(config: &ReportConfig) -> Result<ReportDocument, AppError> {
    let tables = load_tables(&config.data_dir)?;
    let lookups = Lookups::new(&tables.inventory, &tables.forecasts, &tables.catalog);

    let series = group_by_product(tables.sales)?;
    let series = select_series(series, config.selection.as_deref());
    info!(products = series.len(), overrides = config.overrides.len(), "assembling report");

    let doc = assemble_report(&series, &lookups, config);
    write_report_json(&config.output, &doc)?;
    info!(path = %config.output.display(), products = doc.products.len(), "report written");

    Ok(doc)
}

/// Forecast every product in the sales table at `input` and write `output`.
pub fn run_forecast(input: &Path, output: &Path, config: &ForecastConfig) -> Result<Vec<ForecastRecord>, AppError> {
    let (sales, stats) = load_sales(input)?;
    info!(rows = stats.rows_used(), dropped = stats.rows_dropped, "sales loaded");

    let series = group_by_product(sales)?;
    let records = forecast_batch(&series, config)?;
    write_forecast_csv(output, &records)?;
    info!(path = %output.display(), products = records.len(), "forecast written");

    Ok(records)
}

/// Turn a raw store/item export into the sales, inventory and catalog tables.
pub fn run_prepare(config: &PrepareConfig) -> Result<PreparedTables, AppError> {
    let (rows, stats) = load_raw_sales(&config.input)?;
    if rows.is_empty() {
        return Err(AppError::new(
            3,
            format!("No valid rows in '{}'.", config.input.display()),
        ));
    }
    info!(rows = stats.rows_used(), dropped = stats.rows_dropped, "raw sales loaded");

    let tables = prepare(&rows, config.top_products);

    let dir = &config.output_dir;
    write_sales_csv(&dir.join(SALES_FILE), &tables.sales)?;
    write_inventory_csv(&dir.join(INVENTORY_FILE), &tables.inventory)?;
    write_catalog_csv(&dir.join(CATALOG_FILE), &tables.catalog)?;
    info!(dir = %dir.display(), products = tables.inventory.len(), "prepared tables written");

    Ok(tables)
}
