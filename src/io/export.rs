//! Output writers: the report JSON document and the CSV tables.
//!
//! Every writer renders the full output in memory first, then writes it to a
//! sibling temporary file that is renamed over the target. A failure never
//! leaves a partial file behind.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::domain::{CatalogRecord, DailyObservation, ForecastRecord, InventoryRecord, ReportDocument};
use crate::error::AppError;

/// Write the report document as pretty JSON.
pub fn write_report_json(path: &Path, doc: &ReportDocument) -> Result<(), AppError> {
    let body = serde_json::to_string_pretty(doc).map_err(|e| AppError::io("serialize report for", path, e))?;
    write_file(path, body.as_bytes())
}

/// `product_id,forecast_next_7` with two decimals.
pub fn write_forecast_csv(path: &Path, records: &[ForecastRecord]) -> Result<(), AppError> {
    let rows = records
        .iter()
        .map(|r| vec![r.product_id.clone(), format!("{:.2}", r.forecast_next_7)]);
    write_csv(path, &["product_id", "forecast_next_7"], rows)
}

/// `date,product_id,sales`.
pub fn write_sales_csv(path: &Path, rows: &[DailyObservation]) -> Result<(), AppError> {
    let rows = rows
        .iter()
        .map(|r| vec![r.date.to_string(), r.product_id.clone(), r.sales.to_string()]);
    write_csv(path, &["date", "product_id", "sales"], rows)
}

/// `product_id,inventory`.
pub fn write_inventory_csv(path: &Path, rows: &[InventoryRecord]) -> Result<(), AppError> {
    let rows = rows
        .iter()
        .map(|r| vec![r.product_id.clone(), r.inventory.to_string()]);
    write_csv(path, &["product_id", "inventory"], rows)
}

/// `product_id,product_name`.
pub fn write_catalog_csv(path: &Path, rows: &[CatalogRecord]) -> Result<(), AppError> {
    let rows = rows
        .iter()
        .map(|r| vec![r.product_id.clone(), r.product_name.clone()]);
    write_csv(path, &["product_id", "product_name"], rows)
}

fn write_csv<I>(path: &Path, header: &[&str], rows: I) -> Result<(), AppError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|e| AppError::io("write CSV header for", path, e))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| AppError::io("write CSV row for", path, e))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| AppError::io("finish CSV for", path, e))?;
    write_file(path, &body)
}

/// Create parent directories, then atomically replace `path` with `body`.
fn write_file(path: &Path, body: &[u8]) -> Result<(), AppError> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(|e| AppError::io("create directory", parent, e))?;
            parent
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| AppError::io("create temporary file in", parent, e))?;
    tmp.write_all(body).map_err(|e| AppError::io("write", path, e))?;
    tmp.flush().map_err(|e| AppError::io("write", path, e))?;
    tmp.persist(path).map_err(|e| AppError::io("replace", path, e))?;
    Ok(())
}
