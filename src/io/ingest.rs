//! CSV ingest of the input tables.
//!
//! Headers are matched case-insensitively (BOM and surrounding whitespace
//! stripped). Unparsable numbers coerce to `0`; rows with an unparsable date
//! are dropped and counted. Spreadsheet files are rejected up front.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info};

use crate::domain::{CatalogRecord, DailyObservation, ForecastRecord, InventoryRecord, OverrideTable, RawSale};
use crate::error::AppError;

pub const SALES_FILE: &str = "sales_daily.csv";
pub const INVENTORY_FILE: &str = "inventory_snapshot.csv";
pub const FORECAST_FILE: &str = "forecast.csv";
pub const CATALOG_FILE: &str = "product_catalog.csv";

/// Row counts for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_dropped: usize,
}

impl IngestStats {
    pub fn rows_used(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// Locations of the four input tables inside a data directory.
#[derive(Debug, Clone)]
pub struct TablePaths {
    pub sales: PathBuf,
    pub inventory: PathBuf,
    pub forecast: PathBuf,
    pub catalog: PathBuf,
}

impl TablePaths {
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            sales: data_dir.join(SALES_FILE),
            inventory: data_dir.join(INVENTORY_FILE),
            forecast: data_dir.join(FORECAST_FILE),
            catalog: data_dir.join(CATALOG_FILE),
        }
    }

    /// Fail on the first table that does not exist.
    pub fn ensure_exist(&self) -> Result<(), AppError> {
        for path in [&self.sales, &self.inventory, &self.forecast, &self.catalog] {
            if !path.is_file() {
                return Err(AppError::missing_input(path));
            }
        }
        Ok(())
    }
}

/// All four tables, as typed records in file order.
#[derive(Debug, Clone, Default)]
pub struct InputTables {
    pub sales: Vec<DailyObservation>,
    pub inventory: Vec<InventoryRecord>,
    pub forecasts: Vec<ForecastRecord>,
    pub catalog: Vec<CatalogRecord>,
    pub sales_stats: IngestStats,
}

/// Load the four tables from `data_dir`.
///
/// Every table must exist before any is read.
pub fn load_tables(data_dir: &Path) -> Result<InputTables, AppError> {
    let paths = TablePaths::in_dir(data_dir);
    paths.ensure_exist()?;

    let (sales, sales_stats) = load_sales(&paths.sales)?;
    let inventory = load_inventory(&paths.inventory)?;
    let forecasts = load_forecasts(&paths.forecast)?;
    let catalog = load_catalog(&paths.catalog)?;

    info!(
        sales_rows = sales_stats.rows_used(),
        dropped = sales_stats.rows_dropped,
        inventory = inventory.len(),
        forecasts = forecasts.len(),
        catalog = catalog.len(),
        "input tables loaded"
    );

    Ok(InputTables {
        sales,
        inventory,
        forecasts,
        catalog,
        sales_stats,
    })
}

/// `date, product_id, sales`.
pub fn load_sales(path: &Path) -> Result<(Vec<DailyObservation>, IngestStats), AppError> {
    let mut table = Table::open(path, &["date", "product_id", "sales"])?;
    let mut out = Vec::new();

    let stats = table.for_each_row(|line, row| {
        let Some(date) = row.get("date").and_then(parse_date) else {
            debug!(path = %path.display(), line, "dropping row with unparsable date");
            return false;
        };
        out.push(DailyObservation {
            product_id: row.get("product_id").unwrap_or_default().to_string(),
            date,
            sales: to_number(row.get("sales")),
        });
        true
    })?;

    Ok((out, stats))
}

/// `product_id, inventory`.
pub fn load_inventory(path: &Path) -> Result<Vec<InventoryRecord>, AppError> {
    let mut table = Table::open(path, &["product_id", "inventory"])?;
    let mut out = Vec::new();
    table.for_each_row(|_, row| {
        out.push(InventoryRecord {
            product_id: row.get("product_id").unwrap_or_default().to_string(),
            inventory: to_number(row.get("inventory")).trunc() as i64,
        });
        true
    })?;
    Ok(out)
}

/// `product_id, forecast_next_7`.
pub fn load_forecasts(path: &Path) -> Result<Vec<ForecastRecord>, AppError> {
    let mut table = Table::open(path, &["product_id", "forecast_next_7"])?;
    let mut out = Vec::new();
    table.for_each_row(|_, row| {
        out.push(ForecastRecord {
            product_id: row.get("product_id").unwrap_or_default().to_string(),
            forecast_next_7: to_number(row.get("forecast_next_7")),
        });
        true
    })?;
    Ok(out)
}

/// `product_id, product_name`.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogRecord>, AppError> {
    let mut table = Table::open(path, &["product_id"])?;
    let mut out = Vec::new();
    table.for_each_row(|_, row| {
        out.push(CatalogRecord {
            product_id: row.get("product_id").unwrap_or_default().to_string(),
            product_name: row.get("product_name").unwrap_or_default().to_string(),
        });
        true
    })?;
    Ok(out)
}

/// Raw `date, store, item, sales` export.
///
/// Rows with a missing field, an unparsable date, or a non-numeric
/// store/item/sales value are dropped.
pub fn load_raw_sales(path: &Path) -> Result<(Vec<RawSale>, IngestStats), AppError> {
    let mut table = Table::open(path, &["date", "store", "item", "sales"])?;
    let mut out = Vec::new();

    let stats = table.for_each_row(|line, row| {
        let parsed = (|| {
            Some(RawSale {
                date: parse_date(row.get("date")?)?,
                store: parse_id_number(row.get("store")?)?,
                item: parse_id_number(row.get("item")?)?,
                sales: parse_finite(row.get("sales")?)?,
            })
        })();
        match parsed {
            Some(sale) => {
                out.push(sale);
                true
            }
            None => {
                debug!(path = %path.display(), line, "dropping incomplete raw sales row");
                false
            }
        }
    })?;

    Ok((out, stats))
}

/// Product ids (`store_item`) from a CSV with `store` and `item` columns.
///
/// Store and item numbers are truncated to integers (`10.0` is `10`), matching
/// the ids `prepare` writes. Ids are returned in first-seen order without
/// duplicates.
pub fn load_selection(path: &Path) -> Result<Vec<String>, AppError> {
    let mut table = Table::open(path, &["store", "item"])?;
    let mut ids: Vec<String> = Vec::new();

    table.for_each_row(|_, row| {
        let store = row.get("store").and_then(parse_id_number);
        let item = row.get("item").and_then(parse_id_number);
        let (Some(store), Some(item)) = (store, item) else {
            return false;
        };
        let id = format!("{store}_{item}");
        if !ids.contains(&id) {
            ids.push(id);
        }
        true
    })?;

    if ids.is_empty() {
        return Err(AppError::new(
            2,
            format!("Selection file '{}' contains no store/item rows.", path.display()),
        ));
    }
    Ok(ids)
}

/// Inventory override table: `{"product_id": {"scale": f, "floor": n}, ...}`.
pub fn load_overrides(path: &Path) -> Result<OverrideTable, AppError> {
    if !path.is_file() {
        return Err(AppError::missing_input(path));
    }
    let file = File::open(path).map_err(|e| AppError::io("open override table", path, e))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid override table '{}': {e}", path.display())))
}

/// Numeric cell value; anything unparsable (or missing) is `0`.
pub fn to_number(value: Option<&str>) -> f64 {
    value.and_then(parse_finite).unwrap_or(0.0)
}

/// An open CSV table with its normalized header index.
struct Table {
    path: PathBuf,
    reader: csv::Reader<File>,
    header_map: HashMap<String, usize>,
}

impl Table {
    fn open(path: &Path, required: &[&str]) -> Result<Self, AppError> {
        reject_spreadsheet(path)?;
        if !path.is_file() {
            return Err(AppError::missing_input(path));
        }

        let file = File::open(path).map_err(|e| AppError::io("open CSV", path, e))?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| AppError::io("read CSV headers of", path, e))?
            .clone();
        let header_map = build_header_map(&headers);

        for name in required {
            if !header_map.contains_key(*name) {
                return Err(AppError::new(
                    2,
                    format!("Missing required column `{name}` in '{}'", path.display()),
                ));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header_map,
        })
    }

    /// Feed each record to `f`; `f` returns whether the row was kept.
    ///
    /// Records the csv reader cannot parse count as dropped.
    fn for_each_row<F>(&mut self, mut f: F) -> Result<IngestStats, AppError>
    where
        F: FnMut(usize, Row<'_>) -> bool,
    {
        let mut stats = IngestStats::default();
        for (idx, result) in self.reader.records().enumerate() {
            // records() starts after the header line; lines are 1-based.
            let line = idx + 2;
            stats.rows_read += 1;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    debug!(path = %self.path.display(), line, error = %e, "dropping unreadable CSV record");
                    stats.rows_dropped += 1;
                    continue;
                }
            };

            let row = Row {
                record: &record,
                header_map: &self.header_map,
            };
            if !f(line, row) {
                stats.rows_dropped += 1;
            }
        }
        Ok(stats)
    }
}

/// Header-addressed view of one record.
#[derive(Clone, Copy)]
struct Row<'a> {
    record: &'a StringRecord,
    header_map: &'a HashMap<String, usize>,
}

impl<'a> Row<'a> {
    /// Trimmed, non-empty value of column `name`.
    fn get(&self, name: &str) -> Option<&'a str> {
        let idx = self.header_map.get(name)?;
        self.record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
    }
}

fn reject_spreadsheet(path: &Path) -> Result<(), AppError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if matches!(ext.as_deref(), Some("xlsx" | "xls")) {
        return Err(AppError::new(
            2,
            format!(
                "Spreadsheet input '{}' is not supported; export it to CSV first.",
                path.display()
            ),
        ));
    }
    Ok(())
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    // Timestamps such as `2017-01-01 00:00:00` keep only their date part.
    let s = s.split([' ', 'T']).next().unwrap_or(s);
    FMTS.iter().find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_finite(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Store/item numbers may be written as floats (`"3.0"`).
fn parse_id_number(s: &str) -> Option<i64> {
    parse_finite(s).map(|v| v.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn sales_headers_are_case_and_bom_tolerant() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "sales.csv",
            "\u{feff}Date, Product_ID ,SALES\n2024-01-01,1_1,3\n2024-01-02,1_1,abc\nnot-a-date,1_1,4\n",
        );

        let (rows, stats) = load_sales(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, "1_1");
        assert_eq!(rows[0].sales, 3.0);
        assert_eq!(rows[1].sales, 0.0);
        assert_eq!(stats, IngestStats { rows_read: 3, rows_dropped: 1 });
    }

    #[test]
    fn missing_column_is_an_input_error() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "inventory.csv", "product_id,stock\nA,3\n");
        let err = load_inventory(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("inventory"));
    }

    #[test]
    fn load_tables_requires_every_file_first() {
        let dir = TempDir::new().unwrap();
        write(&dir, SALES_FILE, "date,product_id,sales\n2024-01-01,A,1\n");
        write(&dir, INVENTORY_FILE, "product_id,inventory\nA,10\n");
        write(&dir, CATALOG_FILE, "product_id,product_name\nA,Apple\n");

        let err = load_tables(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains(FORECAST_FILE));

        write(&dir, FORECAST_FILE, "product_id,forecast_next_7\nA,7.5\n");
        let tables = load_tables(dir.path()).unwrap();
        assert_eq!(tables.sales.len(), 1);
        assert_eq!(tables.inventory[0].inventory, 10);
        assert_eq!(tables.forecasts[0].forecast_next_7, 7.5);
        assert_eq!(tables.catalog[0].product_name, "Apple");
    }

    #[test]
    fn inventory_values_are_truncated_and_coerced() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "inv.csv", "product_id,inventory\nA,12.9\nB,\nC,n/a\n");
        let rows = load_inventory(&path).unwrap();
        let values: Vec<i64> = rows.iter().map(|r| r.inventory).collect();
        assert_eq!(values, vec![12, 0, 0]);
    }

    #[test]
    fn raw_sales_drop_incomplete_rows() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "train.csv",
            "date,store,item,sales\n2017-01-01,1,2,13\n2017-01-02,1.0,2.0,11\n2017-01-03,,2,5\nbad,1,2,5\n",
        );
        let (rows, stats) = load_raw_sales(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].product_id(), "1_2");
        assert_eq!(stats.rows_dropped, 2);
    }

    #[test]
    fn selection_reads_store_item_pairs() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "test.csv", "id,Store,Item\n0,10,13\n1,10,13\n2,10,25\n");
        assert_eq!(load_selection(&path).unwrap(), vec!["10_13", "10_25"]);

        // Float-formatted numbers map to the same ids `prepare` writes.
        let floats = write(&dir, "floats.csv", "store,item\n10.0,13\n10,13.0\nx,4\n");
        assert_eq!(load_selection(&floats).unwrap(), vec!["10_13"]);

        let bad = write(&dir, "bad.csv", "id,store\n0,10\n");
        assert_eq!(load_selection(&bad).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn spreadsheets_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "sales.XLSX", "");
        let err = load_raw_sales(&path).unwrap_err();
        assert!(err.message().contains("not supported"));
    }

    #[test]
    fn overrides_load_from_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "overrides.json", r#"{"10_13": {"scale": 0.5}}"#);
        let table = load_overrides(&path).unwrap();
        assert_eq!(table["10_13"].apply(11), 5);

        let bad = write(&dir, "bad.json", r#"{"10_13": {"factor": 2}}"#);
        assert_eq!(load_overrides(&bad).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn number_coercion() {
        assert_eq!(to_number(Some("4.5")), 4.5);
        assert_eq!(to_number(Some("NaN")), 0.0);
        assert_eq!(to_number(Some("x")), 0.0);
        assert_eq!(to_number(None), 0.0);
    }

    #[test]
    fn dates_accept_timestamps() {
        assert_eq!(parse_date("2024-03-01 00:00:00"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("01/03/2024"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("March 1"), None);
    }
}
