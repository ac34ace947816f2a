//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - read from the input tables
//! - passed between the analytics stages
//! - exported to JSON/CSV

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of days covered by a forecast value (`forecast_next_7`).
pub const FORECAST_HORIZON_DAYS: usize = 7;

/// One day of sales for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyObservation {
    pub product_id: String,
    pub date: NaiveDate,
    pub sales: f64,
}

/// A `{date, sales}` point as emitted in the report's `trend` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesPoint {
    pub date: NaiveDate,
    pub sales: f64,
}

/// One row of a raw store/item sales export (input of `prepare`).
#[derive(Debug, Clone, PartialEq)]
pub struct RawSale {
    pub date: NaiveDate,
    pub store: i64,
    pub item: i64,
    pub sales: f64,
}

impl RawSale {
    /// `"{store}_{item}"`.
    pub fn product_id(&self) -> String {
        format!("{}_{}", self.store, self.item)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    pub product_id: String,
    pub inventory: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    pub product_id: String,
    pub forecast_next_7: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub product_id: String,
    pub product_name: String,
}

/// Demand trajectory label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandTrend {
    Rising,
    Falling,
    Stable,
    Flat,
}

/// Resolved risk family and severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskType {
    #[serde(rename = "High Stockout Risk")]
    HighStockout,
    #[serde(rename = "Medium Stockout Risk")]
    MediumStockout,
    #[serde(rename = "High Dead Inventory Risk")]
    HighDeadInventory,
    #[serde(rename = "Medium Dead Inventory Risk")]
    MediumDeadInventory,
    #[serde(rename = "No Risk")]
    NoRisk,
}

impl RiskType {
    pub const ALL: [RiskType; 5] = [
        RiskType::HighStockout,
        RiskType::MediumStockout,
        RiskType::HighDeadInventory,
        RiskType::MediumDeadInventory,
        RiskType::NoRisk,
    ];

    /// Label used in reports and terminal output.
    pub fn label(self) -> &'static str {
        match self {
            RiskType::HighStockout => "High Stockout Risk",
            RiskType::MediumStockout => "Medium Stockout Risk",
            RiskType::HighDeadInventory => "High Dead Inventory Risk",
            RiskType::MediumDeadInventory => "Medium Dead Inventory Risk",
            RiskType::NoRisk => "No Risk",
        }
    }
}

/// Output of the risk classifier for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    /// `inventory / avg7`; `None` when there is no recent demand.
    pub days_of_cover: Option<f64>,
    /// Cover rounded to two places ("Infinity" when absent); cited by `explanation`.
    pub days_of_cover_label: String,
    pub sell_through_30d: f64,
    pub stockout_score: f64,
    pub dead_score: f64,
    pub risk_type: RiskType,
    /// Selected score rounded to an integer (0 for `NoRisk`).
    pub risk_score: u8,
    pub risk_reason: &'static str,
    pub explanation: String,
}

/// One row of the final report.
///
/// Field names follow the JSON document consumed by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReport {
    pub product_id: String,
    pub product_name: String,
    pub inventory: i64,
    pub avg7: f64,
    pub avg14: f64,
    #[serde(rename = "forecastNext7")]
    pub forecast_next_7: f64,
    #[serde(rename = "daysOfCover")]
    pub days_of_cover: Option<f64>,
    #[serde(rename = "daysOfCoverLabel")]
    pub days_of_cover_label: String,
    #[serde(rename = "sellThrough30d")]
    pub sell_through_30d: f64,
    #[serde(rename = "demandTrend")]
    pub demand_trend: DemandTrend,
    #[serde(rename = "demandSpike")]
    pub demand_spike: bool,
    #[serde(rename = "stockoutScore")]
    pub stockout_score: u8,
    #[serde(rename = "deadInventoryScore")]
    pub dead_inventory_score: u8,
    #[serde(rename = "riskType")]
    pub risk_type: RiskType,
    #[serde(rename = "riskScore")]
    pub risk_score: u8,
    #[serde(rename = "riskReason")]
    pub risk_reason: String,
    pub explanation: String,
    /// Trailing 30 raw observations.
    pub trend: Vec<SalesPoint>,
}

/// The full report document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub products: Vec<ProductReport>,
}

/// Inventory adjustment applied before any inventory-dependent metric.
///
/// The adjusted value is `trunc(max(inventory * scale, floor))`, with either
/// part optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i64>,
}

impl InventoryOverride {
    pub fn scale(factor: f64) -> Self {
        Self {
            scale: Some(factor),
            floor: None,
        }
    }

    pub fn floor(min: i64) -> Self {
        Self {
            scale: None,
            floor: Some(min),
        }
    }

    pub fn apply(&self, inventory: i64) -> i64 {
        let mut value = inventory as f64;
        if let Some(factor) = self.scale {
            value *= factor;
        }
        if let Some(min) = self.floor {
            value = value.max(min as f64);
        }
        if !value.is_finite() {
            return inventory;
        }
        value.trunc() as i64
    }
}

/// Product id -> override rule.
pub type OverrideTable = BTreeMap<String, InventoryOverride>;

/// The override table used for demo runs (`report --demo`).
///
/// Two products get their stock cut to 30% (forcing stockout signals) and one
/// is inflated to at least 100k units (forcing a dead-inventory signal).
pub fn demo_overrides() -> OverrideTable {
    let mut table = OverrideTable::new();
    table.insert("10_13".to_string(), InventoryOverride::scale(0.3));
    table.insert("10_15".to_string(), InventoryOverride::scale(0.3));
    table.insert(
        "10_25".to_string(),
        InventoryOverride {
            scale: Some(20.0),
            floor: Some(100_000),
        },
    );
    table
}

/// Forecasting method for the `forecast` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ForecastMethod {
    /// ARIMA(p, d, q) with a moving-average fallback per product.
    Arima,
    /// Trailing-window average times the 7-day horizon.
    MovingAverage,
}

/// ARIMA orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 1, d: 0, q: 1 }
    }
}

impl std::fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Forecast settings, derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub method: ForecastMethod,
    /// Trailing window for the moving-average method.
    pub window: usize,
    pub order: ArimaOrder,
    /// Only the first `max_products` products are fitted parametrically.
    pub max_products: usize,
    /// Worker threads for model fitting (`0` = rayon default).
    pub jobs: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            method: ForecastMethod::Arima,
            window: 7,
            order: ArimaOrder::default(),
            max_products: 50,
            jobs: 0,
        }
    }
}

/// Report settings, derived from CLI flags (plus defaults).
#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    pub data_dir: PathBuf,
    pub output: PathBuf,
    pub overrides: OverrideTable,
    /// Restrict (and order) the report to these product ids.
    pub selection: Option<Vec<String>>,
    /// Rows shown in the terminal summary.
    pub top_n: usize,
}

/// Data preparation settings.
#[derive(Debug, Clone)]
pub struct PrepareConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub top_products: usize,
}
