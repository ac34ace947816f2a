//! Report assembly: per-product statistics, overrides, and the final document.
//!
//! `compute_report` is a pure function of one product's series and lookups, so
//! `assemble_report` can map it across products in parallel.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::info;

use crate::domain::{
    CatalogRecord, DemandTrend, ForecastRecord, FORECAST_HORIZON_DAYS, InventoryRecord, ProductReport,
    ReportConfig, ReportDocument,
};
use crate::math::{mean, round_to, spike};
use crate::risk::{RiskInputs, classify, classify_trend, score_to_int};
use crate::series::{ProductSeries, WINDOW_7, WINDOW_14, WINDOW_28, WINDOW_30};

pub mod format;

pub use format::*;

/// Window statistics for one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub avg7: f64,
    pub avg14: f64,
    /// Most recent observation (0 for an empty series).
    pub last_value: f64,
    pub total_30: f64,
    pub demand_spike: bool,
}

impl WindowStats {
    pub fn from_series(series: &ProductSeries) -> Self {
        // 7- and 14-day windows are taken from the trailing 28 observations.
        let recent = series.window(WINDOW_28);
        let last7: Vec<f64> = crate::series::window(recent, WINDOW_7).iter().map(|p| p.sales).collect();
        let last14: Vec<f64> = crate::series::window(recent, WINDOW_14).iter().map(|p| p.sales).collect();
        let total_30: f64 = series.window_sales(WINDOW_30).iter().sum();

        let last_value = last7.last().copied().unwrap_or(0.0);
        Self {
            avg7: mean(&last7),
            avg14: mean(&last14),
            last_value,
            total_30,
            demand_spike: spike(&last14, last_value),
        }
    }
}

/// Inventory, forecast and catalog lookups by product id.
///
/// Later records win when an id repeats.
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub inventory: HashMap<String, i64>,
    pub forecasts: HashMap<String, f64>,
    pub catalog: HashMap<String, String>,
}

impl Lookups {
    pub fn new(inventory: &[InventoryRecord], forecasts: &[ForecastRecord], catalog: &[CatalogRecord]) -> Self {
        Self {
            inventory: inventory
                .iter()
                .map(|r| (r.product_id.clone(), r.inventory))
                .collect(),
            forecasts: forecasts
                .iter()
                .map(|r| (r.product_id.clone(), r.forecast_next_7))
                .collect(),
            catalog: catalog
                .iter()
                .map(|r| {
                    let name = if r.product_name.trim().is_empty() {
                        r.product_id.clone()
                    } else {
                        r.product_name.clone()
                    };
                    (r.product_id.clone(), name)
                })
                .collect(),
        }
    }
}

/// Build the report row for one product.
///
/// `inventory` is the raw snapshot value; the configured override (if any) is
/// applied before any inventory-dependent metric. A missing `forecast_hint`
/// becomes `avg7 * 7`; a missing `catalog_name` becomes the product id.
pub fn compute_report(
    series: &ProductSeries,
    inventory: i64,
    forecast_hint: Option<f64>,
    catalog_name: Option<&str>,
    config: &ReportConfig,
) -> ProductReport {
    let product_id = series.product_id();
    let stats = WindowStats::from_series(series);

    let inventory = config
        .overrides
        .get(product_id)
        .map_or(inventory, |rule| rule.apply(inventory));

    let risk = classify(&RiskInputs {
        avg7: stats.avg7,
        avg14: stats.avg14,
        inventory,
        total_30: stats.total_30,
        demand_spike: stats.demand_spike,
    });
    let demand_trend: DemandTrend = classify_trend(stats.avg7, stats.avg14);
    let forecast_next_7 = forecast_hint.unwrap_or(stats.avg7 * FORECAST_HORIZON_DAYS as f64);

    ProductReport {
        product_id: product_id.to_string(),
        product_name: catalog_name.unwrap_or(product_id).to_string(),
        inventory,
        avg7: round_to(stats.avg7, 2),
        avg14: round_to(stats.avg14, 2),
        forecast_next_7: round_to(forecast_next_7, 2),
        days_of_cover: risk.days_of_cover.map(|d| round_to(d, 2)),
        days_of_cover_label: risk.days_of_cover_label,
        sell_through_30d: round_to(risk.sell_through_30d, 4),
        demand_trend,
        demand_spike: stats.demand_spike,
        stockout_score: score_to_int(risk.stockout_score),
        dead_inventory_score: score_to_int(risk.dead_score),
        risk_type: risk.risk_type,
        risk_score: risk.risk_score,
        risk_reason: risk.risk_reason.to_string(),
        explanation: risk.explanation,
        trend: series.window(WINDOW_30).to_vec(),
    }
}

/// Restrict and reorder series to `selection`.
///
/// Selected ids without sales get an empty series (zero demand). Duplicate ids
/// are reported once.
pub fn select_series(series: Vec<ProductSeries>, selection: Option<&[String]>) -> Vec<ProductSeries> {
    let Some(ids) = selection else {
        return series;
    };

    let mut by_id: HashMap<String, ProductSeries> = series
        .into_iter()
        .map(|s| (s.product_id().to_string(), s))
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        match by_id.remove(id) {
            Some(s) => out.push(s),
            None => {
                info!(product_id = %id, "selected product has no sales history");
                out.push(ProductSeries::empty(id.clone()));
            }
        }
    }
    out
}

/// Compute every product's report row, preserving series order.
pub fn assemble_report(series: &[ProductSeries], lookups: &Lookups, config: &ReportConfig) -> ReportDocument {
    let products: Vec<ProductReport> = series
        .par_iter()
        .map(|s| {
            let id = s.product_id();
            compute_report(
                s,
                lookups.inventory.get(id).copied().unwrap_or(0),
                lookups.forecasts.get(id).copied(),
                lookups.catalog.get(id).map(String::as_str),
                config,
            )
        })
        .collect();

    ReportDocument { products }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InventoryOverride, RiskType, SalesPoint};
    use chrono::{Duration, NaiveDate};

    fn series(id: &str, values: &[f64]) -> ProductSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &sales)| SalesPoint {
                date: start + Duration::days(i as i64),
                sales,
            })
            .collect();
        ProductSeries::new(id, points).unwrap()
    }

    #[test]
    fn window_stats_use_trailing_windows() {
        let values: Vec<f64> = (1..=40).map(|v| v as f64).collect();
        let stats = WindowStats::from_series(&series("P", &values));
        // last 7: 34..=40, last 14: 27..=40, last 30: 11..=40
        assert!((stats.avg7 - 37.0).abs() < 1e-12);
        assert!((stats.avg14 - 33.5).abs() < 1e-12);
        assert!((stats.total_30 - (11..=40).sum::<i32>() as f64).abs() < 1e-12);
        assert_eq!(stats.last_value, 40.0);
    }

    #[test]
    fn flat_history_has_no_spike() {
        let stats = WindowStats::from_series(&series("P", &[10.0; 14]));
        assert!(!stats.demand_spike);
    }

    #[test]
    fn zero_sales_report() {
        let s = series("Z", &[0.0; 30]);
        let report = compute_report(&s, 25, None, None, &ReportConfig::default());

        assert_eq!(report.product_name, "Z");
        assert_eq!(report.days_of_cover, None);
        assert_eq!(report.days_of_cover_label, "Infinity");
        assert_eq!(report.dead_inventory_score, 95);
        assert_eq!(report.risk_type, RiskType::HighDeadInventory);
        assert_eq!(report.risk_reason, "Zero demand");
        assert_eq!(report.demand_trend, DemandTrend::Flat);
        assert_eq!(report.forecast_next_7, 0.0);
        assert_eq!(report.trend.len(), 30);
    }

    #[test]
    fn empty_series_flows_into_dead_inventory() {
        let report = compute_report(&ProductSeries::empty("E"), 10, None, Some("Empty"), &ReportConfig::default());
        assert_eq!(report.risk_type, RiskType::HighDeadInventory);
        assert_eq!(report.risk_score, 95);
        assert!(report.trend.is_empty());
    }

    #[test]
    fn override_is_applied_before_scoring() {
        // 10/day with 100 units is 10 days of cover (no stockout risk);
        // scaled to 30 units it is 3 days (score 55).
        let s = series("10_13", &[10.0; 30]);
        let mut config = ReportConfig::default();
        let plain = compute_report(&s, 100, Some(70.0), Some("Item"), &config);
        assert_eq!(plain.risk_type, RiskType::NoRisk);

        config
            .overrides
            .insert("10_13".to_string(), InventoryOverride::scale(0.3));
        let scaled = compute_report(&s, 100, Some(70.0), Some("Item"), &config);
        assert_eq!(scaled.inventory, 30);
        assert_eq!(scaled.days_of_cover, Some(3.0));
        assert_eq!(scaled.days_of_cover_label, "3.00");
        assert_eq!(scaled.stockout_score, 55);
        assert_eq!(scaled.risk_type, RiskType::MediumStockout);
    }

    #[test]
    fn missing_forecast_defaults_to_seven_day_average() {
        let s = series("P", &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let report = compute_report(&s, 1000, None, None, &ReportConfig::default());
        // avg7 = mean(2..=8) = 5
        assert_eq!(report.forecast_next_7, 35.0);
        let hinted = compute_report(&s, 1000, Some(12.346), None, &ReportConfig::default());
        assert_eq!(hinted.forecast_next_7, 12.35);
    }

    #[test]
    fn numbers_are_rounded() {
        let s = series("P", &[1.0, 1.0, 2.0]);
        let report = compute_report(&s, 7, None, None, &ReportConfig::default());
        assert_eq!(report.avg7, 1.33);
        assert_eq!(report.days_of_cover, Some(5.25));
        assert_eq!(report.sell_through_30d, 0.5714);
    }

    #[test]
    fn explanation_cites_the_reported_cover_label() {
        // 3 units over 8/7 per day sits on a rounding half-way point (2.625).
        let s = series("P", &[2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let report = compute_report(&s, 3, None, None, &ReportConfig::default());

        assert_eq!(report.risk_type, RiskType::MediumStockout);
        let cited = format!("coverage is {} days", report.days_of_cover_label);
        assert!(report.explanation.contains(&cited), "{}", report.explanation);
        assert_eq!(
            report.days_of_cover_label,
            format!("{:.2}", report.days_of_cover.unwrap())
        );
    }

    #[test]
    fn selection_orders_and_fills_missing_products() {
        let all = vec![series("A", &[1.0]), series("B", &[2.0])];
        let ids = vec!["B".to_string(), "X".to_string(), "B".to_string()];
        let selected = select_series(all, Some(&ids));

        let got: Vec<&str> = selected.iter().map(|s| s.product_id()).collect();
        assert_eq!(got, vec!["B", "X"]);
        assert!(selected[1].is_empty());
    }

    #[test]
    fn assemble_uses_lookups_and_keeps_order() {
        let all = vec![series("B", &[5.0; 10]), series("A", &[0.0; 10])];
        let lookups = Lookups::new(
            &[InventoryRecord {
                product_id: "B".to_string(),
                inventory: 0,
            }],
            &[ForecastRecord {
                product_id: "A".to_string(),
                forecast_next_7: 3.0,
            }],
            &[CatalogRecord {
                product_id: "B".to_string(),
                product_name: "".to_string(),
            }],
        );

        let doc = assemble_report(&all, &lookups, &ReportConfig::default());
        assert_eq!(doc.products.len(), 2);
        assert_eq!(doc.products[0].product_id, "B");
        assert_eq!(doc.products[0].product_name, "B");
        assert_eq!(doc.products[0].risk_type, RiskType::HighStockout);
        assert_eq!(doc.products[0].stockout_score, 100);
        assert_eq!(doc.products[1].inventory, 0);
        assert_eq!(doc.products[1].forecast_next_7, 3.0);
    }
}
