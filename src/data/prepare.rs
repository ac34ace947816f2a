//! Turn a raw `date, store, item, sales` export into the three data tables the
//! report consumes: daily sales, an inventory snapshot and the catalog.
//!
//! Inventory is not part of the raw export, so the snapshot comes from a
//! replenishment simulation run over each product's continuous daily history.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};

use crate::domain::{CatalogRecord, DailyObservation, InventoryRecord, RawSale};
use crate::math::mean;

/// Minimum starting stock of the simulation.
const MIN_START_INVENTORY: i64 = 50;
/// Starting stock in days of average demand.
const START_COVER_DAYS: f64 = 21.0;
/// Reorder point in days of average demand.
const REORDER_COVER_DAYS: f64 = 7.0;
/// Replenishment size in days of average demand.
const REPLENISH_DAYS: f64 = 14.0;

/// Output of `prepare`, each table sorted by product id (sales then by date).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedTables {
    pub sales: Vec<DailyObservation>,
    pub inventory: Vec<InventoryRecord>,
    pub catalog: Vec<CatalogRecord>,
}

/// Daily sales totals per product: `product_id -> date -> sales`.
pub type DailyTotals = BTreeMap<String, BTreeMap<NaiveDate, f64>>;

/// Sum raw rows into one value per `(product, date)`.
pub fn aggregate_daily(rows: &[RawSale]) -> DailyTotals {
    let mut out = DailyTotals::new();
    for row in rows {
        *out.entry(row.product_id())
            .or_default()
            .entry(row.date)
            .or_insert(0.0) += row.sales;
    }
    out
}

/// The `n` products with the largest total sales.
///
/// Ties keep product-id order.
pub fn top_products(daily: &DailyTotals, n: usize) -> Vec<String> {
    let mut totals: Vec<(&String, f64)> = daily
        .iter()
        .map(|(id, days)| (id, days.values().sum::<f64>()))
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));
    totals.into_iter().take(n).map(|(id, _)| id.clone()).collect()
}

/// Values on every calendar day from the first to the last date (missing days
/// are `0`).
pub fn fill_calendar(days: &BTreeMap<NaiveDate, f64>) -> Vec<f64> {
    let (Some(first), Some(last)) = (days.keys().next(), days.keys().next_back()) else {
        return Vec::new();
    };
    let span = (*last - *first).num_days();
    (0..=span)
        .map(|offset| days.get(&(*first + Duration::days(offset))).copied().unwrap_or(0.0))
        .collect()
}

/// Final stock level after replaying `daily_sales` against a reorder policy.
///
/// Stock starts at `max(50, trunc(avg * 21))` with `avg = max(mean, 1)`. Each
/// day subtracts the truncated sales, tops up by `trunc(avg * 14)` when stock
/// falls below `avg * 7`, and floors at zero.
pub fn simulate_inventory(daily_sales: &[f64]) -> i64 {
    let avg = mean(daily_sales).max(1.0);
    let mut stock = ((avg * START_COVER_DAYS).trunc() as i64).max(MIN_START_INVENTORY);
    for &sales in daily_sales {
        stock -= sales.trunc() as i64;
        if (stock as f64) < avg * REORDER_COVER_DAYS {
            stock += (avg * REPLENISH_DAYS).trunc() as i64;
        }
        stock = stock.max(0);
    }
    stock
}

/// Build the three tables for the top `top_n` products of `rows`.
pub fn prepare(rows: &[RawSale], top_n: usize) -> PreparedTables {
    let mut daily = aggregate_daily(rows);
    let keep = top_products(&daily, top_n);
    daily.retain(|id, _| keep.contains(id));

    let mut first_seen: HashMap<String, (i64, i64)> = HashMap::new();
    for row in rows {
        first_seen
            .entry(row.product_id())
            .or_insert((row.store, row.item));
    }

    let mut out = PreparedTables::default();
    for (product_id, days) in &daily {
        out.sales.extend(days.iter().map(|(date, sales)| DailyObservation {
            product_id: product_id.clone(),
            date: *date,
            sales: *sales,
        }));

        out.inventory.push(InventoryRecord {
            product_id: product_id.clone(),
            inventory: simulate_inventory(&fill_calendar(days)),
        });

        if let Some((store, item)) = first_seen.get(product_id) {
            out.catalog.push(CatalogRecord {
                product_id: product_id.clone(),
                product_name: format!("Store {store} Item {item}"),
            });
        }
    }
    out
}
