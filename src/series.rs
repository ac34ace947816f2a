//! Per-product sales series and trailing windows.

use std::collections::HashMap;

use crate::domain::{DailyObservation, SalesPoint};
use crate::error::AppError;

/// Trailing window lengths used by the analytics.
pub const WINDOW_7: usize = 7;
pub const WINDOW_14: usize = 14;
pub const WINDOW_28: usize = 28;
pub const WINDOW_30: usize = 30;

/// Chronologically ordered sales for one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSeries {
    product_id: String,
    points: Vec<SalesPoint>,
}

impl ProductSeries {
    /// Build a series from unordered points. Sorting is stable, so duplicate
    /// dates keep their input order.
    pub fn new(product_id: impl Into<String>, mut points: Vec<SalesPoint>) -> Result<Self, AppError> {
        let product_id = product_id.into();
        if points.is_empty() {
            return Err(AppError::malformed_series(&product_id));
        }
        points.sort_by_key(|p| p.date);
        Ok(Self { product_id, points })
    }

    /// A product with no observations at all. Flows into the zero-demand path.
    pub fn empty(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            points: Vec::new(),
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub fn points(&self) -> &[SalesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Trailing `n` points (the whole series if it is shorter).
    pub fn window(&self, n: usize) -> &[SalesPoint] {
        window(&self.points, n)
    }

    /// Sales values of the trailing `n` points.
    pub fn window_sales(&self, n: usize) -> Vec<f64> {
        self.window(n).iter().map(|p| p.sales).collect()
    }
}

/// Trailing `n` elements of a slice, without padding.
pub fn window<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

/// Group observations by product in first-encounter order and sort each group
/// by date.
pub fn group_by_product<I>(observations: I) -> Result<Vec<ProductSeries>, AppError>
where
    I: IntoIterator<Item = DailyObservation>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<SalesPoint>)> = Vec::new();

    for obs in observations {
        let point = SalesPoint {
            date: obs.date,
            sales: obs.sales,
        };
        match index.get(&obs.product_id) {
            Some(&idx) => groups[idx].1.push(point),
            None => {
                index.insert(obs.product_id.clone(), groups.len());
                groups.push((obs.product_id, vec![point]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(product_id, points)| ProductSeries::new(product_id, points))
        .collect()
}
