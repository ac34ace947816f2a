//! Trailing-average forecast.

use crate::domain::FORECAST_HORIZON_DAYS;
use crate::forecast::{ForecastStrategy, ModelFitError};
use crate::math::mean;
use crate::series::ProductSeries;

/// `mean(trailing window) * 7`.
///
/// The multiplier is the forecast horizon, not the window length: a 14-day
/// window still yields a 7-day total. Downstream consumers rely on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverageStrategy {
    window: usize,
}

impl MovingAverageStrategy {
    pub fn new(window: usize) -> Self {
        Self { window: window.max(1) }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Infallible form of the strategy. An empty series forecasts 0.
    pub fn estimate(&self, series: &ProductSeries) -> f64 {
        mean(&series.window_sales(self.window)) * FORECAST_HORIZON_DAYS as f64
    }
}

impl ForecastStrategy for MovingAverageStrategy {
    fn name(&self) -> String {
        format!("moving average (window={})", self.window)
    }

    fn forecast_next_7(&self, series: &ProductSeries) -> Result<f64, ModelFitError> {
        Ok(self.estimate(series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalesPoint;
    use chrono::{Duration, NaiveDate};

    fn series(values: &[f64]) -> ProductSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &sales)| SalesPoint {
                date: start + Duration::days(i as i64),
                sales,
            })
            .collect();
        ProductSeries::new("P", points).unwrap()
    }

    #[test]
    fn constant_series_forecasts_seven_times_value() {
        let s = series(&[4.5; 20]);
        assert_eq!(MovingAverageStrategy::new(7).estimate(&s), 4.5 * 7.0);
    }

    #[test]
    fn horizon_stays_seven_for_longer_windows() {
        let s = series(&[1.0, 1.0, 3.0, 3.0]);
        // mean of last 4 = 2, times 7 (not 4).
        assert!((MovingAverageStrategy::new(4).estimate(&s) - 14.0).abs() < 1e-12);
        // mean of last 2 = 3.
        assert!((MovingAverageStrategy::new(2).estimate(&s) - 21.0).abs() < 1e-12);
    }

    #[test]
    fn short_and_empty_series() {
        let s = series(&[2.0, 4.0]);
        assert!((MovingAverageStrategy::new(7).estimate(&s) - 21.0).abs() < 1e-12);
        assert_eq!(MovingAverageStrategy::new(7).estimate(&ProductSeries::empty("E")), 0.0);
    }
}
