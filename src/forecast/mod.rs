//! 7-day demand forecasting.
//!
//! Responsibilities:
//!
//! - moving-average strategy (`moving_average`)
//! - ARIMA(p, d, q) strategy on a continuous daily calendar (`arima`)
//! - the primary/fallback chain and the batch runner (`provider`)

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::ArimaOrder;
use crate::series::ProductSeries;

pub mod arima;
pub mod moving_average;
pub mod provider;

pub use arima::ArimaStrategy;
pub use moving_average::MovingAverageStrategy;
pub use provider::*;

/// Why a strategy could not produce a forecast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelFitError {
    #[error("{order} has too little data ({observations} daily points)")]
    InsufficientData { order: ArimaOrder, observations: usize },

    #[error("more than one observation for {0}")]
    DuplicateDate(NaiveDate),

    #[error("least squares solve failed at {0}")]
    Singular(&'static str),

    #[error("non-finite {0}")]
    NonFinite(&'static str),
}

/// A way of turning one product's history into a `forecast_next_7` value.
pub trait ForecastStrategy: Send + Sync {
    fn name(&self) -> String;

    /// Total demand expected over the next 7 days.
    fn forecast_next_7(&self, series: &ProductSeries) -> Result<f64, ModelFitError>;
}
