//! Primary/fallback forecast chain and the per-product batch runner.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{ForecastConfig, ForecastMethod, ForecastRecord};
use crate::error::AppError;
use crate::forecast::{ArimaStrategy, ForecastStrategy, ModelFitError, MovingAverageStrategy};
use crate::series::{ProductSeries, WINDOW_7};

/// Outcome of one forecast attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastAttempt {
    /// The primary strategy produced the value.
    Fitted { value: f64 },
    /// The primary strategy failed; `value` comes from the 7-day moving average.
    FellBack { value: f64, reason: ModelFitError },
}

impl ForecastAttempt {
    pub fn value(&self) -> f64 {
        match self {
            ForecastAttempt::Fitted { value } | ForecastAttempt::FellBack { value, .. } => *value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ForecastAttempt::FellBack { .. })
    }
}

/// Two-stage strategy chain: a primary strategy, then `MovingAverageStrategy(7)`.
pub struct StrategyChain {
    primary: Box<dyn ForecastStrategy>,
    fallback: MovingAverageStrategy,
}

impl StrategyChain {
    pub fn new(primary: Box<dyn ForecastStrategy>) -> Self {
        Self {
            primary,
            fallback: MovingAverageStrategy::new(WINDOW_7),
        }
    }

    /// Chain for the configured method.
    pub fn from_config(config: &ForecastConfig) -> Self {
        match config.method {
            ForecastMethod::Arima => Self::new(Box::new(ArimaStrategy::new(config.order))),
            ForecastMethod::MovingAverage => Self::new(Box::new(MovingAverageStrategy::new(config.window))),
        }
    }

    pub fn primary_name(&self) -> String {
        self.primary.name()
    }

    pub fn run(&self, series: &ProductSeries) -> ForecastAttempt {
        let primary = self
            .primary
            .forecast_next_7(series)
            .and_then(|value| {
                if value.is_finite() {
                    Ok(value)
                } else {
                    Err(ModelFitError::NonFinite("forecast"))
                }
            });

        match primary {
            Ok(value) => ForecastAttempt::Fitted { value },
            Err(reason) => {
                let value = self.fallback.estimate(series);
                warn!(
                    product_id = series.product_id(),
                    strategy = %self.primary.name(),
                    %reason,
                    fallback = value,
                    "forecast fell back to moving average"
                );
                ForecastAttempt::FellBack { value, reason }
            }
        }
    }
}

/// Forecast one product with the configured method.
pub fn forecast(series: &ProductSeries, config: &ForecastConfig) -> ForecastAttempt {
    StrategyChain::from_config(config).run(series)
}

/// Forecast many products.
///
/// Products are taken in input order. With the ARIMA method only the first
/// `max_products` are fitted; the rest get no record (the report substitutes
/// `avg7 * 7`). Fits run on a pool of `config.jobs` threads and the output
/// order equals the input order.
pub fn forecast_batch(series: &[ProductSeries], config: &ForecastConfig) -> Result<Vec<ForecastRecord>, AppError> {
    let chain = StrategyChain::from_config(config);
    let selected = match config.method {
        ForecastMethod::Arima => &series[..series.len().min(config.max_products)],
        ForecastMethod::MovingAverage => series,
    };
    if selected.len() < series.len() {
        info!(
            fitted = selected.len(),
            skipped = series.len() - selected.len(),
            "max-products cap reached"
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| AppError::new(2, format!("Failed to start forecast workers: {e}")))?;

    let attempts: Vec<ForecastAttempt> = pool.install(|| selected.par_iter().map(|s| chain.run(s)).collect());

    let fallbacks = attempts.iter().filter(|a| a.is_fallback()).count();
    info!(
        strategy = %chain.primary_name(),
        products = attempts.len(),
        fallbacks,
        "forecasts computed"
    );

    Ok(selected
        .iter()
        .zip(attempts)
        .map(|(s, attempt)| {
            debug!(product_id = s.product_id(), value = attempt.value(), "forecast");
            ForecastRecord {
                product_id: s.product_id().to_string(),
                forecast_next_7: attempt.value(),
            }
        })
        .collect())
}
