//! ARIMA(p, d, q) forecasts on a continuous daily calendar.
//!
//! Estimation is the two-stage Hannan–Rissanen procedure, which only needs
//! linear least squares:
//!
//! 1. fit a long autoregression to the `d`-times differenced series and keep its
//!    residuals as estimates of the innovations
//! 2. regress each value on `p` own lags and `q` lagged innovations
//!
//! An intercept is estimated only when `d = 0`. Forecasts are produced
//! recursively with future innovations set to zero, then integrated back `d`
//! times.

use crate::domain::{ArimaOrder, FORECAST_HORIZON_DAYS};
use crate::forecast::{ForecastStrategy, ModelFitError};
use crate::math::fit_rows;
use crate::series::ProductSeries;

/// Upper bound on the stage-1 autoregression order.
const LONG_AR_ORDER: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaStrategy {
    order: ArimaOrder,
}

/// Fitted ARMA coefficients for the differenced series.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaFit {
    pub order: ArimaOrder,
    pub intercept: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Differenced series the model was fitted to.
    differenced: Vec<f64>,
    /// Innovation estimates aligned with `differenced` (zero where undefined).
    residuals: Vec<f64>,
    /// Last value of each differencing level, level 0 first.
    tails: Vec<f64>,
}

impl ArimaStrategy {
    pub fn new(order: ArimaOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }
}

impl ForecastStrategy for ArimaStrategy {
    fn name(&self) -> String {
        self.order.to_string()
    }

    fn forecast_next_7(&self, series: &ProductSeries) -> Result<f64, ModelFitError> {
        let daily = daily_calendar(series)?;
        let fit = fit_arima(&daily, self.order)?;
        let total: f64 = fit.forecast(FORECAST_HORIZON_DAYS).iter().sum();
        if !total.is_finite() {
            return Err(ModelFitError::NonFinite("forecast"));
        }
        Ok(total)
    }
}

/// Sales on every calendar day from the first to the last observation, with
/// missing days as zero.
pub fn daily_calendar(series: &ProductSeries) -> Result<Vec<f64>, ModelFitError> {
    let points = series.points();
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(Vec::new());
    };

    let days = (last.date - first.date).num_days().max(0) as usize + 1;
    let mut out = vec![0.0; days];
    let mut prev = None;
    for p in points {
        if prev == Some(p.date) {
            return Err(ModelFitError::DuplicateDate(p.date));
        }
        prev = Some(p.date);
        let idx = (p.date - first.date).num_days() as usize;
        out[idx] = p.sales;
    }
    Ok(out)
}

/// Estimate ARIMA coefficients for a daily series.
pub fn fit_arima(values: &[f64], order: ArimaOrder) -> Result<ArimaFit, ModelFitError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelFitError::NonFinite("input"));
    }

    let insufficient = || ModelFitError::InsufficientData {
        order,
        observations: values.len(),
    };

    let mut tails = Vec::with_capacity(order.d);
    let mut w = values.to_vec();
    for _ in 0..order.d {
        tails.push(*w.last().ok_or_else(insufficient)?);
        w = w.windows(2).map(|pair| pair[1] - pair[0]).collect();
    }

    let n = w.len();
    let with_intercept = order.d == 0;
    let (p, q) = (order.p, order.q);

    // Stage 1: long autoregression for innovation estimates.
    let mut innovations = vec![0.0; n];
    let mut start = p;
    if q > 0 {
        let m = (p + q).max(LONG_AR_ORDER.min(n / 4));
        let rows = lag_rows(&w, m, &[], 0, m, with_intercept);
        if rows.len() <= m + usize::from(with_intercept) {
            return Err(insufficient());
        }
        let beta = fit_rows(&rows, &w[m..]).ok_or(ModelFitError::Singular("long autoregression"))?;
        for (t, row) in (m..n).zip(&rows) {
            innovations[t] = w[t] - dot(row, &beta);
        }
        start = p.max(m + q);
    }

    // Stage 2: ARMA regression.
    let n_params = p + q + usize::from(with_intercept);
    if n <= start || n - start <= n_params {
        return Err(insufficient());
    }

    let (intercept, ar, ma, residuals) = if n_params == 0 {
        // Pure integration (e.g. ARIMA(0,1,0)): the differences are the innovations.
        (0.0, Vec::new(), Vec::new(), w.clone())
    } else {
        let rows = lag_rows(&w, p, &innovations, q, start, with_intercept);
        let beta = fit_rows(&rows, &w[start..]).ok_or(ModelFitError::Singular("ARMA regression"))?;
        if beta.iter().any(|b| !b.is_finite()) {
            return Err(ModelFitError::NonFinite("coefficients"));
        }

        let offset = usize::from(with_intercept);
        let intercept = if with_intercept { beta[0] } else { 0.0 };
        let ar = beta[offset..offset + p].to_vec();
        let ma = beta[offset + p..].to_vec();

        let mut residuals = innovations.clone();
        for (t, row) in (start..n).zip(&rows) {
            residuals[t] = w[t] - dot(row, &beta);
        }
        (intercept, ar, ma, residuals)
    };

    Ok(ArimaFit {
        order,
        intercept,
        ar,
        ma,
        differenced: w,
        residuals,
        tails,
    })
}

impl ArimaFit {
    /// Point forecasts for the next `horizon` days on the undifferenced scale.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let mut history = self.differenced.clone();
        let mut errors = self.residuals.clone();

        let mut path = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let len = history.len();
            let mut next = self.intercept;
            for (i, a) in self.ar.iter().enumerate() {
                next += a * history.get(len.wrapping_sub(i + 1)).copied().unwrap_or(0.0);
            }
            for (j, b) in self.ma.iter().enumerate() {
                next += b * errors.get(len.wrapping_sub(j + 1)).copied().unwrap_or(0.0);
            }
            history.push(next);
            errors.push(0.0);
            path.push(next);
        }

        integrate(path, &self.tails)
    }
}

/// Regression rows for `t in start..w.len()`:
/// `[1?, w[t-1], .., w[t-p], e[t-1], .., e[t-q]]`.
fn lag_rows(w: &[f64], p: usize, e: &[f64], q: usize, start: usize, with_intercept: bool) -> Vec<Vec<f64>> {
    (start..w.len())
        .map(|t| {
            let mut row = Vec::with_capacity(p + q + 1);
            if with_intercept {
                row.push(1.0);
            }
            row.extend((1..=p).map(|i| w[t - i]));
            row.extend((1..=q).map(|j| e[t - j]));
            row
        })
        .collect()
}

fn dot(row: &[f64], beta: &[f64]) -> f64 {
    row.iter().zip(beta).map(|(x, b)| x * b).sum()
}

/// Undo `tails.len()` rounds of differencing on a forecast path.
fn integrate(mut path: Vec<f64>, tails: &[f64]) -> Vec<f64> {
    for &last in tails.iter().rev() {
        let mut level = last;
        for v in path.iter_mut() {
            level += *v;
            *v = level;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SalesPoint;
    use chrono::NaiveDate;
    use rand::prelude::*;
    use rand::rngs::StdRng;
    use rand_distr::Normal;

    fn order(p: usize, d: usize, q: usize) -> ArimaOrder {
        ArimaOrder { p, d, q }
    }

    fn ar1_series(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.5).unwrap();
        let mut out = vec![5.0];
        for _ in 1..n {
            let prev = *out.last().unwrap();
            out.push(2.0 + 0.6 * prev + rng.sample(noise));
        }
        out
    }

    fn dated(values: &[(u32, f64)]) -> ProductSeries {
        let points = values
            .iter()
            .map(|&(day, sales)| SalesPoint {
                date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                sales,
            })
            .collect();
        ProductSeries::new("P", points).unwrap()
    }

    #[test]
    fn recovers_ar1_coefficient() {
        let values = ar1_series(400, 7);
        let fit = fit_arima(&values, order(1, 0, 0)).unwrap();
        assert!((fit.ar[0] - 0.6).abs() < 0.15, "ar = {:?}", fit.ar);

        let total: f64 = fit.forecast(7).iter().sum();
        assert!(total.is_finite());
        assert!(total > 20.0 && total < 50.0, "total = {total}");
    }

    #[test]
    fn arma11_on_noisy_series_is_finite() {
        let values = ar1_series(300, 11);
        let fit = fit_arima(&values, order(1, 0, 1)).unwrap();
        assert_eq!(fit.ma.len(), 1);
        let total: f64 = fit.forecast(7).iter().sum();
        assert!(total > 20.0 && total < 50.0, "total = {total}");
    }

    #[test]
    fn constant_series_forecasts_the_constant() {
        let values = vec![5.0; 60];
        let fit = fit_arima(&values, order(1, 0, 1)).unwrap();
        for v in fit.forecast(7) {
            assert!((v - 5.0).abs() < 1e-6, "v = {v}");
        }
    }

    #[test]
    fn random_walk_repeats_last_value() {
        let values: Vec<f64> = (0..50).map(|t| t as f64).collect();
        let fit = fit_arima(&values, order(0, 1, 0)).unwrap();
        let total: f64 = fit.forecast(7).iter().sum();
        assert!((total - 7.0 * 49.0).abs() < 1e-9);
    }

    #[test]
    fn differenced_trend_is_extrapolated() {
        let values: Vec<f64> = (0..50).map(|t| t as f64).collect();
        let fit = fit_arima(&values, order(1, 1, 0)).unwrap();
        let path = fit.forecast(7);
        for (h, v) in path.iter().enumerate() {
            assert!((v - (50.0 + h as f64)).abs() < 1e-6, "h={h} v={v}");
        }
    }

    #[test]
    fn too_short_series_is_rejected() {
        let err = fit_arima(&[1.0, 2.0, 3.0], order(1, 0, 1)).unwrap_err();
        assert!(matches!(err, ModelFitError::InsufficientData { observations: 3, .. }));
    }

    #[test]
    fn calendar_fills_missing_days_with_zero() {
        let s = dated(&[(1, 7.0), (3, 9.0), (4, 1.0)]);
        assert_eq!(daily_calendar(&s).unwrap(), vec![7.0, 0.0, 9.0, 1.0]);
        // The shared series is untouched.
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn duplicate_dates_fail_the_fit() {
        let s = dated(&[(1, 1.0), (2, 2.0), (2, 3.0)]);
        let err = ArimaStrategy::new(order(1, 0, 0)).forecast_next_7(&s).unwrap_err();
        assert!(matches!(err, ModelFitError::DuplicateDate(_)));
    }
}
