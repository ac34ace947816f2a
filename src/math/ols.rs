//! Ordinary least squares for small regression problems.
//!
//! The ARMA estimator regresses each day's (differenced) sales on its own lags
//! and on lagged residuals:
//!
//! ```text
//! minimize Σ (y_t - x_t^T β)^2
//! ```
//!
//! Design matrices are tall (hundreds of days) and narrow (a handful of lags),
//! and can be rank deficient when a product sells a constant amount every day.
//! SVD handles both cases: rank-deficient systems get the minimum-norm solution.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser singular-value cutoffs.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ X β` from row-major regressors.
///
/// Every row must have the same length. Returns `None` for an empty or
/// inconsistent system, or when the solve fails.
pub fn fit_rows(rows: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    let n = rows.len();
    let k = rows.first()?.len();
    if n == 0 || k == 0 || n != y.len() || rows.iter().any(|r| r.len() != k) {
        return None;
    }

    let x = DMatrix::from_fn(n, k, |i, j| rows[i][j]);
    let y = DVector::from_column_slice(y);
    solve_least_squares(&x, &y).map(|beta| beta.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_rows_recovers_lag_coefficient() {
        // y_t = 1 + 0.5 * y_{t-1}
        let mut series = vec![4.0];
        for _ in 0..20 {
            let prev = *series.last().unwrap();
            series.push(1.0 + 0.5 * prev);
        }
        let rows: Vec<Vec<f64>> = series[..series.len() - 1].iter().map(|&v| vec![1.0, v]).collect();
        let beta = fit_rows(&rows, &series[1..]).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-6);
        assert!((beta[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fit_rows_handles_rank_deficient_design() {
        // Constant series: intercept and lag columns are collinear.
        let rows = vec![vec![1.0, 5.0]; 10];
        let y = vec![5.0; 10];
        let beta = fit_rows(&rows, &y).unwrap();
        let fitted = beta[0] + beta[1] * 5.0;
        assert!((fitted - 5.0).abs() < 1e-8);
    }

    #[test]
    fn fit_rows_rejects_ragged_input() {
        assert!(fit_rows(&[vec![1.0], vec![1.0, 2.0]], &[1.0, 2.0]).is_none());
        assert!(fit_rows(&[], &[]).is_none());
    }
}
