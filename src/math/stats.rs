//! Descriptive statistics over sales windows.

/// z-score at or above which the latest day counts as a demand spike.
pub const SPIKE_Z_THRESHOLD: f64 = 2.0;

/// Arithmetic mean; `0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; `0` for fewer than two values.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// z-score of `last_value` against the 14-day window (`0` when the window has
/// no spread).
pub fn spike_z(last14: &[f64], last_value: f64) -> f64 {
    let sd = population_std(last14);
    if sd == 0.0 {
        return 0.0;
    }
    (last_value - mean(last14)) / sd
}

/// Whether the most recent day is a demand spike relative to the 14-day window.
pub fn spike(last14: &[f64], last_value: f64) -> bool {
    spike_z(last14, last_value) >= SPIKE_Z_THRESHOLD
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
