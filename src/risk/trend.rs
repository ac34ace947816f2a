use crate::domain::DemandTrend;

const RISING_RATIO: f64 = 1.1;
const FALLING_RATIO: f64 = 0.9;

/// Label the demand trajectory from the 7- and 14-day averages.
///
/// Rules are evaluated in order; the first match wins.
pub fn classify_trend(avg7: f64, avg14: f64) -> DemandTrend {
    if avg14 > 0.0 && avg7 > avg14 * RISING_RATIO {
        DemandTrend::Rising
    } else if avg14 > 0.0 && avg7 < avg14 * FALLING_RATIO {
        DemandTrend::Falling
    } else if avg7 == 0.0 && avg14 == 0.0 {
        DemandTrend::Flat
    } else {
        DemandTrend::Stable
    }
}
