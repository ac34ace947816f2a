//! Stockout vs. dead-inventory scoring and resolution.

use crate::domain::{RiskAssessment, RiskType};
use crate::math::round_to;

/// Score points lost per day of cover.
const COVER_PENALTY_PER_DAY: f64 = 15.0;
/// Bonus applied when a spike meets less than a week of cover.
const SPIKE_BONUS: f64 = 10.0;
const SPIKE_COVER_DAYS: f64 = 7.0;

const DEAD_ZERO_DEMAND: f64 = 95.0;
const DEAD_VERY_LOW: f64 = 75.0;
const DEAD_LOW: f64 = 50.0;
const SELL_THROUGH_VERY_LOW: f64 = 0.05;
const SELL_THROUGH_LOW: f64 = 0.10;

const STOCKOUT_MIN: f64 = 40.0;
const HIGH_SEVERITY: f64 = 75.0;
const DEAD_MIN: f64 = 50.0;

/// Per-product inputs of the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskInputs {
    pub avg7: f64,
    pub avg14: f64,
    /// Inventory after overrides.
    pub inventory: i64,
    /// Total sales over the trailing 30 observations.
    pub total_30: f64,
    pub demand_spike: bool,
}

/// `inventory / avg7`, or `None` when there is no recent demand.
pub fn days_of_cover(inventory: i64, avg7: f64) -> Option<f64> {
    if avg7 > 0.0 {
        Some(inventory as f64 / avg7)
    } else {
        None
    }
}

/// Label for a days-of-cover value ("Infinity" when absent).
///
/// The value is rounded half away from zero first, so the label always agrees
/// with the rounded `daysOfCover` in the report.
pub fn days_of_cover_label(days_of_cover: Option<f64>) -> String {
    match days_of_cover {
        Some(days) => format!("{:.2}", round_to(days, 2)),
        None => "Infinity".to_string(),
    }
}

pub fn sell_through_30d(total_30: f64, inventory: i64) -> f64 {
    total_30 / inventory.max(1) as f64
}

pub fn stockout_score(days_of_cover: Option<f64>, demand_spike: bool) -> f64 {
    let Some(days) = days_of_cover else {
        return 0.0;
    };
    let mut score = (100.0 - days * COVER_PENALTY_PER_DAY).clamp(0.0, 100.0);
    if demand_spike && days < SPIKE_COVER_DAYS {
        score = (score + SPIKE_BONUS).clamp(0.0, 100.0);
    }
    score
}

pub fn dead_score(avg7: f64, sell_through_30d: f64) -> f64 {
    if avg7 == 0.0 {
        DEAD_ZERO_DEMAND
    } else if sell_through_30d < SELL_THROUGH_VERY_LOW {
        DEAD_VERY_LOW
    } else if sell_through_30d < SELL_THROUGH_LOW {
        DEAD_LOW
    } else {
        0.0
    }
}

/// Integer form of a score in `[0, 100]`.
pub fn score_to_int(score: f64) -> u8 {
    score.round().clamp(0.0, 100.0) as u8
}

/// Score both risk families and resolve them. Stockout is checked first and
/// must strictly beat the dead score.
pub fn classify(inputs: &RiskInputs) -> RiskAssessment {
    let cover = days_of_cover(inputs.inventory, inputs.avg7);
    let cover_label = days_of_cover_label(cover);
    let sell_through = sell_through_30d(inputs.total_30, inputs.inventory);

    let stockout = stockout_score(cover, inputs.demand_spike);
    let dead = dead_score(inputs.avg7, sell_through);

    let (risk_type, risk_score, risk_reason, explanation) = if stockout > dead && stockout >= STOCKOUT_MIN {
        let kind = if stockout >= HIGH_SEVERITY {
            RiskType::HighStockout
        } else {
            RiskType::MediumStockout
        };
        let reason = if inputs.demand_spike {
            "Low inventory coverage with demand spike"
        } else {
            "Low inventory coverage"
        };
        let explanation = format!(
            "Stockout risk: coverage is {cover_label} days at avg {:.1} units/day.",
            inputs.avg7
        );
        (kind, score_to_int(stockout), reason, explanation)
    } else if dead >= DEAD_MIN {
        let kind = if dead >= HIGH_SEVERITY {
            RiskType::HighDeadInventory
        } else {
            RiskType::MediumDeadInventory
        };
        let (reason, explanation) = if inputs.avg7 == 0.0 {
            ("Zero demand", "Dead inventory risk: no recent sales observed.".to_string())
        } else {
            (
                "Low sell-through",
                format!(
                    "Dead inventory risk: 30-day sell-through is {:.1}%.",
                    sell_through * 100.0
                ),
            )
        };
        (kind, score_to_int(dead), reason, explanation)
    } else {
        (
            RiskType::NoRisk,
            0,
            "Stable inventory coverage",
            "No immediate risk detected based on recent sales and inventory.".to_string(),
        )
    };

    RiskAssessment {
        days_of_cover: cover,
        days_of_cover_label: cover_label,
        sell_through_30d: sell_through,
        stockout_score: stockout,
        dead_score: dead,
        risk_type,
        risk_score,
        risk_reason,
        explanation,
    }
}
