//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input records (`DailyObservation`, `InventoryRecord`, `ForecastRecord`, `CatalogRecord`)
//! - classifier outputs (`RiskAssessment`, `RiskType`, `DemandTrend`)
//! - the report document (`ProductReport`, `ReportDocument`)
//! - run configuration (`ReportConfig`, `ForecastConfig`, `PrepareConfig`, overrides)

pub mod types;

pub use types::*;
