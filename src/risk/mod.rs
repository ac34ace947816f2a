//! Risk and trend classification.
//!
//! - `classifier`: stockout / dead-inventory scores and their resolution
//! - `trend`: Rising / Falling / Stable / Flat labels

pub mod classifier;
pub mod trend;

pub use classifier::*;
pub use trend::*;
