//! Input/output helpers.
//!
//! - CSV ingest of the input tables, selections and override tables (`ingest`)
//! - report JSON and CSV table writers (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
