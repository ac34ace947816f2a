//! `stock-radar` library crate.
//!
//! The binary (`radar`) is a thin wrapper around this library so that:
//!
//! - the analytics are testable without spawning processes
//! - the report engine can be embedded behind other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod report;
pub mod risk;
pub mod series;
