//! Data preparation for the input tables.

pub mod prepare;

pub use prepare::*;
