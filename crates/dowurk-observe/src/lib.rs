//! Tracing setup and span vocabulary for DowUrk.

pub mod attributes;
pub mod tracing_setup;
