//! Core domain types and logic.
//!
//! The metric engines are pure functions over immutable values. Price table
//! assembly reaches data only through [`crate::ports::price_port`].

pub mod series_table;
pub mod returns;
pub mod correlation;
pub mod asset_metrics;
pub mod allocation;
pub mod portfolio_metrics;
pub mod universe;
pub mod analysis;
pub mod config_validation;
pub mod error;
