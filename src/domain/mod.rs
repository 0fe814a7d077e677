//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - classification codes and their prefix-based hierarchy (`ClassificationCode`)
//! - calendar months and reporting intervals (`MonthPeriod`, `ReportingInterval`)
//! - observations, categories, basket rows and aggregated results
//! - the resolved run configuration (`ProcessConfig`)

pub mod types;

pub use types::*;
