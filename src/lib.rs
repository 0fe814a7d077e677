//! `inflacka` library crate.
//!
//! The binary (`inflacka`) is a thin wrapper around this library so that:
//!
//! - the verify/aggregate core is testable without spawning processes
//! - parsing, fetching and writing stay replaceable around a pure core
//!
//! Pipeline: VDB export → `coverage` (partition gate) → `aggregate` → `io::export`.

pub mod aggregate;
pub mod app;
pub mod basket;
pub mod catalog;
pub mod cli;
pub mod coverage;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod preset;
pub mod report;
