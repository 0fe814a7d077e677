//! Reporting utilities: run summary and category mapping printouts.

pub mod format;

pub use format::*;
