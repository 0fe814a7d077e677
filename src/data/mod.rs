//! Remote data sources.

pub mod czso;

pub use czso::{CzsoClient, DEFAULT_DATASET_VERSION};
