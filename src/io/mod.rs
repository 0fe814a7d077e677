//! Input/output helpers.
//!
//! - VDB XML export ingest + merge (`vdb`)
//! - rates file and profile preset writers (`export`)

pub mod export;
pub mod vdb;

pub use export::*;
pub use vdb::*;
