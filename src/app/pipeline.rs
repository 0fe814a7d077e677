//! Shared "process pipeline" logic used by the `process` and `verify` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! parse exports -> verify each -> merge -> verify merged -> aggregate -> preset
//!
//! Nothing is written to disk here; the caller decides what to emit once the
//! whole pipeline has succeeded.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::aggregate::aggregate;
use crate::basket::Basket;
use crate::catalog::CategoryCatalog;
use crate::coverage::{self, VerifiedObservations};
use crate::domain::{CategoryResult, ProcessConfig};
use crate::error::{AppError, EXIT_DATA, EXIT_INPUT};
use crate::io::vdb::{ParsedExport, load_export, merge_observations};
use crate::preset::{DEFAULT_TOLERANCE, DEFAULT_TOTAL_SPEND, PresetEntry, make_profile_preset};

/// Ingest counters for one input file that passed its own coverage check.
#[derive(Debug, Clone)]
pub struct VerifiedInput {
    pub path: PathBuf,
    pub records_read: usize,
    pub observations: usize,
    pub skipped_non_monthly: usize,
    pub skipped_unclassified: usize,
}

/// All computed outputs of a single `inflacka process` run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub basket_items: usize,
    pub inputs: Vec<VerifiedInput>,
    pub verified: VerifiedObservations,
    pub results: Vec<CategoryResult>,
    pub preset: Option<Vec<PresetEntry>>,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_process(config: &ProcessConfig) -> Result<ProcessOutput, AppError> {
    let catalog = CategoryCatalog::builtin()?;
    let basket = Basket::load_from_path(&config.basket_csv)?;

    let (verified, inputs) = load_verified(&config.inputs, &catalog)?;
    let results = aggregate(&verified, &basket)?;

    let preset = match config.profile_file {
        Some(_) => Some(make_profile_preset(
            &catalog,
            &basket,
            DEFAULT_TOTAL_SPEND,
            DEFAULT_TOLERANCE,
        )?),
        None => None,
    };

    Ok(ProcessOutput {
        basket_items: basket.len(),
        inputs,
        verified,
        results,
        preset,
    })
}

/// Parse every export, check each one against the catalog, then merge and
/// check the union.
///
/// Files are parsed in parallel; the merge is order-independent.
pub fn load_verified(
    paths: &[PathBuf],
    catalog: &CategoryCatalog,
) -> Result<(VerifiedObservations, Vec<VerifiedInput>), AppError> {
    if paths.is_empty() {
        return Err(AppError::new(EXIT_INPUT, "No input files given."));
    }

    let exports: Vec<ParsedExport> = paths
        .par_iter()
        .map(|path| load_export(path))
        .collect::<Result<_, _>>()?;

    let mut inputs = Vec::with_capacity(exports.len());
    for (path, export) in paths.iter().zip(&exports) {
        verify_one(path, export, catalog)?;
        inputs.push(VerifiedInput {
            path: path.clone(),
            records_read: export.records_read,
            observations: export.observations.len(),
            skipped_non_monthly: export.skipped_non_monthly,
            skipped_unclassified: export.skipped_unclassified,
        });
    }

    let merged = merge_observations(exports.into_iter().map(|e| e.observations));
    let verified = coverage::verify(merged, catalog)?;
    Ok((verified, inputs))
}

fn verify_one(path: &Path, export: &ParsedExport, catalog: &CategoryCatalog) -> Result<(), AppError> {
    let codes = export.observations.iter().map(|o| o.code.clone()).collect();
    coverage::verify_coverage(&codes, catalog)
        .map(|_| ())
        .map_err(|e| AppError::new(EXIT_DATA, format!("{}: {e}", path.display())))
}
