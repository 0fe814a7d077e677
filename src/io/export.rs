//! Output files.
//!
//! - the rates file consumed by the web front-end, either as a TypeScript
//!   module (`export const inflationMetadata = …; export const inflationRates = …;`)
//!   or as plain JSON
//! - the default-profile preset (`[{categoryId, amount}]`)

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CategoryCatalog;
use crate::domain::{CategoryResult, MonthPeriod, OutputFormat};
use crate::error::{AppError, EXIT_INPUT};
use crate::preset::PresetEntry;

/// Run metadata written next to the rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesMetadata {
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}

/// One category as the front-end sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    /// `"YYYY-MM"` → weighted index level.
    pub rates: BTreeMap<MonthPeriod, f64>,
}

/// Shape of the rates file in `--format json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatesFile {
    pub metadata: RatesMetadata,
    pub rates: Vec<RatesEntry>,
}

/// Join aggregated results with the catalog's display fields.
///
/// `results` holds one entry per category, in catalog order, as `aggregate`
/// returns them.
pub fn rates_entries(catalog: &CategoryCatalog, results: &[CategoryResult]) -> Vec<RatesEntry> {
    debug_assert_eq!(catalog.len(), results.len());
    catalog
        .iter()
        .zip(results)
        .map(|(category, result)| {
            debug_assert_eq!(category.id, result.category_id);
            RatesEntry {
                id: category.id.clone(),
                name: category.name.clone(),
                description: category.description.clone(),
                rates: result.rates_by_period.clone(),
            }
        })
        .collect()
}

/// Render the rates file contents.
pub fn render_rates(format: OutputFormat, file: &RatesFile) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => to_pretty_json(file),
        OutputFormat::Ts => {
            let mut out = String::from("// This file is regenerated by `inflacka process`\n");
            out.push_str("export const inflationMetadata = ");
            out.push_str(&to_pretty_json(&file.metadata)?);
            out.push_str(";\n");
            out.push_str("export const inflationRates = ");
            out.push_str(&to_pretty_json(&file.rates)?);
            out.push_str(";\n");
            Ok(out)
        }
    }
}

/// Write the rates file.
pub fn write_rates(path: &Path, format: OutputFormat, file: &RatesFile) -> Result<(), AppError> {
    let contents = render_rates(format, file)?;
    fs::write(path, contents)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write rates file '{}': {e}", path.display())))
}

/// Write the default-profile preset as pretty JSON.
pub fn write_preset_json(path: &Path, preset: &[PresetEntry]) -> Result<(), AppError> {
    let file = fs::File::create(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to create profile file '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, preset)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to write profile file: {e}")))
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to serialize rates: {e}")))
}
