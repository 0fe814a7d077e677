//! Consumer basket weights.
//!
//! The basket is a flat table of ECOICOP codes with their share of total
//! household spend. Its source CSV looks like:
//!
//! ```text
//! ECOICOP,NAZEV,MĚRNÁ JEDNOTKA,,VÁHA v ‰
//! E00,ÚHRN, , ,1000.000000
//! E01,POTRAVINY A NEALKOHOLICKÉ NÁPOJE, , ,177.431636
//! E01.1,Potraviny, , ,160.863507
//! ```
//!
//! Codes are normalized (`E01.1` → `011`) so they match the price export, and
//! per-mille weights are stored as fractions.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use crate::domain::{BasketItem, ClassificationCode};
use crate::error::{AppError, DataError, EXIT_INPUT};

const PER_MILLE: f64 = 1000.0;

#[derive(Debug, Clone, Default)]
pub struct Basket {
    items: Vec<BasketItem>,
    by_code: HashMap<ClassificationCode, f64>,
}

impl Basket {
    pub fn new(items: Vec<BasketItem>) -> Self {
        let mut by_code: HashMap<ClassificationCode, f64> = HashMap::new();
        for item in &items {
            *by_code.entry(item.code.clone()).or_default() += item.weight_fraction;
        }
        Self { items, by_code }
    }

    /// Load the basket CSV. The header line is skipped.
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            AppError::new(
                EXIT_INPUT,
                format!("Failed to open basket CSV '{}': {e}", path.display()),
            )
        })?;
        let basket = Self::from_reader(file)
            .map_err(|e| AppError::new(EXIT_INPUT, format!("{}: {e}", path.display())))?;
        info!("loaded {} basket items from {}", basket.len(), path.display());
        Ok(basket)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut items = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // +2: 1-based lines, plus the header.
            let line = idx + 2;
            let record = result.map_err(|e| format!("CSV parse error on line {line}: {e}"))?;
            if record.len() < 5 {
                return Err(format!(
                    "Line {line}: expected 5 columns (code, name, unit, -, weight), got {}.",
                    record.len()
                ));
            }
            let raw_weight = &record[4];
            let weight = raw_weight
                .parse::<f64>()
                .ok()
                .filter(|w| w.is_finite())
                .ok_or_else(|| format!("Line {line}: invalid weight '{raw_weight}'."))?;

            items.push(BasketItem {
                code: ClassificationCode::normalized(&record[0]),
                label: record[1].to_string(),
                unit: record[2].to_string(),
                weight_fraction: weight / PER_MILLE,
            });
        }
        debug!("parsed {} basket rows", items.len());
        Ok(Self::new(items))
    }

    pub fn items(&self) -> &[BasketItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Weight recorded for exactly this code, if any.
    pub fn get(&self, code: &ClassificationCode) -> Option<f64> {
        self.by_code.get(code).copied()
    }

    /// Total weight of a set of mutually incomparable codes.
    ///
    /// Codes missing from the basket contribute nothing.
    pub fn weight_of(&self, codes: &[ClassificationCode]) -> Result<f64, DataError> {
        check_incomparable(codes)?;
        let unique: BTreeSet<&ClassificationCode> = codes.iter().collect();
        Ok(unique.into_iter().filter_map(|code| self.get(code)).sum())
    }
}

/// Fail if any code in `codes` is an ancestor of another one.
pub fn check_incomparable(codes: &[ClassificationCode]) -> Result<(), DataError> {
    for ancestor in codes {
        if let Some(descendant) = codes.iter().find(|c| ancestor.is_ancestor_of(c)) {
            return Err(DataError::ParentChildOverlap {
                ancestor: ancestor.clone(),
                descendant: descendant.clone(),
            });
        }
    }
    Ok(())
}
