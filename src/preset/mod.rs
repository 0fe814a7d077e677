//! Default spending profile derived from the basket.
//!
//! Each category gets `basket share × total spend`, rounded to the nearest 10.
//! Rounding must not move the sum away from the total by more than a fixed
//! tolerance.

use serde::{Deserialize, Serialize};

use crate::basket::Basket;
use crate::catalog::CategoryCatalog;
use crate::error::DataError;

/// Monthly spend the preset is scaled to. Only the proportions matter.
pub const DEFAULT_TOTAL_SPEND: f64 = 50_000.0;
/// Largest accepted absolute difference between the rounded sum and the total.
pub const DEFAULT_TOLERANCE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetEntry {
    pub category_id: String,
    pub amount: i64,
}

pub fn make_profile_preset(
    catalog: &CategoryCatalog,
    basket: &Basket,
    total_spend: f64,
    tolerance: f64,
) -> Result<Vec<PresetEntry>, DataError> {
    let mut entries = Vec::with_capacity(catalog.len());
    for category in catalog {
        let share = basket.weight_of(&category.code_prefixes)?;
        entries.push(PresetEntry {
            category_id: category.id.clone(),
            amount: round_to_ten(share * total_spend),
        });
    }

    let actual: f64 = entries.iter().map(|e| e.amount as f64).sum();
    if (actual - total_spend).abs() >= tolerance {
        return Err(DataError::PresetDrift {
            expected: total_spend,
            actual,
            tolerance,
        });
    }
    Ok(entries)
}

/// Nearest multiple of 10; exact ties go to the even multiple.
fn round_to_ten(value: f64) -> i64 {
    ((value / 10.0).round_ties_even() * 10.0) as i64
}
