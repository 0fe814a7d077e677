//! Per-category, per-month weighted averages.
//!
//! For each category (catalog order) and each month with data:
//!
//! `value = Σ wᵢ·vᵢ / Σ wᵢ`
//!
//! where `vᵢ` are the index values of the category's observations that month
//! and `wᵢ` their basket weights. Observations are selected by *exact* code
//! match against the category's prefixes; tree-level reasoning is the job of
//! `coverage`, which must have accepted the observation set first.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::basket::Basket;
use crate::coverage::VerifiedObservations;
use crate::domain::{CategoryDefinition, CategoryResult, MonthPeriod, Observation};
use crate::error::DataError;

/// Aggregate every category of the catalog the observations were verified
/// against, in catalog order.
pub fn aggregate(verified: &VerifiedObservations, basket: &Basket) -> Result<Vec<CategoryResult>, DataError> {
    verified
        .catalog()
        .iter()
        .map(|category| aggregate_category(category, verified.observations(), basket))
        .collect()
}

fn aggregate_category(
    category: &CategoryDefinition,
    observations: &[Observation],
    basket: &Basket,
) -> Result<CategoryResult, DataError> {
    let mut by_period: BTreeMap<MonthPeriod, Vec<&Observation>> = BTreeMap::new();
    for obs in observations
        .iter()
        .filter(|o| category.code_prefixes.contains(&o.code))
    {
        by_period.entry(obs.period).or_default().push(obs);
    }

    if by_period.is_empty() {
        warn!("category `{}` matched no observations", category.id);
    }

    let mut rates_by_period = BTreeMap::new();
    for (period, mut group) in by_period {
        // Fixed summation order, whatever order the inputs were read in.
        group.sort_by(|a, b| a.code.cmp(&b.code).then(a.value.total_cmp(&b.value)));
        let value = weighted_mean(category, period, &group, basket)?;
        rates_by_period.insert(period, value);
    }
    debug!(
        "category `{}`: {} periods",
        category.id,
        rates_by_period.len()
    );

    Ok(CategoryResult {
        category_id: category.id.clone(),
        rates_by_period,
    })
}

fn weighted_mean(
    category: &CategoryDefinition,
    period: MonthPeriod,
    group: &[&Observation],
    basket: &Basket,
) -> Result<f64, DataError> {
    let mut weights = Vec::with_capacity(group.len());
    for obs in group {
        let weight = basket.weight_of(std::slice::from_ref(&obs.code))?;
        if !(weight > 0.0) {
            return Err(DataError::NonPositiveWeight {
                code: obs.code.clone(),
                weight,
            });
        }
        weights.push(weight);
    }

    let total: f64 = weights.iter().sum();
    if !(total > 0.0) {
        return Err(DataError::ZeroTotalWeight {
            category: category.id.clone(),
            period,
            total,
        });
    }

    Ok(group
        .iter()
        .zip(&weights)
        .map(|(obs, w)| obs.value * (w / total))
        .sum())
}
