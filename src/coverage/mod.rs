//! Partition check: does the catalog split the observed codes exactly?
//!
//! ECOICOP codes form a tree through their string prefixes, and categories may
//! claim codes at any depth. A catalog is accepted when:
//!
//! 1. every declared prefix matches at least one observed code;
//! 2. no observed code is claimed (directly or through an ancestor prefix) by
//!    two prefixes;
//! 3. every observed code is claimed directly, or all of its immediate
//!    descendants are covered in turn.
//!
//! Step 3 is an iterative fixed point over the codes, deepest first, so the
//! check never recurses.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info};

use crate::catalog::CategoryCatalog;
use crate::domain::{ClassificationCode, Observation};
use crate::error::DataError;

/// How the observed codes ended up covered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// Observed code → id of the category whose prefix claims it.
    pub assignments: BTreeMap<ClassificationCode, String>,
    /// Codes not claimed directly but fully covered by their descendants.
    pub delegated: BTreeSet<ClassificationCode>,
}

impl CoverageReport {
    pub fn code_count(&self) -> usize {
        self.assignments.len() + self.delegated.len()
    }
}

/// An observation set that passed `verify_coverage`, together with the
/// catalog it was checked against.
///
/// Only `verify` creates this, and aggregation reads the catalog from here.
#[derive(Debug, Clone)]
pub struct VerifiedObservations {
    observations: Vec<Observation>,
    catalog: CategoryCatalog,
    report: CoverageReport,
}

impl VerifiedObservations {
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn report(&self) -> &CoverageReport {
        &self.report
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }
}

/// Verify an observation set and seal it for aggregation.
pub fn verify(
    observations: Vec<Observation>,
    catalog: &CategoryCatalog,
) -> Result<VerifiedObservations, DataError> {
    let codes: BTreeSet<ClassificationCode> =
        observations.iter().map(|o| o.code.clone()).collect();
    let report = verify_coverage(&codes, catalog)?;
    info!(
        "coverage ok: {} codes ({} claimed directly, {} via descendants)",
        report.code_count(),
        report.assignments.len(),
        report.delegated.len()
    );
    Ok(VerifiedObservations {
        observations,
        catalog: catalog.clone(),
        report,
    })
}

/// Check that the catalog's prefixes partition `codes`.
pub fn verify_coverage(
    codes: &BTreeSet<ClassificationCode>,
    catalog: &CategoryCatalog,
) -> Result<CoverageReport, DataError> {
    for (category, prefix) in catalog.prefixes() {
        if !codes.iter().any(|code| prefix.covers(code)) {
            return Err(DataError::UnknownPrefix {
                category: category.id.clone(),
                prefix: prefix.clone(),
            });
        }
    }

    let mut assignments: BTreeMap<ClassificationCode, String> = BTreeMap::new();
    for (category, prefix) in catalog.prefixes() {
        for code in codes.iter().filter(|code| prefix.covers(code)) {
            if let Some(first) = assignments.get(code) {
                return Err(DataError::OverlappingCoverage {
                    code: code.clone(),
                    first: first.clone(),
                    second: category.id.clone(),
                });
            }
            assignments.insert(code.clone(), category.id.clone());
        }
    }

    let children = immediate_children(codes);

    // Deepest first: a code's children are always longer than the code itself,
    // so they are settled before the code is looked at.
    let mut order: Vec<&ClassificationCode> = codes.iter().collect();
    order.sort_by(|a, b| b.as_str().len().cmp(&a.as_str().len()).then_with(|| a.cmp(b)));

    let mut covered: HashMap<&ClassificationCode, bool> = HashMap::with_capacity(codes.len());
    let mut delegated = BTreeSet::new();
    for code in order {
        let direct = assignments.contains_key(code);
        let via_children = !direct
            && children.get(code).is_some_and(|kids| {
                !kids.is_empty() && kids.iter().all(|kid| covered.get(kid).copied().unwrap_or(false))
            });
        if via_children {
            debug!("code {code} covered through its descendants");
            delegated.insert(code.clone());
        }
        covered.insert(code, direct || via_children);
    }

    // An uncovered code always has an uncovered child, unless it is a leaf.
    // Report the leaf, since that is the code the catalog is missing.
    let uncovered_leaf = codes.iter().find(|code| {
        !covered.get(*code).copied().unwrap_or(false)
            && children.get(*code).is_none_or(|kids| kids.is_empty())
    });
    if let Some(code) = uncovered_leaf {
        return Err(DataError::UncoveredLeaf { code: code.clone() });
    }

    Ok(CoverageReport {
        assignments,
        delegated,
    })
}

/// Map each code to the observed codes directly below it.
///
/// A code's parent is its longest observed proper ancestor, so a missing
/// intermediate level (e.g. `01` → `0111` with no `011`) is skipped over.
pub fn immediate_children(
    codes: &BTreeSet<ClassificationCode>,
) -> HashMap<&ClassificationCode, Vec<&ClassificationCode>> {
    let mut children: HashMap<&ClassificationCode, Vec<&ClassificationCode>> =
        codes.iter().map(|c| (c, Vec::new())).collect();
    for code in codes {
        let parent = codes
            .iter()
            .filter(|candidate| candidate.is_ancestor_of(code))
            .max_by_key(|candidate| candidate.as_str().len());
        if let Some(parent) = parent {
            children.entry(parent).or_default().push(code);
        }
    }
    children
}
