//! Terminal output: run summary and the category → code mapping.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::app::pipeline::{ProcessOutput, VerifiedInput};
use crate::catalog::CategoryCatalog;
use crate::coverage::{CoverageReport, immediate_children};
use crate::domain::{ClassificationCode, Observation};

/// Print each category with the tree of observed codes it claims.
///
/// ```text
/// Category Jídlo
///   011: Potraviny
///     0111: Chléb a obiloviny
/// ```
pub fn format_category_mapping(catalog: &CategoryCatalog, observations: &[Observation]) -> String {
    let labels: BTreeMap<&ClassificationCode, &str> = observations
        .iter()
        .map(|o| (&o.code, o.label.as_str()))
        .collect();
    let codes: BTreeSet<ClassificationCode> = labels.keys().map(|c| (*c).clone()).collect();
    let children = immediate_children(&codes);

    let mut out = String::new();
    for category in catalog {
        out.push_str(&format!("Category {}\n", category.name));
        for prefix in &category.code_prefixes {
            if !codes.contains(prefix) {
                out.push_str(&format!("  {prefix}: (not observed)\n"));
            }
            // Top-most observed codes under this prefix.
            let roots = codes.iter().filter(|code| {
                prefix.covers(code) && !codes.iter().any(|a| a.is_ancestor_of(code) && prefix.covers(a))
            });
            let depth = if codes.contains(prefix) { 1 } else { 2 };
            for root in roots {
                push_subtree(&mut out, root, depth, &labels, &children);
            }
        }
    }
    out
}

fn push_subtree(
    out: &mut String,
    code: &ClassificationCode,
    depth: usize,
    labels: &BTreeMap<&ClassificationCode, &str>,
    children: &HashMap<&ClassificationCode, Vec<&ClassificationCode>>,
) {
    let label = labels.get(code).copied().unwrap_or_default();
    out.push_str(&format!("{}{code}: {label}\n", "  ".repeat(depth)));
    let mut kids: Vec<&ClassificationCode> = children.get(code).cloned().unwrap_or_default();
    kids.sort();
    for kid in kids {
        push_subtree(out, kid, depth + 1, labels, children);
    }
}

/// Format the run summary (inputs, observations, coverage, per-category periods).
pub fn format_run_summary(output: &ProcessOutput) -> String {
    let mut out = String::new();
    let observations = output.verified.observations();

    out.push_str("=== inflacka - category price indices ===\n");
    out.push_str(&format!("Basket: {} items\n", output.basket_items));

    out.push_str("\nInputs:\n");
    for input in &output.inputs {
        out.push_str(&format_input(input));
    }

    let first = observations.iter().map(|o| o.period).min();
    let last = observations.iter().map(|o| o.period).max();
    let range = match (first, last) {
        (Some(a), Some(b)) => format!("{a}..{b}"),
        _ => "-".to_string(),
    };
    out.push_str(&format!(
        "\nObservations: n={} | codes={} | periods={range}\n",
        observations.len(),
        output.verified.report().code_count(),
    ));
    out.push_str(&format_coverage(output.verified.report()));

    out.push_str("\nCategories:\n");
    for (category, result) in output.verified.catalog().iter().zip(&output.results) {
        out.push_str(&format!(
            "  {:<20} {:<32} {:>4} periods\n",
            category.id,
            category.name,
            result.rates_by_period.len()
        ));
    }

    if let Some(preset) = &output.preset {
        let total: i64 = preset.iter().map(|e| e.amount).sum();
        out.push_str(&format!("\nPreset: {} categories, total {total}\n", preset.len()));
    }

    out
}

fn format_input(input: &VerifiedInput) -> String {
    format!(
        "  {} | records={} | monthly={} | non-monthly={} | unclassified={}\n",
        input.path.display(),
        input.records_read,
        input.observations,
        input.skipped_non_monthly,
        input.skipped_unclassified
    )
}

pub fn format_coverage(report: &CoverageReport) -> String {
    format!(
        "Coverage: {} codes claimed directly, {} covered via descendants\n",
        report.assignments.len(),
        report.delegated.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategoryDefinition, MonthPeriod};

    fn obs(code: &str, label: &str) -> Observation {
        Observation {
            value: 100.0,
            period: MonthPeriod::new(2024, 1).unwrap(),
            code: code.into(),
            label: label.to_string(),
        }
    }

    #[test]
    fn mapping_prints_indented_subtrees() {
        let catalog = CategoryCatalog::new(vec![
            CategoryDefinition {
                id: "food".to_string(),
                name: "Jídlo".to_string(),
                description: String::new(),
                code_prefixes: vec!["011".into()],
            },
            CategoryDefinition {
                id: "drinks".to_string(),
                name: "Nápoje".to_string(),
                description: String::new(),
                code_prefixes: vec!["012".into()],
            },
        ])
        .unwrap();
        let observations = vec![
            obs("01", "Potraviny a nápoje"),
            obs("011", "Potraviny"),
            obs("0111", "Chléb"),
            obs("0112", "Maso"),
            obs("0121", "Káva"),
        ];

        let text = format_category_mapping(&catalog, &observations);
        let expected = "\
Category Jídlo
  011: Potraviny
    0111: Chléb
    0112: Maso
Category Nápoje
  012: (not observed)
    0121: Káva
";
        pretty_assertions::assert_eq!(text, expected);
    }
}
