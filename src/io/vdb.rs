//! VDB XML export ingest.
//!
//! The CZSO "VDB" export is a dictionary-encoded XML document:
//!
//! - `metaSlovnik/vecneUpresneni/element[@ID]`: classification elements
//!   (`dim`, `kod`, `text`, ...); only `dim == "ECOICOP"` is relevant
//! - `metaSlovnik/obdobi/cas[@ID]`: reporting intervals (`casOd`, `casDo`)
//! - `data/udaj`: values (`hod`) referencing one interval (`cas`) and several
//!   elements (`vec`)
//!
//! Only monthly values are kept; quarterly/annual rows are counted and dropped.
//! Namespaces are ignored: elements are matched by local name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use log::{debug, info};
use roxmltree::{Document, Node};

use crate::domain::{ClassificationCode, MonthPeriod, Observation, ReportingInterval};
use crate::error::{AppError, EXIT_INPUT};

const ECOICOP_DIM: &str = "ECOICOP";

/// Observations of one export plus ingest counters.
#[derive(Debug, Clone, Default)]
pub struct ParsedExport {
    pub observations: Vec<Observation>,
    /// `udaj` records seen.
    pub records_read: usize,
    /// Records dropped because their interval is longer than a month.
    pub skipped_non_monthly: usize,
    /// Records dropped because none of their `vec` refs is an ECOICOP element.
    pub skipped_unclassified: usize,
}

#[derive(Debug, Clone)]
struct Element {
    code: ClassificationCode,
    label: String,
}

/// Read and parse one export file.
pub fn load_export(path: &Path) -> Result<ParsedExport, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::new(
            EXIT_INPUT,
            format!("Failed to read export '{}': {e}", path.display()),
        )
    })?;
    let parsed = parse_export(&text).map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    info!(
        "{}: {} monthly observations ({} records, {} non-monthly, {} unclassified)",
        path.display(),
        parsed.observations.len(),
        parsed.records_read,
        parsed.skipped_non_monthly,
        parsed.skipped_unclassified
    );
    Ok(parsed)
}

/// Parse the text of one export.
pub fn parse_export(text: &str) -> Result<ParsedExport, AppError> {
    let doc = Document::parse(text).map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid XML: {e}")))?;
    let root = doc.root_element();

    let elements = extract_elements(root)?;
    let intervals = extract_intervals(root)?;
    debug!(
        "export dictionary: {} ECOICOP elements, {} intervals",
        elements.len(),
        intervals.len()
    );

    let mut out = ParsedExport::default();
    for udaj in find_path(root, &["data", "udaj"]) {
        out.records_read += 1;

        let raw_value = required_text(udaj, "hod")?;
        let value = raw_value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| input_error(format!("Invalid value '{raw_value}' in <udaj>.")))?;

        let time_ref = required_text(udaj, "cas")?;
        let interval = intervals
            .get(time_ref)
            .ok_or_else(|| input_error(format!("<udaj> references unknown interval '{time_ref}'.")))?;

        if !interval.is_monthly() {
            out.skipped_non_monthly += 1;
            continue;
        }

        let element = udaj
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "vec")
            .filter_map(|n| n.text())
            .find_map(|id| elements.get(id.trim()));
        let Some(element) = element else {
            out.skipped_unclassified += 1;
            continue;
        };

        out.observations.push(Observation {
            value,
            period: MonthPeriod::from_interval(interval)?,
            code: element.code.clone(),
            label: element.label.clone(),
        });
    }

    Ok(out)
}

/// Union of several exports.
///
/// Identical observations (same code, month and value) reported by more than
/// one file are kept once. The result is sorted, so it does not depend on the
/// order the files were read in.
pub fn merge_observations(batches: impl IntoIterator<Item = Vec<Observation>>) -> Vec<Observation> {
    let mut merged: Vec<Observation> = batches.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        a.code
            .cmp(&b.code)
            .then(a.period.cmp(&b.period))
            .then(a.value.total_cmp(&b.value))
    });
    let before = merged.len();
    merged.dedup_by(|a, b| a.code == b.code && a.period == b.period && a.value.to_bits() == b.value.to_bits());
    if merged.len() < before {
        debug!("merge dropped {} duplicate observations", before - merged.len());
    }
    merged
}

fn extract_elements(root: Node<'_, '_>) -> Result<HashMap<String, Element>, AppError> {
    let mut elements = HashMap::new();
    for node in find_path(root, &["metaSlovnik", "vecneUpresneni", "element"]) {
        if child_text(node, "dim") != Some(ECOICOP_DIM) {
            continue;
        }
        let id = node
            .attribute("ID")
            .ok_or_else(|| input_error("ECOICOP <element> without an ID attribute."))?;
        let code = required_text(node, "kod")?;
        elements.insert(
            id.to_string(),
            Element {
                code: ClassificationCode::new(code),
                label: child_text(node, "text").unwrap_or_default().to_string(),
            },
        );
    }
    Ok(elements)
}

fn extract_intervals(root: Node<'_, '_>) -> Result<HashMap<String, ReportingInterval>, AppError> {
    let mut intervals = HashMap::new();
    for node in find_path(root, &["metaSlovnik", "obdobi", "cas"]) {
        let id = node
            .attribute("ID")
            .ok_or_else(|| input_error("<cas> without an ID attribute."))?;
        let interval = ReportingInterval {
            start: parse_date(required_text(node, "casOd")?)?,
            end: parse_date(required_text(node, "casDo")?)?,
        };
        intervals.insert(id.to_string(), interval);
    }
    Ok(intervals)
}

/// Descendants of `root` whose tag and ancestor tags end with `path`.
fn find_path<'a, 'input>(root: Node<'a, 'input>, path: &'a [&'a str]) -> impl Iterator<Item = Node<'a, 'input>> {
    root.descendants().filter(move |node| {
        let mut current = Some(*node);
        for name in path.iter().rev() {
            match current {
                Some(n) if n.is_element() && n.tag_name().name() == *name => current = n.parent(),
                _ => return false,
            }
        }
        true
    })
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(str::trim)
}

fn required_text<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, AppError> {
    child_text(node, name)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| input_error(format!("<{}> is missing <{name}>.", node.tag_name().name())))
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| input_error(format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}")))
}

fn input_error(message: impl Into<String>) -> AppError {
    AppError::new(EXIT_INPUT, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_DATA;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<vystup xmlns="http://vdb.czso.cz/xml/export">
  <metaSlovnik>
    <vecneUpresneni>
      <element ID="e1"><dim>ECOICOP</dim><dimText>ECOICOP</dimText><ciselnik>5802</ciselnik><kod>011</kod><text>Potraviny</text></element>
      <element ID="e2"><dim>ECOICOP</dim><dimText>ECOICOP</dimText><ciselnik>5802</ciselnik><kod>012</kod><text>Nealkoholické nápoje</text></element>
      <element ID="u1"><dim>UKAZATEL</dim><kod>IS</kod><text>Index</text></element>
    </vecneUpresneni>
    <obdobi>
      <cas ID="c1"><casOd>2023-01-01</casOd><casDo>2023-01-31</casDo><bazOd>2015-01-01</bazOd><bazDo>2015-12-31</bazDo></cas>
      <cas ID="c2"><casOd>2023-02-01</casOd><casDo>2023-02-28</casDo><bazOd>2015-01-01</bazOd><bazDo>2015-12-31</bazDo></cas>
      <cas ID="q1"><casOd>2023-01-01</casOd><casDo>2023-03-31</casDo><bazOd>2015-01-01</bazOd><bazDo>2015-12-31</bazDo></cas>
    </obdobi>
  </metaSlovnik>
  <data>
    <udaj><hod>100.5</hod><cas>c1</cas><vec>u1</vec><vec>e1</vec></udaj>
    <udaj><hod>201.0</hod><cas>c1</cas><vec>u1</vec><vec>e2</vec></udaj>
    <udaj><hod>101.5</hod><cas>c2</cas><vec>u1</vec><vec>e1</vec></udaj>
    <udaj><hod>150.0</hod><cas>q1</cas><vec>u1</vec><vec>e1</vec></udaj>
    <udaj><hod>99.0</hod><cas>c1</cas><vec>u1</vec></udaj>
  </data>
</vystup>
"#;

    #[test]
    fn parses_monthly_ecoicop_values() {
        let parsed = parse_export(SAMPLE).unwrap();
        assert_eq!(parsed.records_read, 5);
        assert_eq!(parsed.skipped_non_monthly, 1);
        assert_eq!(parsed.skipped_unclassified, 1);
        assert_eq!(parsed.observations.len(), 3);

        let first = &parsed.observations[0];
        assert_eq!(first.code.as_str(), "011");
        assert_eq!(first.label, "Potraviny");
        assert_eq!(first.period.to_string(), "2023-01");
        assert!((first.value - 100.5).abs() < 1e-12);
    }

    #[test]
    fn mid_month_interval_is_a_data_error() {
        let text = SAMPLE.replace("<casOd>2023-02-01</casOd>", "<casOd>2023-02-02</casOd>");
        let err = parse_export(&text).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_DATA);
    }

    #[test]
    fn unknown_interval_reference_is_an_input_error() {
        let text = SAMPLE.replace("<cas>c2</cas>", "<cas>c9</cas>");
        let err = parse_export(&text).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
        assert!(err.message().contains("c9"), "got: {err}");
    }

    #[test]
    fn merge_is_an_order_free_union() {
        let a = parse_export(SAMPLE).unwrap().observations;
        let mut b = a.clone();
        b.reverse();
        let merged = merge_observations([a.clone(), b]);
        assert_eq!(merged.len(), a.len());
        assert_eq!(merged, merge_observations([a]));
    }
}
