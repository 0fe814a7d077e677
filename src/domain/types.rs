//! Shared domain types.
//!
//! These are plain values: nothing here is mutated after construction, and the
//! pipeline stages only ever produce new values from old ones.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DataError;

/// Longest reporting interval (in days) still treated as a monthly figure.
///
/// Quarterly and annual rows in the export span ~90/365 days and are dropped
/// by the parser before they reach `MonthPeriod`.
pub const MAX_MONTHLY_SPAN_DAYS: i64 = 40;

/// A code from the ECOICOP classification.
///
/// The hierarchy is encoded in the string itself: `A` is an ancestor of `B`
/// iff `B` starts with `A` and `B != A`. There is no separate tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationCode(String);

impl ClassificationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Normalize a code as written in the basket table (`E01.1`) to the form
    /// used by the price export (`011`).
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().chars().filter(|c| !matches!(c, '.' | 'E')).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strict ancestry: `self` is a proper prefix of `other`.
    pub fn is_ancestor_of(&self, other: &ClassificationCode) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    /// `self` equals `other` or is its ancestor.
    pub fn covers(&self, other: &ClassificationCode) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for ClassificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassificationCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A calendar month. Ordered chronologically; rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, DataError> {
        if !(1..=12).contains(&month) {
            return Err(DataError::InvalidMonth { month });
        }
        Ok(Self { year, month })
    }

    /// Derive the month covered by a reporting interval.
    ///
    /// The interval must start on the 1st and end on day 28..=31 of the same
    /// month.
    pub fn from_interval(interval: &ReportingInterval) -> Result<Self, DataError> {
        let ReportingInterval { start, end } = *interval;
        let malformed = |reason| DataError::MalformedPeriod { start, end, reason };

        if start.day() != 1 {
            return Err(malformed("start is not the first day of a month"));
        }
        if !(28..=31).contains(&end.day()) {
            return Err(malformed("end is not the last day of a month"));
        }
        if start.year() != end.year() || start.month() != end.month() {
            return Err(malformed("start and end fall in different months"));
        }
        Self::new(start.year(), start.month())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid period '{s}'. Expected YYYY-MM."))?;
        let year = year
            .parse::<i32>()
            .map_err(|e| format!("Invalid year in period '{s}': {e}"))?;
        let month = month
            .parse::<u32>()
            .map_err(|e| format!("Invalid month in period '{s}': {e}"))?;
        MonthPeriod::new(year, month).map_err(|e| e.to_string())
    }
}

// Periods are map keys in the output JSON, so they travel as strings.
impl Serialize for MonthPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The `[start, end]` dates a reported value refers to (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportingInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportingInterval {
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn is_monthly(&self) -> bool {
        self.span_days() <= MAX_MONTHLY_SPAN_DAYS
    }
}

/// One reported price-index value for one code in one month.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub value: f64,
    pub period: MonthPeriod,
    pub code: ClassificationCode,
    /// Human-readable name of the code, as given by the export.
    pub label: String,
}

/// A user-facing spending category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// snake_case identifier, unique within the catalog.
    pub id: String,
    pub name: String,
    pub description: String,
    /// Codes claimed by this category. Each also claims every descendant.
    pub code_prefixes: Vec<ClassificationCode>,
}

/// One row of the consumer basket: a code and its share of total spend.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketItem {
    pub code: ClassificationCode,
    pub label: String,
    pub unit: String,
    /// Fraction of total spend (the whole basket sums to ~1.0).
    pub weight_fraction: f64,
}

/// Aggregated series for one category.
///
/// A month with no matching observation is absent, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category_id: String,
    pub rates_by_period: BTreeMap<MonthPeriod, f64>,
}

/// Serialization flavour of the rates file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// TypeScript module with `inflationMetadata` and `inflationRates` exports.
    Ts,
    /// Plain JSON object `{ "metadata": ..., "rates": [...] }`.
    Json,
}

impl OutputFormat {
    /// Pick a format from the output file extension (`.json` → JSON, else TS).
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Ts,
        }
    }
}

/// A full `process` run's configuration, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub inputs: Vec<PathBuf>,
    pub basket_csv: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub profile_file: Option<PathBuf>,
    pub print_mapping: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn ancestry_is_string_prefix() {
        let food = ClassificationCode::new("01");
        let bread = ClassificationCode::new("0111");
        assert!(food.is_ancestor_of(&bread));
        assert!(!bread.is_ancestor_of(&food));
        assert!(!food.is_ancestor_of(&food));
        assert!(food.covers(&food));
        assert!(!ClassificationCode::new("02").covers(&bread));
    }

    #[test]
    fn basket_codes_normalize_to_export_form() {
        assert_eq!(ClassificationCode::normalized("E01.11").as_str(), "0111");
        assert_eq!(ClassificationCode::normalized(" E00 ").as_str(), "00");
    }

    #[test]
    fn month_period_rejects_bad_month() {
        assert_eq!(MonthPeriod::new(2023, 13), Err(DataError::InvalidMonth { month: 13 }));
        assert!(MonthPeriod::new(2023, 12).is_ok());
    }

    #[test]
    fn month_period_from_interval() {
        let feb = ReportingInterval {
            start: date(2024, 2, 1),
            end: date(2024, 2, 29),
        };
        assert_eq!(MonthPeriod::from_interval(&feb).unwrap().to_string(), "2024-02");

        let mid_month = ReportingInterval {
            start: date(2024, 2, 2),
            end: date(2024, 2, 29),
        };
        assert!(matches!(
            MonthPeriod::from_interval(&mid_month),
            Err(DataError::MalformedPeriod { .. })
        ));

        let mid_month_end = ReportingInterval {
            start: date(2024, 3, 1),
            end: date(2024, 3, 15),
        };
        assert!(matches!(
            MonthPeriod::from_interval(&mid_month_end),
            Err(DataError::MalformedPeriod {
                reason: "end is not the last day of a month",
                ..
            })
        ));

        let crosses = ReportingInterval {
            start: date(2024, 1, 1),
            end: date(2024, 2, 29),
        };
        assert!(matches!(
            MonthPeriod::from_interval(&crosses),
            Err(DataError::MalformedPeriod { .. })
        ));
    }

    #[test]
    fn quarterly_interval_is_not_monthly() {
        let q1 = ReportingInterval {
            start: date(2024, 1, 1),
            end: date(2024, 3, 31),
        };
        assert!(!q1.is_monthly());
        let jan = ReportingInterval {
            start: date(2024, 1, 1),
            end: date(2024, 1, 31),
        };
        assert!(jan.is_monthly());
    }

    #[test]
    fn periods_order_chronologically_and_parse_back() {
        let a: MonthPeriod = "2023-12".parse().unwrap();
        let b: MonthPeriod = "2024-01".parse().unwrap();
        assert!(a < b);
        assert!("2024-00".parse::<MonthPeriod>().is_err());
        assert_eq!(serde_json::to_string(&b).unwrap(), "\"2024-01\"");
    }
}
