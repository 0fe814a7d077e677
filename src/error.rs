//! Error types.
//!
//! - `DataError` is the data-integrity taxonomy raised by the core (coverage,
//!   basket, aggregation, period validation). Every variant is a hard stop.
//! - `AppError` is what crosses the binary boundary: a message plus the process
//!   exit code.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{ClassificationCode, MonthPeriod};

/// Exit code for unreadable/unwritable files and bad arguments.
pub const EXIT_INPUT: u8 = 2;
/// Exit code for data-integrity failures (`DataError`).
pub const EXIT_DATA: u8 = 3;
/// Exit code for remote/network failures.
pub const EXIT_REMOTE: u8 = 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("category `{category}` declares code {prefix}, which matches no observed code")]
    UnknownPrefix {
        category: String,
        prefix: ClassificationCode,
    },

    #[error("code {code} is covered by both `{first}` and `{second}`")]
    OverlappingCoverage {
        code: ClassificationCode,
        first: String,
        second: String,
    },

    #[error("code {code} is not covered (either fully or partially) by any category")]
    UncoveredLeaf { code: ClassificationCode },

    #[error("code {ancestor} is a parent of {descendant}; weighing both would double-count spend")]
    ParentChildOverlap {
        ancestor: ClassificationCode,
        descendant: ClassificationCode,
    },

    #[error("expected positive basket weight for code {code}, got {weight}")]
    NonPositiveWeight { code: ClassificationCode, weight: f64 },

    #[error("expected positive total weight for category `{category}` in period {period}, got {total}")]
    ZeroTotalWeight {
        category: String,
        period: MonthPeriod,
        total: f64,
    },

    #[error("reporting interval {start}..{end} is not a single calendar month: {reason}")]
    MalformedPeriod {
        start: NaiveDate,
        end: NaiveDate,
        reason: &'static str,
    },

    #[error("month must be between 1 and 12, got {month}")]
    InvalidMonth { month: u32 },

    #[error("category id `{id}` is declared more than once")]
    DuplicateCategory { id: String },

    #[error("preset amounts sum to {actual}, expected {expected} (tolerance {tolerance})")]
    PresetDrift {
        expected: f64,
        actual: f64,
        tolerance: f64,
    },
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::new(EXIT_DATA, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_map_to_data_exit_code() {
        let err: AppError = DataError::UncoveredLeaf {
            code: ClassificationCode::new("0123"),
        }
        .into();
        assert_eq!(err.exit_code(), EXIT_DATA);
        assert!(err.message().contains("0123"), "got: {err}");
    }
}
