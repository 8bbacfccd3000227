//! Errors from the balance engine's structural validation.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors the balance engine's pure logic can raise. Missing-account and
/// storage failures belong to the `db` crate's repositories.
#[derive(Debug, Error)]
pub enum BalanceError {
    /// A requested history/backfill range has its end before its start.
    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

impl BalanceError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = BalanceError::InvalidDateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }
}
