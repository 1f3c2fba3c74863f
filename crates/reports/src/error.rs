//! Unified error handling for the report engine.

use chrono::NaiveDate;
use thiserror::Error;

use canteen_core::Role;

use crate::backend::BackendError;

/// A custom or named date range that cannot be resolved.
///
/// Always raised before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRangeError {
    /// The filter token is not one of `all`, `today`, `week`, `month`, `custom`.
    #[error("unknown date filter '{0}'")]
    UnknownFilter(String),

    /// A custom range is missing one of its bounds.
    #[error("custom range is missing its {0} date")]
    MissingBound(&'static str),

    /// A bound is not a `YYYY-MM-DD` date.
    #[error("invalid {field} date '{value}', expected YYYY-MM-DD")]
    Unparsable {
        /// Which bound failed (`start` or `end`).
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The end date precedes the start date.
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart {
        /// Parsed start date.
        start: NaiveDate,
        /// Parsed end date.
        end: NaiveDate,
    },

    /// A bound lies outside years 1 through 9999.
    #[error("date {0} is outside the supported range")]
    OutOfRange(NaiveDate),
}

/// One scope unit (an outlet or a purchaser) whose orders could not be fetched.
///
/// Recovered locally: the unit contributes zero orders and the failure is
/// listed alongside the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch orders for {unit}: {message}")]
pub struct FetchError {
    /// Display label of the unit (e.g. outlet name).
    pub unit: String,
    /// Underlying backend error, rendered.
    pub message: String,
}

/// Spreadsheet generation failed. The in-memory report is left untouched.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The workbook writer rejected the data.
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// An amount could not be represented as a spreadsheet number.
    #[error("amount {0} cannot be written as a number")]
    Amount(String),

    /// The HTML template failed to render.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a whole report run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The date filter could not be resolved.
    #[error("Invalid date range: {0}")]
    InvalidRange(#[from] InvalidRangeError),

    /// A call the whole report depends on failed (e.g. listing outlets).
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Every scope unit failed, so there is nothing to report on.
    #[error("All {} order fetches failed", .0.len())]
    AllFetchesFailed(Vec<FetchError>),

    /// The logged-in role may not run this report.
    #[error("Forbidden: role {role} cannot view {scope}")]
    Forbidden {
        /// Role of the current session.
        role: Role,
        /// Human-readable scope description.
        scope: String,
    },

    /// A report option was not understood.
    #[error("Invalid option: {0}")]
    InvalidOption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_display() {
        let err = ReportError::InvalidRange(InvalidRangeError::MissingBound("end"));
        assert_eq!(
            err.to_string(),
            "Invalid date range: custom range is missing its end date"
        );

        let err = ReportError::Forbidden {
            role: Role::Vendor,
            scope: "building 4".to_string(),
        };
        assert_eq!(err.to_string(), "Forbidden: role vendor cannot view building 4");
    }

    #[test]
    fn test_all_fetches_failed_counts_units() {
        let err = ReportError::AllFetchesFailed(vec![
            FetchError {
                unit: "Chai Point".to_string(),
                message: "timeout".to_string(),
            },
            FetchError {
                unit: "Dosa Corner".to_string(),
                message: "timeout".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "All 2 order fetches failed");
    }
}
