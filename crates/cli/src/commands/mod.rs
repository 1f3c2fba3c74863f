//! Subcommand implementations.

pub mod report;
pub mod session;
pub mod stalls;

use thiserror::Error;

use canteen_reports::{BackendError, ConfigError, ExportError, ReportError, SessionError};

/// Errors that end a CLI invocation with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Report(#[from] ReportError),

    /// The report view ended in its failed state.
    #[error("Report failed: {0}")]
    ReportFailed(String),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
