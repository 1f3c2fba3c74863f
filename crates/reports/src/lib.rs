//! Canteen Reports - sales report engine.
//!
//! Reads orders for outlets, buildings or purchasers from the canteen REST
//! backend, filters them by date window and purchaser company, computes
//! per-order and grand totals, and exports the result as an xlsx workbook
//! or an HTML table.
//!
//! # Modules
//!
//! - [`backend`] - HTTP client and the [`OrderSource`] seam
//! - [`config`] - Environment configuration
//! - [`report`] - Fetch, filter, aggregate, export
//! - [`scope`] - Report scopes and role checks
//! - [`session`] - Login session persistence
//! - [`view`] - The report view state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod report;
pub mod scope;
pub mod session;
pub mod view;

pub use backend::{BackendClient, BackendError, Order, OrderSource};
pub use config::{ConfigError, ReportsConfig};
pub use error::{ExportError, FetchError, InvalidRangeError, ReportError};
pub use report::{EngineSettings, Report, ReportForm, ReportRequest, run_report};
pub use scope::{ReportScope, StallRef, authorize};
pub use session::{Identity, Session, SessionError, SessionStore};
pub use view::{RefreshOutcome, ReportView, ViewState};
