//! Canteen REST backend access.
//!
//! The backend owns authentication, persistence and business rules; this
//! module only reads orders and outlets from it.
//!
//! # Endpoints
//!
//! - `GET /orders/by-stall/{stallId}` - all orders of one outlet
//! - `GET /orders/by-stall/{stallId}/range?start_date&end_date` - orders in a
//!   window (404 means "no orders in range")
//! - `GET /orders/user/{userId}` - orders of one purchaser
//! - `GET /stalls/building/{buildingId}` / `GET /stalls/admin/{adminId}` - outlets

pub mod client;
pub mod types;

use std::future::Future;

pub use client::BackendClient;
pub use types::*;

use canteen_core::{AdminId, BuildingId, StallId, UserId};
use thiserror::Error;

use crate::report::window::DateWindow;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The session token was rejected.
    #[error("Unauthorized: session token rejected")]
    Unauthorized,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response or build a request.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Where orders and outlets come from.
///
/// [`BackendClient`] is the production implementation; tests substitute
/// in-memory sources.
pub trait OrderSource: Sync {
    /// Orders of one outlet, optionally restricted to a window.
    ///
    /// "No orders" must be reported as an empty list, not an error.
    fn stall_orders(
        &self,
        stall_id: StallId,
        window: Option<&DateWindow>,
    ) -> impl Future<Output = Result<Vec<Order>, BackendError>> + Send;

    /// Orders placed by one purchaser.
    fn user_orders(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Order>, BackendError>> + Send;

    /// Outlets located in a building.
    fn building_stalls(
        &self,
        building_id: BuildingId,
    ) -> impl Future<Output = Result<Vec<Stall>, BackendError>> + Send;

    /// Outlets run by a vendor admin account.
    fn admin_stalls(
        &self,
        admin_id: AdminId,
    ) -> impl Future<Output = Result<Vec<Stall>, BackendError>> + Send;
}
