//! Integration tests for the canteen report engine.
//!
//! [`MockBackend`] serves the backend's order and outlet endpoints from an
//! in-process axum router bound to an ephemeral port, so tests drive the real
//! [`BackendClient`](canteen_reports::BackendClient) over HTTP.
//!
//! # Fixtures
//!
//! | outlet | name    | behaviour                               |
//! |--------|---------|-----------------------------------------|
//! | 1      | Alpha   | Tea (T1, 10:00Z) and Coffee (T2, 11:00) |
//! | 2      | Bravo   | HTTP 500                                |
//! | 3      | Charlie | HTTP 404 ("no orders")                  |
//! | 5      | Slow    | responds after [`SLOW_DELAY`]           |
//!
//! Building 1 and admin 1 both own outlets 1-3. Purchaser 42 placed the Tea
//! order. Any token other than [`TOKEN`] gets HTTP 401.
//!
//! Exported workbooks are read back cell by cell with [`xlsx::SheetCells`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod xlsx;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use canteen_core::{Role, UserId};
use canteen_reports::{ConfigError, Identity, ReportsConfig, Session};

/// Bearer token the mock accepts.
pub const TOKEN: &str = "test-token";

/// How long outlet 5 takes to answer.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// Requests seen by the mock.
#[derive(Debug, Default)]
pub struct MockState {
    requests: AtomicUsize,
    range_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl MockState {
    /// Number of requests received, including rejected ones.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Query parameters of every range request, in arrival order.
    #[must_use]
    pub fn range_queries(&self) -> Vec<HashMap<String, String>> {
        self.range_queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A running mock backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockBackend {
    /// Bind to an ephemeral port and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/orders/by-stall/{id}", get(stall_orders))
            .route("/api/orders/by-stall/{id}/range", get(stall_orders_in_range))
            .route("/api/orders/user/{id}", get(user_orders))
            .route("/api/stalls/building/{id}", get(outlets))
            .route("/api/stalls/admin/{id}", get(outlets))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self { addr, state })
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Default configuration pointed at this backend, on UTC+05:30.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is rejected.
    pub fn config(&self) -> Result<ReportsConfig, ConfigError> {
        ReportsConfig::new(&self.base_url())
    }
}

/// A session for `role` carrying the accepted token.
#[must_use]
pub fn session(role: Role) -> Session {
    session_with_token(role, TOKEN)
}

#[must_use]
pub fn session_with_token(role: Role, token: &str) -> Session {
    Session::new(token, Identity::new(UserId::new(1), "Test Operator", role))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

fn stall_payload(id: i64) -> Response {
    match id {
        1 => Json(alpha_orders()).into_response(),
        2 => (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response(),
        3 => (StatusCode::NOT_FOUND, "No orders found").into_response(),
        _ => Json(json!([])).into_response(),
    }
}

async fn stall_orders(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id == 5 {
        tokio::time::sleep(SLOW_DELAY).await;
    }
    stall_payload(id)
}

async fn stall_orders_in_range(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state
        .range_queries
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(query);
    stall_payload(id)
}

async fn user_orders(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match id {
        42 => {
            let tea: Vec<Value> = alpha_orders().into_iter().take(1).collect();
            Json(tea).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "No orders found").into_response(),
    }
}

async fn outlets(
    State(state): State<Arc<MockState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if id != 1 {
        return Json(json!([])).into_response();
    }
    Json(json!([
        {"id": 1, "name": "Alpha", "building_id": 1, "is_available": true,
         "opening_time": "08:00 AM", "closing_time": "06:00 PM"},
        {"id": 2, "name": "Bravo", "building_id": 1, "is_available": true},
        {"id": 3, "name": "Charlie", "building_id": 1, "is_available": false}
    ]))
    .into_response()
}

/// Outlet 1's orders as the backend sends them.
#[must_use]
pub fn alpha_orders() -> Vec<Value> {
    vec![
        json!({
            "id": 101,
            "token_number": "T1",
            "created_datetime": "2025-01-10T10:00:00Z",
            "user_email": "a@cashe.co",
            "order_details": [
                {"item_id": 7, "name": "Tea", "quantity": 2, "price": 10, "total": 20, "gst": 1}
            ],
            "round_off": 0.4,
            "total_gst": 1,
            "cgst": 0.5,
            "sgst": 0.5,
            "total_amount": 20,
            "paid_with_wallet": true,
            "stall_id": 1,
            "stall_name": "Alpha"
        }),
        json!({
            "id": "102",
            "token_number": "T2",
            "created_datetime": "2025-01-10T11:00:00",
            "user_email": "b@other.com",
            "user_phone": "9800000000",
            "order_details": [
                {"item_id": 8, "name": "Coffee", "quantity": 1, "price": 15, "total": 15}
            ],
            "round_off": -0.1,
            "total_amount": 15,
            "paid_with_wallet": false,
            "stall_id": 1,
            "stall_name": "Alpha"
        }),
    ]
}
