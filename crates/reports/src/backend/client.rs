//! HTTP client for the canteen REST backend.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use canteen_core::{AdminId, BuildingId, StallId, UserId};

use super::{BackendError, Order, OrderSource, RangeQuery, Stall};
use crate::config::ReportsConfig;
use crate::report::window::DateWindow;
use crate::session::Session;

/// Canteen backend API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client authenticated with the session's bearer token.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ReportsConfig, session: &Session) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", session.token().expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| BackendError::Parse(format!("Invalid session token format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Base URL all endpoint paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| BackendError::Parse(format!("Invalid endpoint '{path}': {e}")))
    }

    /// Execute a GET request and parse the JSON body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        let response = self
            .inner
            .client
            .get(url)
            .send()
            .await
            .map_err(classify)?;
        self.handle_response(response).await
    }

    /// GET a list where 404 means "nothing here".
    async fn get_list_or_empty<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, BackendError> {
        match self.get(url).await {
            Err(BackendError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse error response from the backend.
    async fn parse_error(&self, response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return BackendError::Unauthorized;
        }

        if status == 404 {
            return BackendError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        BackendError::Api { status, message }
    }
}

fn classify(error: reqwest::Error) -> BackendError {
    if error.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Http(error)
    }
}

impl OrderSource for BackendClient {
    #[instrument(skip(self, window), fields(stall_id = %stall_id, ranged = window.is_some()))]
    async fn stall_orders(
        &self,
        stall_id: StallId,
        window: Option<&DateWindow>,
    ) -> Result<Vec<Order>, BackendError> {
        let url = match window {
            Some(window) => {
                let query = RangeQuery::from(window);
                let mut url = self.endpoint(&format!("orders/by-stall/{stall_id}/range"))?;
                url.query_pairs_mut()
                    .append_pair("start_date", &query.start_date)
                    .append_pair("end_date", &query.end_date);
                url
            }
            None => self.endpoint(&format!("orders/by-stall/{stall_id}"))?,
        };

        let orders: Vec<Order> = self.get_list_or_empty(url).await?;
        tracing::debug!(count = orders.len(), "Fetched stall orders");
        Ok(orders)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn user_orders(&self, user_id: UserId) -> Result<Vec<Order>, BackendError> {
        let url = self.endpoint(&format!("orders/user/{user_id}"))?;
        let orders: Vec<Order> = self.get_list_or_empty(url).await?;
        tracing::debug!(count = orders.len(), "Fetched user orders");
        Ok(orders)
    }

    #[instrument(skip(self), fields(building_id = %building_id))]
    async fn building_stalls(&self, building_id: BuildingId) -> Result<Vec<Stall>, BackendError> {
        let url = self.endpoint(&format!("stalls/building/{building_id}"))?;
        self.get(url).await
    }

    #[instrument(skip(self), fields(admin_id = %admin_id))]
    async fn admin_stalls(&self, admin_id: AdminId) -> Result<Vec<Stall>, BackendError> {
        let url = self.endpoint(&format!("stalls/admin/{admin_id}"))?;
        self.get(url).await
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}
