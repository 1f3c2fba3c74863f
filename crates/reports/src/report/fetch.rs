//! Order fetching with per-unit failure isolation.
//!
//! A scope expands into units (outlets or purchasers). Units are fetched
//! concurrently and their results concatenated in scope order, so the output
//! does not depend on which request finishes first. A failing unit is logged
//! and contributes zero orders.

use futures::future::join_all;

use canteen_core::UserId;

use crate::backend::{BackendError, Order, OrderSource, Stall};
use crate::error::{FetchError, ReportError};
use crate::report::window::DateWindow;
use crate::scope::{ReportScope, StallRef};

/// Label for purchaser orders that do not name their outlet.
pub const UNKNOWN_OUTLET: &str = "Unknown outlet";

/// An order tagged with the display label of the outlet it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedOrder {
    pub label: String,
    pub order: Order,
}

/// Everything fetched for one scope.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Orders in scope-iteration order.
    pub orders: Vec<TaggedOrder>,
    /// Units whose fetch failed and were counted as empty.
    pub failed_units: Vec<FetchError>,
}

/// Fetch all orders for `scope`.
///
/// With a window, outlet fetches use the backend's range endpoint; purchaser
/// fetches are always unbounded and rely on client-side filtering.
///
/// # Errors
///
/// Returns [`ReportError::Backend`] if the outlet list for a building or admin
/// cannot be loaded, and [`ReportError::AllFetchesFailed`] if every unit
/// failed.
pub async fn fetch_orders<S: OrderSource>(
    source: &S,
    scope: &ReportScope,
    window: Option<&DateWindow>,
) -> Result<FetchOutcome, ReportError> {
    let outcome = match scope {
        ReportScope::Stall(stall) => fetch_stalls(source, std::slice::from_ref(stall), window).await,
        ReportScope::Stalls(stalls) => fetch_stalls(source, stalls, window).await,
        ReportScope::Building(building_id) => {
            let stalls = source.building_stalls(*building_id).await?;
            tracing::debug!(building_id = %building_id, count = stalls.len(), "Resolved building outlets");
            fetch_stalls(source, &stall_refs(stalls), window).await
        }
        ReportScope::AdminStalls(admin_id) => {
            let stalls = source.admin_stalls(*admin_id).await?;
            tracing::debug!(admin_id = %admin_id, count = stalls.len(), "Resolved admin outlets");
            fetch_stalls(source, &stall_refs(stalls), window).await
        }
        ReportScope::Users(users) => fetch_users(source, users).await,
    };

    let (outcome, units) = outcome;
    if units > 0 && outcome.failed_units.len() == units {
        return Err(ReportError::AllFetchesFailed(outcome.failed_units));
    }
    Ok(outcome)
}

fn stall_refs(stalls: Vec<Stall>) -> Vec<StallRef> {
    stalls
        .into_iter()
        .map(|stall| StallRef::named(stall.id, stall.name))
        .collect()
}

async fn fetch_stalls<S: OrderSource>(
    source: &S,
    stalls: &[StallRef],
    window: Option<&DateWindow>,
) -> (FetchOutcome, usize) {
    let results = join_all(
        stalls
            .iter()
            .map(|stall| source.stall_orders(stall.id, window)),
    )
    .await;

    let units = stalls.len();
    let outcome = collect(
        stalls.iter().zip(results).map(|(stall, result)| {
            let label = stall.label();
            let tagged = result.map(|orders| {
                orders
                    .into_iter()
                    .map(|order| TaggedOrder {
                        label: stall
                            .name
                            .clone()
                            .or_else(|| order.stall_name.clone())
                            .unwrap_or_else(|| label.clone()),
                        order,
                    })
                    .collect()
            });
            (label, tagged)
        }),
    );
    (outcome, units)
}

async fn fetch_users<S: OrderSource>(source: &S, users: &[UserId]) -> (FetchOutcome, usize) {
    let results = join_all(users.iter().map(|user| source.user_orders(*user))).await;

    let units = users.len();
    let outcome = collect(users.iter().zip(results).map(|(user, result)| {
        let tagged = result.map(|orders| {
            orders
                .into_iter()
                .map(|order| TaggedOrder {
                    label: order
                        .stall_name
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_OUTLET.to_owned()),
                    order,
                })
                .collect()
        });
        (format!("user {user}"), tagged)
    }));
    (outcome, units)
}

fn collect(
    results: impl Iterator<Item = (String, Result<Vec<TaggedOrder>, BackendError>)>,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();
    for (unit, result) in results {
        match result {
            Ok(orders) => outcome.orders.extend(orders),
            Err(error) => {
                tracing::warn!(unit = %unit, error = %error, "Order fetch failed, treating as empty");
                outcome.failed_units.push(FetchError {
                    unit,
                    message: error.to_string(),
                });
            }
        }
    }
    outcome
}
