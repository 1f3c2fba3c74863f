//! Typed request and response bodies for the canteen backend.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use canteen_core::{BuildingId, ItemId, OrderId, StallId};

use crate::report::window::DateWindow;

// =============================================================================
// Orders
// =============================================================================

/// One purchase transaction as returned by the order endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Backend-assigned identifier.
    pub id: OrderId,
    /// Queue/display token, unique per day per outlet.
    #[serde(deserialize_with = "string_or_number")]
    pub token_number: String,
    /// When the order was placed.
    #[serde(deserialize_with = "timestamp")]
    pub created_datetime: DateTime<Utc>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_phone: Option<String>,
    /// Line items, in the order the purchaser added them.
    #[serde(default)]
    pub order_details: Vec<LineItem>,
    /// Signed adjustment applied once per order.
    #[serde(default)]
    pub round_off: Option<Decimal>,
    #[serde(default)]
    pub total_gst: Option<Decimal>,
    #[serde(default)]
    pub cgst: Option<Decimal>,
    #[serde(default)]
    pub sgst: Option<Decimal>,
    /// Backend-computed pre-round-off total.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub paid_with_wallet: bool,
    #[serde(default)]
    pub stall_id: Option<StallId>,
    #[serde(default)]
    pub stall_name: Option<String>,
}

/// One item within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub item_id: Option<ItemId>,
    pub name: String,
    pub quantity: u32,
    /// Unit price.
    pub price: Decimal,
    /// Line total; normally `price * quantity`.
    #[serde(default)]
    pub total: Option<Decimal>,
    /// Item-level GST amount, when the backend supplies one.
    #[serde(default)]
    pub gst: Option<Decimal>,
}

impl LineItem {
    /// The line total, falling back to `price * quantity` when absent.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.total
            .unwrap_or_else(|| self.price * Decimal::from(self.quantity))
    }
}

// =============================================================================
// Outlets
// =============================================================================

/// A physical point of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stall {
    pub id: StallId,
    pub name: String,
    #[serde(default)]
    pub building_id: Option<BuildingId>,
    #[serde(default)]
    pub is_available: bool,
    /// Display string, e.g. "08:30 AM".
    #[serde(default)]
    pub opening_time: Option<String>,
    #[serde(default)]
    pub closing_time: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

/// Query parameters for `GET /orders/by-stall/{id}/range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
}

impl From<&DateWindow> for RangeQuery {
    fn from(window: &DateWindow) -> Self {
        Self {
            start_date: window.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_date: window.end.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

// =============================================================================
// Deserialization helpers
// =============================================================================

/// Accept RFC 3339 timestamps, or naive ones which are taken to be UTC.
fn timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_order_deserializes_backend_payload() {
        let payload = json!({
            "id": 501,
            "token_number": 17,
            "created_datetime": "2025-01-10T10:00:00Z",
            "user_email": "a@cashe.co",
            "order_details": [
                {"item_id": 3, "name": "Tea", "quantity": 2, "price": 10, "total": 20}
            ],
            "round_off": 0.4,
            "total_gst": 1.0,
            "cgst": 0.5,
            "sgst": 0.5,
            "paid_with_wallet": true
        });

        let order: Order = serde_json::from_value(payload).unwrap();
        assert_eq!(order.id.as_str(), "501");
        assert_eq!(order.token_number, "17");
        assert_eq!(
            order.created_datetime,
            Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap()
        );
        assert_eq!(order.round_off, Some(Decimal::new(4, 1)));
        assert!(order.paid_with_wallet);
        assert_eq!(order.user_phone, None);
        assert_eq!(order.order_details.first().unwrap().line_total(), Decimal::from(20));
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let parsed = parse_timestamp("2025-01-10T10:00:00.250").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-01-10T10:00:00.250+00:00");
        assert!(parse_timestamp("10/01/2025").is_none());
    }

    #[test]
    fn test_line_total_falls_back_to_price_times_quantity() {
        let item = LineItem {
            item_id: None,
            name: "Samosa".to_string(),
            quantity: 3,
            price: Decimal::new(1250, 2),
            total: None,
            gst: None,
        };
        assert_eq!(item.line_total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_range_query_uses_millisecond_utc() {
        let window = DateWindow {
            start: Utc.with_ymd_and_hms(2025, 1, 9, 18, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 1, 10, 18, 29, 59).unwrap(),
        };
        let query = RangeQuery::from(&window);
        assert_eq!(query.start_date, "2025-01-09T18:30:00.000Z");
        assert_eq!(query.end_date, "2025-01-10T18:29:59.000Z");
    }
}
