//! Sales totals, row expansion and grouped summaries.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;

use canteen_core::{OrderId, round_currency};

use crate::backend::Order;
use crate::error::ReportError;
use crate::report::fetch::TaggedOrder;

/// Display format for order timestamps, in the report's local offset.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

/// How report rows are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Ascending by order creation time.
    #[default]
    Date,
    /// Ascending by outlet label.
    Outlet,
}

impl FromStr for SortKey {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "date" => Ok(Self::Date),
            "outlet" | "stall" => Ok(Self::Outlet),
            other => Err(ReportError::InvalidOption(format!(
                "unknown sort key '{other}', expected 'date' or 'outlet'"
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date => f.write_str("date"),
            Self::Outlet => f.write_str("outlet"),
        }
    }
}

/// One (order, line item) pair, flattened for display and export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub order_id: OrderId,
    pub outlet: String,
    pub token: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// `created_at` on the report's local clock.
    pub date_display: String,
    pub item_name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub line_total: Decimal,
    pub gst: Option<Decimal>,
    /// Present on the first row of an order only.
    pub round_off: Option<Decimal>,
    /// Present on the first row of an order only.
    pub total_paid: Option<Decimal>,
    pub is_first_row_of_order: bool,
}

/// Per-order totals, in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTotal {
    pub order_id: OrderId,
    pub outlet: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub paid_with_wallet: bool,
    pub total_paid: Decimal,
}

/// Result of aggregating a filtered order set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Aggregation {
    pub rows: Vec<ReportRow>,
    pub orders: Vec<OrderTotal>,
    /// Sum of every order's total paid, each order counted once.
    pub grand_total: Decimal,
    pub wallet_total: Decimal,
    pub other_total: Decimal,
}

impl Aggregation {
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// What the purchaser paid: line totals plus round-off, rounded to paise.
#[must_use]
pub fn total_paid(order: &Order) -> Decimal {
    let items: Decimal = order.order_details.iter().map(|line| line.line_total()).sum();
    round_currency(items + order.round_off.unwrap_or_default())
}

/// Sort `orders` (stably) and expand them into report rows.
#[must_use]
pub fn aggregate(orders: &[TaggedOrder], sort: SortKey, offset: FixedOffset) -> Aggregation {
    let mut sorted: Vec<&TaggedOrder> = orders.iter().collect();
    match sort {
        SortKey::Date => sorted.sort_by_key(|tagged| tagged.order.created_datetime),
        SortKey::Outlet => sorted.sort_by(|a, b| a.label.cmp(&b.label)),
    }

    let mut aggregation = Aggregation::default();
    for tagged in sorted {
        let order = &tagged.order;
        let paid = total_paid(order);

        aggregation.grand_total += paid;
        if order.paid_with_wallet {
            aggregation.wallet_total += paid;
        } else {
            aggregation.other_total += paid;
        }

        aggregation.rows.extend(expand(tagged, paid, offset));
        aggregation.orders.push(OrderTotal {
            order_id: order.id.clone(),
            outlet: tagged.label.clone(),
            token: order.token_number.clone(),
            created_at: order.created_datetime,
            paid_with_wallet: order.paid_with_wallet,
            total_paid: paid,
        });
    }
    aggregation
}

fn expand(tagged: &TaggedOrder, paid: Decimal, offset: FixedOffset) -> Vec<ReportRow> {
    let order = &tagged.order;
    let date_display = order
        .created_datetime
        .with_timezone(&offset)
        .format(DATE_DISPLAY_FORMAT)
        .to_string();
    let email = order
        .user_email
        .clone()
        .or_else(|| order.user_phone.clone())
        .unwrap_or_default();

    let row = |first: bool| ReportRow {
        order_id: order.id.clone(),
        outlet: tagged.label.clone(),
        token: order.token_number.clone(),
        email: email.clone(),
        created_at: order.created_datetime,
        date_display: date_display.clone(),
        item_name: String::new(),
        quantity: 0,
        price: Decimal::ZERO,
        line_total: Decimal::ZERO,
        gst: None,
        round_off: first.then(|| order.round_off.unwrap_or_default()),
        total_paid: first.then_some(paid),
        is_first_row_of_order: first,
    };

    // An order without items still has to carry its total.
    if order.order_details.is_empty() {
        return vec![row(true)];
    }

    order
        .order_details
        .iter()
        .enumerate()
        .map(|(index, line)| ReportRow {
            item_name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            line_total: line.line_total(),
            gst: line.gst,
            ..row(index == 0)
        })
        .collect()
}

/// Totals for one group of orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummary<K> {
    pub key: K,
    pub order_count: usize,
    pub item_count: u64,
    pub total_paid: Decimal,
}

/// Totals per outlet label, sorted by label.
#[must_use]
pub fn summarize_by_outlet(orders: &[TaggedOrder]) -> Vec<GroupSummary<String>> {
    summarize(orders, |tagged| tagged.label.clone())
}

/// Totals per local calendar day, oldest first.
#[must_use]
pub fn summarize_by_day(orders: &[TaggedOrder], offset: FixedOffset) -> Vec<GroupSummary<NaiveDate>> {
    summarize(orders, |tagged| {
        tagged.order.created_datetime.with_timezone(&offset).date_naive()
    })
}

fn summarize<K: Ord + Clone>(
    orders: &[TaggedOrder],
    key_of: impl Fn(&TaggedOrder) -> K,
) -> Vec<GroupSummary<K>> {
    let mut groups: BTreeMap<K, GroupSummary<K>> = BTreeMap::new();
    for tagged in orders {
        let key = key_of(tagged);
        let group = groups.entry(key.clone()).or_insert_with(|| GroupSummary {
            key,
            order_count: 0,
            item_count: 0,
            total_paid: Decimal::ZERO,
        });
        group.order_count += 1;
        group.item_count += tagged
            .order
            .order_details
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum::<u64>();
        group.total_paid += total_paid(&tagged.order);
    }
    groups.into_values().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::report::fetch::tests::order;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    /// Tea x2 with +0.40 round-off and Coffee x1 with -0.10 round-off.
    pub(crate) fn tea_and_coffee() -> Vec<TaggedOrder> {
        let mut a = order("A", "T1", 10, "a@cashe.co", &[("Tea", 2, 10)]);
        a.round_off = Some(dec("0.40"));
        a.paid_with_wallet = true;
        let mut b = order("B", "T2", 11, "b@other.com", &[("Coffee", 1, 15)]);
        b.round_off = Some(dec("-0.10"));
        vec![
            TaggedOrder {
                label: "Chai Point".to_owned(),
                order: b,
            },
            TaggedOrder {
                label: "Brew Bar".to_owned(),
                order: a,
            },
        ]
    }

    #[test]
    fn test_two_order_scenario() {
        let aggregation = aggregate(&tea_and_coffee(), SortKey::Date, utc());

        assert_eq!(aggregation.rows.len(), 2);
        let totals: Vec<Decimal> = aggregation.orders.iter().map(|o| o.total_paid).collect();
        assert_eq!(totals, vec![dec("20.40"), dec("14.90")]);
        assert_eq!(aggregation.grand_total, dec("35.30"));
        assert_eq!(aggregation.wallet_total, dec("20.40"));
        assert_eq!(aggregation.other_total, dec("14.90"));
        assert_eq!(aggregation.rows.first().unwrap().token, "T1");
        assert_eq!(aggregation.rows.first().unwrap().date_display, "10/01/2025 10:00");
    }

    #[test]
    fn test_total_paid_rounds_half_away_from_zero() {
        let mut o = order("X", "T1", 9, "a@x.com", &[("Samosa", 3, 7)]);
        o.round_off = Some(dec("0.005"));
        assert_eq!(total_paid(&o), dec("21.01"));
        o.round_off = Some(dec("-21.005"));
        assert_eq!(total_paid(&o), dec("-0.01"));
    }

    #[test]
    fn test_round_off_and_total_only_on_first_row() {
        let mut multi = order("M", "T5", 9, "a@x.com", &[("Tea", 1, 10), ("Vada", 2, 15), ("Idli", 1, 30)]);
        multi.round_off = Some(dec("0.25"));
        let tagged = vec![TaggedOrder {
            label: "Alpha".to_owned(),
            order: multi,
        }];

        let aggregation = aggregate(&tagged, SortKey::Date, utc());
        let firsts: Vec<bool> = aggregation.rows.iter().map(|r| r.is_first_row_of_order).collect();
        assert_eq!(firsts, vec![true, false, false]);

        let shown: Decimal = aggregation.rows.iter().filter_map(|r| r.total_paid).sum();
        assert_eq!(shown, aggregation.grand_total);
        assert_eq!(aggregation.grand_total, dec("70.25"));
        assert!(aggregation.rows.iter().skip(1).all(|r| r.round_off.is_none()));
    }

    #[test]
    fn test_grand_total_counts_each_order_once() {
        let mut orders = tea_and_coffee();
        orders.push(TaggedOrder {
            label: "Alpha".to_owned(),
            order: order("C", "T3", 12, "c@x.com", &[("Tea", 1, 10), ("Coffee", 1, 15)]),
        });
        let aggregation = aggregate(&orders, SortKey::Outlet, utc());
        let expected: Decimal = orders.iter().map(|t| total_paid(&t.order)).sum();
        assert_eq!(aggregation.grand_total, expected);
        assert_eq!(aggregation.order_count(), 3);
        assert_eq!(aggregation.rows.len(), 4);
    }

    #[test]
    fn test_outlet_sort_is_stable() {
        let tagged = |id: &str, label: &str| TaggedOrder {
            label: label.to_owned(),
            order: order(id, id, 9, "a@x.com", &[("Tea", 1, 10)]),
        };
        let orders = vec![
            tagged("1", "Bravo"),
            tagged("2", "Alpha"),
            tagged("3", "Bravo"),
            tagged("4", "Alpha"),
        ];
        let aggregation = aggregate(&orders, SortKey::Outlet, utc());
        let ids: Vec<&str> = aggregation.orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_date_sort_ties_keep_fetch_order() {
        let orders: Vec<TaggedOrder> = ["x", "y", "z"]
            .iter()
            .map(|id| TaggedOrder {
                label: "Alpha".to_owned(),
                order: order(id, id, 9, "a@x.com", &[("Tea", 1, 10)]),
            })
            .collect();
        let aggregation = aggregate(&orders, SortKey::Date, utc());
        let ids: Vec<&str> = aggregation.orders.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_order_without_items_keeps_its_total() {
        let mut empty = order("E", "T9", 9, "a@x.com", &[]);
        empty.round_off = Some(dec("1.00"));
        let aggregation = aggregate(
            &[TaggedOrder {
                label: "Alpha".to_owned(),
                order: empty,
            }],
            SortKey::Date,
            utc(),
        );
        assert_eq!(aggregation.rows.len(), 1);
        assert_eq!(aggregation.rows.first().unwrap().total_paid, Some(dec("1.00")));
    }

    #[test]
    fn test_date_display_uses_offset() {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let aggregation = aggregate(&tea_and_coffee(), SortKey::Date, ist);
        assert_eq!(aggregation.rows.first().unwrap().date_display, "10/01/2025 15:30");
    }

    #[test]
    fn test_summaries_add_up_to_grand_total() {
        let mut orders = tea_and_coffee();
        let mut late = order("D", "T1", 20, "d@x.com", &[("Tea", 3, 10)]);
        late.created_datetime = Utc.with_ymd_and_hms(2025, 1, 11, 20, 0, 0).unwrap();
        orders.push(TaggedOrder {
            label: "Chai Point".to_owned(),
            order: late,
        });
        let grand_total = aggregate(&orders, SortKey::Date, utc()).grand_total;

        let by_outlet = summarize_by_outlet(&orders);
        let labels: Vec<&str> = by_outlet.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(labels, vec!["Brew Bar", "Chai Point"]);
        assert_eq!(by_outlet.get(1).unwrap().order_count, 2);
        assert_eq!(by_outlet.get(1).unwrap().item_count, 4);
        assert_eq!(by_outlet.iter().map(|g| g.total_paid).sum::<Decimal>(), grand_total);

        let by_day = summarize_by_day(&orders, utc());
        assert_eq!(by_day.len(), 2);
        assert_eq!(by_day.first().unwrap().key, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(by_day.iter().map(|g| g.total_paid).sum::<Decimal>(), grand_total);
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Outlet".parse::<SortKey>().unwrap(), SortKey::Outlet);
        assert_eq!("stall".parse::<SortKey>().unwrap(), SortKey::Outlet);
        assert_eq!("".parse::<SortKey>().unwrap(), SortKey::Date);
        assert!(matches!("price".parse::<SortKey>(), Err(ReportError::InvalidOption(_))));
    }
}
