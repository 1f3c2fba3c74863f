//! Client-side order filtering by date window and purchaser company.
//!
//! Filtering is pure: the same inputs always produce the same subset, in the
//! same relative order, and applying a filter twice changes nothing.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use canteen_core::{COMPANY_UNKNOWN, company_key};

use crate::report::fetch::TaggedOrder;
use crate::report::window::DateWindow;

/// Restricts orders to one purchaser company.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompanyFilter {
    #[default]
    All,
    /// A lowercase company key, or `Unknown` for orders without a usable email.
    /// A bare name such as `cashe` also matches on the first domain label.
    Company(String),
}

impl CompanyFilter {
    #[must_use]
    pub fn matches(&self, order: &TaggedOrder) -> bool {
        match self {
            Self::All => true,
            Self::Company(key) => {
                let actual = company_key(order.order.user_email.as_deref());
                actual == *key || actual.split('.').next() == Some(key.as_str())
            }
        }
    }
}

impl FromStr for CompanyFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Ok(match key.as_str() {
            "" | "all" => Self::All,
            "unknown" => Self::Company(COMPANY_UNKNOWN.to_owned()),
            _ => Self::Company(key),
        })
    }
}

impl fmt::Display for CompanyFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Company(key) => f.write_str(key),
        }
    }
}

/// Keep the orders inside `window` (if any) that belong to `company`.
#[must_use]
pub fn filter_orders(
    orders: &[TaggedOrder],
    window: Option<&DateWindow>,
    company: &CompanyFilter,
) -> Vec<TaggedOrder> {
    orders
        .iter()
        .filter(|tagged| window.is_none_or(|w| w.contains(tagged.order.created_datetime)))
        .filter(|tagged| company.matches(tagged))
        .cloned()
        .collect()
}

/// Distinct company keys present in `orders`, sorted.
#[must_use]
pub fn companies(orders: &[TaggedOrder]) -> Vec<String> {
    orders
        .iter()
        .map(|tagged| company_key(tagged.order.user_email.as_deref()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
