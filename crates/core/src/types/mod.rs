//! Core types for the canteen platform.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod role;

pub use email::{COMPANY_UNKNOWN, Email, EmailError, company_key};
pub use id::*;
pub use money::{CurrencyCode, Money, format_amount, round_currency};
pub use role::{Role, RoleParseError};
