//! Canteen Core - Shared types library.
//!
//! This crate provides common types used across all canteen components:
//! - `reports` - Order fetching, filtering, aggregation and export
//! - `cli` - Command-line front end for running reports
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
