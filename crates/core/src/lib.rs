//! Prostore Core - Shared domain library.
//!
//! This crate provides the domain types and business rules used across all
//! Prostore components:
//! - `storefront` - Customer-facing shop and the admin back office
//! - `cli` - Command-line tools for migrations, seeding, and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Validation and pricing live here so the web layer and the
//! CLI apply the same rules.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money, emails, addresses, roles, and form validation
//! - [`pricing`] - Order price breakdown (items, shipping, tax, total)
//! - [`pagination`] - Page clamping and page-number windows
//! - [`format`] - Display helpers for IDs and dates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod pagination;
pub mod pricing;
pub mod types;

pub use types::*;
