//! Core types for Prostore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod validation;

pub use address::{AddressError, DEFAULT_COUNTRY, ShippingAddress};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
pub use validation::*;
