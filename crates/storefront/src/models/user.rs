//! User domain types.

use chrono::{DateTime, Utc};

use prostore_core::{Email, Role, ShippingAddress, UserId};

/// A registered customer or administrator.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Sign-in email, stored lowercased.
    pub email: Email,
    /// Access level.
    pub role: Role,
    /// Shipping address saved during checkout.
    pub address: Option<ShippingAddress>,
    /// Payment method saved during checkout, as stored.
    ///
    /// Kept as raw text so a value that no longer parses is reported as
    /// invalid at checkout instead of failing the whole user load.
    pub payment_method: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
