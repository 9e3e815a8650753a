//! Role, payment method, and order status enums.

use serde::{Deserialize, Serialize};

/// User role. Admins can reach the back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular customer.
    #[default]
    User,
    /// Store administrator.
    Admin,
}

impl Role {
    /// Whether this role grants back-office access.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Error returned when a payment method name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Please select a valid payment method")]
pub struct PaymentMethodError;

/// How the customer intends to pay.
///
/// Stored as its display name (`PayPal`, `Stripe`, `Cash on Delivery`), both
/// on the user (saved preference) and on each order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "PayPal")]
    PayPal,
    #[serde(rename = "Stripe")]
    Stripe,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    /// Every selectable method, in display order.
    pub const ALL: [Self; 3] = [Self::PayPal, Self::Stripe, Self::CashOnDelivery];

    /// The stored and displayed name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Stripe => "Stripe",
            Self::CashOnDelivery => "Cash on Delivery",
        }
    }

    /// Only cash-on-delivery orders may be marked paid by an admin.
    #[must_use]
    pub const fn is_cash_on_delivery(self) -> bool {
        matches!(self, Self::CashOnDelivery)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = PaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or(PaymentMethodError)
    }
}

/// Admin order-list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusFilter {
    /// `is_paid = true`
    Paid,
    /// `is_paid = false`
    Unpaid,
    /// `is_delivered = true`
    Delivered,
    /// `is_delivered = false`
    Pending,
}

impl OrderStatusFilter {
    /// Every filter, in the order shown in the filter bar.
    pub const ALL: [Self; 4] = [Self::Paid, Self::Unpaid, Self::Delivered, Self::Pending];

    /// Query-string value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
            Self::Delivered => "delivered",
            Self::Pending => "pending",
        }
    }

    /// Label for the filter bar.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Unpaid => "Unpaid",
            Self::Delivered => "Delivered",
            Self::Pending => "Pending",
        }
    }

    /// Parse a query-string value. Unknown or empty values mean "all orders".
    #[must_use]
    pub fn from_query(s: Option<&str>) -> Option<Self> {
        let s = s?.trim();
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

impl std::fmt::Display for OrderStatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
