//! Admin dashboard figures.

use chrono::{DateTime, Utc};

use prostore_core::{Money, OrderId};

/// Paid sales for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlySales {
    /// Short month name, e.g. `Jan`.
    pub month: String,
    pub year: i32,
    pub total: Money,
}

/// A recent order shown on the dashboard.
#[derive(Debug, Clone)]
pub struct RecentOrder {
    pub id: OrderId,
    pub user_name: String,
    pub user_email: String,
    pub total: Money,
    pub is_paid: bool,
    pub is_delivered: bool,
    pub created_at: DateTime<Utc>,
}

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardStats {
    /// Sum of paid order totals, all time.
    pub total_revenue: Money,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    /// Percent change in paid revenue, this month vs last.
    pub revenue_growth: i64,
    /// Percent change in order count, this month vs last.
    pub orders_growth: i64,
    /// Oldest month first, twelve entries.
    pub monthly_sales: Vec<MonthlySales>,
    pub recent_orders: Vec<RecentOrder>,
}
