//! Back-office operations: the orders table, order actions, and dashboard figures.

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use prostore_core::pagination::{Page, PageRequest};
use prostore_core::{Money, OrderId, OrderStatusFilter};

use crate::db::stats::MonthTotal;
use crate::db::{
    OrderRepository, ProductRepository, RepositoryError, StatsRepository, UserRepository,
};
use crate::models::{AdminOrderSummary, DashboardStats, MonthlySales};

/// Orders shown per page in the admin table.
pub const ADMIN_ORDERS_PER_PAGE: u32 = 20;

/// Largest page size an admin can request.
pub const ADMIN_ORDERS_MAX_PER_PAGE: u32 = 100;

/// Months shown in the sales chart, current month included.
pub const SALES_CHART_MONTHS: u32 = 12;

/// Orders listed under "recent orders" on the dashboard.
pub const RECENT_ORDERS_LIMIT: u32 = 5;

/// Errors from admin order actions. `Display` is shown in the flash message.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Order not found")]
    OrderNotFound,

    #[error("This action is only for Cash on Delivery orders")]
    NotCashOnDelivery,

    #[error("Failed to delete order")]
    DeleteFailed,

    #[error("Failed to mark order as delivered")]
    DeliverFailed,

    #[error("Failed to update order status")]
    MarkPaidFailed,
}

/// Filters for the admin orders table, as read from the query string.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatusFilter>,
    /// Trimmed; `None` when blank.
    pub search: Option<String>,
}

/// Percent change from `previous` to `current`, rounded half up.
///
/// With no previous figure, any current activity counts as 100% growth.
#[must_use]
pub fn growth_percent(current: Decimal, previous: Decimal) -> i64 {
    if previous > Decimal::ZERO {
        let ratio = (current - previous) / previous * Decimal::ONE_HUNDRED;
        let rounded = (ratio + Decimal::new(5, 1)).floor();
        i64::try_from(rounded).unwrap_or(0)
    } else if current > Decimal::ZERO {
        100
    } else {
        0
    }
}

/// First instant of the month `back` months before the one containing `now`.
fn month_start(now: DateTime<Utc>, back: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.checked_sub_months(Months::new(back)))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |d| d.and_utc())
}

/// One entry per month for the last `months` months, oldest first.
///
/// Months without paid sales get a zero total.
#[must_use]
pub fn fill_monthly_sales(
    now: DateTime<Utc>,
    months: u32,
    totals: &[MonthTotal],
) -> Vec<MonthlySales> {
    (0..months)
        .rev()
        .map(|back| {
            let start = month_start(now, back);
            let total = totals
                .iter()
                .find(|t| t.month_start == start)
                .map_or(Money::ZERO, |t| Money::new(t.total));
            MonthlySales {
                month: start.format("%b").to_string(),
                year: start.year(),
                total,
            }
        })
        .collect()
}

/// Admin-only reads and order actions.
pub struct AdminService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    users: UserRepository<'a>,
    stats: StatsRepository<'a>,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            users: UserRepository::new(pool),
            stats: StatsRepository::new(pool),
        }
    }

    /// One page of all orders, newest first.
    ///
    /// A failed query logs and yields an empty first page.
    pub async fn list_orders(&self, query: &OrderQuery) -> Page<AdminOrderSummary> {
        let request = PageRequest::new(
            query.page,
            query.per_page,
            ADMIN_ORDERS_PER_PAGE,
            ADMIN_ORDERS_MAX_PER_PAGE,
        );

        match self
            .orders
            .list_admin(query.status, query.search.as_deref(), request)
            .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(error = %e, "Fetching admin orders failed");
                Page::new(Vec::new(), 0, request)
            }
        }
    }

    /// Delete an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `DeleteFailed` if the order is missing or the delete fails.
    pub async fn delete_order(&self, raw_id: &str) -> Result<(), AdminError> {
        let id = OrderId::parse(raw_id).map_err(|_| AdminError::DeleteFailed)?;
        self.orders.delete(id).await.map_err(|e| {
            tracing::error!(error = %e, order_id = %id, "Deleting order failed");
            AdminError::DeleteFailed
        })?;
        tracing::info!(order_id = %id, "Order deleted by admin");
        Ok(())
    }

    /// Mark an order delivered.
    ///
    /// # Errors
    ///
    /// Returns `DeliverFailed` if the order is missing or the update fails.
    pub async fn mark_delivered(&self, raw_id: &str) -> Result<(), AdminError> {
        let id = OrderId::parse(raw_id).map_err(|_| AdminError::DeliverFailed)?;
        self.orders.mark_delivered(id).await.map_err(|e| {
            tracing::error!(error = %e, order_id = %id, "Marking order delivered failed");
            AdminError::DeliverFailed
        })?;
        tracing::info!(order_id = %id, "Order marked as delivered by admin");
        Ok(())
    }

    /// Mark a cash-on-delivery order paid and delivered.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`, `NotCashOnDelivery`, or `MarkPaidFailed`.
    pub async fn mark_paid_and_delivered(&self, raw_id: &str) -> Result<(), AdminError> {
        let id = OrderId::parse(raw_id).map_err(|_| AdminError::OrderNotFound)?;

        let order = self
            .orders
            .get_by_id(id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, order_id = %id, "Loading order failed");
                AdminError::MarkPaidFailed
            })?
            .ok_or(AdminError::OrderNotFound)?;

        if !order.payment_method.is_cash_on_delivery() {
            return Err(AdminError::NotCashOnDelivery);
        }

        self.orders
            .mark_paid_and_delivered(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AdminError::OrderNotFound,
                other => {
                    tracing::error!(error = %other, order_id = %id, "Marking order paid failed");
                    AdminError::MarkPaidFailed
                }
            })?;
        tracing::info!(order_id = %id, "Order marked as paid and delivered by admin");
        Ok(())
    }

    /// Headline figures, sales chart, and recent orders.
    ///
    /// Each section that fails to load is logged and left at zero or empty.
    pub async fn dashboard(&self, now: DateTime<Utc>) -> DashboardStats {
        let mut stats = match self.headline(now).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "Fetching dashboard stats failed");
                DashboardStats::default()
            }
        };

        let since = month_start(now, SALES_CHART_MONTHS - 1);
        stats.monthly_sales = match self.stats.monthly_paid_sales(since).await {
            Ok(totals) => fill_monthly_sales(now, SALES_CHART_MONTHS, &totals),
            Err(e) => {
                tracing::error!(error = %e, "Fetching monthly sales failed");
                Vec::new()
            }
        };

        stats.recent_orders = self
            .stats
            .recent_orders(RECENT_ORDERS_LIMIT)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Fetching recent orders failed");
                Vec::new()
            });

        stats
    }

    async fn headline(&self, now: DateTime<Utc>) -> Result<DashboardStats, RepositoryError> {
        let current_start = month_start(now, 0);
        let previous_start = month_start(now, 1);

        let (
            total_revenue,
            current_revenue,
            previous_revenue,
            total_orders,
            current_orders,
            previous_orders,
            total_products,
            total_customers,
        ) = tokio::try_join!(
            self.stats.paid_revenue(None, None),
            self.stats.paid_revenue(Some(current_start), None),
            self.stats.paid_revenue(Some(previous_start), Some(current_start)),
            self.stats.order_count(None, None),
            self.stats.order_count(Some(current_start), None),
            self.stats.order_count(Some(previous_start), Some(current_start)),
            self.products.count(),
            self.users.count(),
        )?;

        Ok(DashboardStats {
            total_revenue,
            total_orders,
            total_products,
            total_customers,
            revenue_growth: growth_percent(current_revenue.amount(), previous_revenue.amount()),
            orders_growth: growth_percent(
                Decimal::from(current_orders),
                Decimal::from(previous_orders),
            ),
            monthly_sales: Vec::new(),
            recent_orders: Vec::new(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_growth_percent() {
        assert_eq!(growth_percent(Decimal::from(150), Decimal::from(100)), 50);
        assert_eq!(growth_percent(Decimal::from(50), Decimal::from(100)), -50);
        assert_eq!(growth_percent(Decimal::from(2), Decimal::from(3)), -33);
    }

    #[test]
    fn test_growth_percent_rounds_half_up() {
        // +12.5% and -12.5%
        assert_eq!(growth_percent(Decimal::from(225), Decimal::from(200)), 13);
        assert_eq!(growth_percent(Decimal::from(175), Decimal::from(200)), -12);
    }

    #[test]
    fn test_growth_percent_without_previous() {
        assert_eq!(growth_percent(Decimal::from(10), Decimal::ZERO), 100);
        assert_eq!(growth_percent(Decimal::ZERO, Decimal::ZERO), 0);
    }

    #[test]
    fn test_month_start_crosses_year() {
        let now = at(2024, 2, 15);
        assert_eq!(month_start(now, 0), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(month_start(now, 2), Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(month_start(now, 11), Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_fill_monthly_sales_zero_fills() {
        let now = at(2024, 3, 31);
        let totals = [
            MonthTotal {
                month_start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                total: Decimal::new(12_550, 2),
            },
            MonthTotal {
                month_start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
                total: Decimal::new(4_000, 2),
            },
        ];

        let months = fill_monthly_sales(now, 12, &totals);

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, "Apr");
        assert_eq!(months[0].year, 2023);
        assert_eq!(months[9].month, "Jan");
        assert_eq!(months[9].total, Money::from_cents(12_550));
        assert_eq!(months[10].month, "Feb");
        assert_eq!(months[10].total, Money::ZERO);
        assert_eq!(months[11].month, "Mar");
        assert_eq!(months[11].total, Money::from_cents(4_000));
    }

    #[test]
    fn test_admin_error_messages() {
        assert_eq!(AdminError::OrderNotFound.to_string(), "Order not found");
        assert_eq!(
            AdminError::NotCashOnDelivery.to_string(),
            "This action is only for Cash on Delivery orders"
        );
        assert_eq!(AdminError::DeleteFailed.to_string(), "Failed to delete order");
    }
}
