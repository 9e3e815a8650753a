//! Aggregate queries for the admin dashboard.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use prostore_core::{Money, OrderId};

use super::{RepositoryError, to_count};
use crate::models::RecentOrder;

#[derive(Debug, sqlx::FromRow)]
struct RecentOrderRow {
    id: OrderId,
    user_name: String,
    user_email: String,
    total_price: Decimal,
    is_paid: bool,
    is_delivered: bool,
    created_at: DateTime<Utc>,
}

impl From<RecentOrderRow> for RecentOrder {
    fn from(row: RecentOrderRow) -> Self {
        Self {
            id: row.id,
            user_name: row.user_name,
            user_email: row.user_email,
            total: Money::new(row.total_price),
            is_paid: row.is_paid,
            is_delivered: row.is_delivered,
            created_at: row.created_at,
        }
    }
}

/// Paid sales summed per calendar month (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct MonthTotal {
    /// First instant of the month.
    pub month_start: DateTime<Utc>,
    pub total: Decimal,
}

/// Repository for dashboard aggregates.
pub struct StatsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StatsRepository<'a> {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Sum of paid order totals created in `[from, to)`. Open bounds are unbounded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn paid_revenue(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Money, RepositoryError> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r"
            SELECT SUM(total_price) FROM orders
            WHERE is_paid
              AND ($1::TIMESTAMPTZ IS NULL OR created_at >= $1)
              AND ($2::TIMESTAMPTZ IS NULL OR created_at < $2)
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?;

        Ok(Money::new(total.unwrap_or_default()))
    }

    /// Number of orders created in `[from, to)`. Open bounds are unbounded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_count(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM orders
            WHERE ($1::TIMESTAMPTZ IS NULL OR created_at >= $1)
              AND ($2::TIMESTAMPTZ IS NULL OR created_at < $2)
            ",
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?;

        Ok(to_count(count))
    }

    /// Paid totals per month for orders created on or after `since`.
    ///
    /// Months without paid orders are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_paid_sales(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthTotal>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthTotal>(
            r"
            SELECT date_trunc('month', created_at, 'UTC') AS month_start,
                   SUM(total_price) AS total
            FROM orders
            WHERE is_paid AND created_at >= $1
            GROUP BY 1
            ORDER BY 1
            ",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent orders with their customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_orders(&self, limit: u32) -> Result<Vec<RecentOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, RecentOrderRow>(
            r"
            SELECT o.id, u.name AS user_name, u.email AS user_email, o.total_price,
                   o.is_paid, o.is_delivered, o.created_at
            FROM orders o
            JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC, o.id
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
