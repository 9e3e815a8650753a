//! Customer order history and order detail.

use sqlx::PgPool;

use prostore_core::pagination::{Page, PageRequest};
use prostore_core::{OrderId, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{CurrentUser, Order, OrderSummary};

/// Orders shown per page in the customer's history.
pub const USER_ORDERS_PER_PAGE: u32 = 10;

/// Largest page size a customer can request.
pub const USER_ORDERS_MAX_PER_PAGE: u32 = 50;

/// Read access to orders for signed-in customers.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Load an order the viewer may see: their own, or any order for an admin.
    ///
    /// A malformed ID, a missing order, and someone else's order are all `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup fails.
    pub async fn get_for_viewer(
        &self,
        raw_id: &str,
        viewer: &CurrentUser,
    ) -> Result<Option<Order>, RepositoryError> {
        let Ok(id) = OrderId::parse(raw_id) else {
            return Ok(None);
        };

        let order = self.orders.get_by_id(id).await?;
        Ok(order.filter(|o| o.user_id == viewer.id || viewer.role.is_admin()))
    }

    /// One page of the customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    pub async fn history(
        &self,
        user_id: UserId,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> Result<Page<OrderSummary>, RepositoryError> {
        let request = PageRequest::new(
            page,
            per_page,
            USER_ORDERS_PER_PAGE,
            USER_ORDERS_MAX_PER_PAGE,
        );
        self.orders.list_for_user(user_id, request).await
    }
}
