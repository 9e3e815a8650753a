//! Order detail and order history.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use prostore_core::PaymentMethod;

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderSummary};
use crate::routes::PageContext;
use crate::routes::views::{
    AddressView, OrderItemView, PaginationView, PricesView, StatusView, number_param, table_date,
};
use crate::services::OrderService;
use crate::state::AppState;

/// Order display data for the detail page.
#[derive(Clone)]
pub struct OrderView {
    pub id: String,
    pub short_id: String,
    pub placed_at: String,
    pub customer_name: String,
    pub customer_email: String,
    pub address: AddressView,
    pub payment_method: String,
    pub paid: StatusView,
    pub delivered: StatusView,
    pub items: Vec<OrderItemView>,
    pub prices: PricesView,
    /// What happens next with payment, shown until the order is paid.
    pub payment_panel: Option<PaymentPanelView>,
}

/// Payment instructions for an unpaid order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentPanelView {
    pub heading: &'static str,
    pub message: &'static str,
    pub detail: &'static str,
}

impl PaymentPanelView {
    /// Panel for an unpaid order. Online payment is not taken yet, so card
    /// methods show a placeholder.
    #[must_use]
    pub const fn for_unpaid(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::PayPal => Self {
                heading: "PayPal Payment",
                message: "PayPal checkout coming soon",
                detail: "Your order is reserved and will be confirmed once payment is received.",
            },
            PaymentMethod::Stripe => Self {
                heading: "Credit/Debit Card Payment",
                message: "Card payments coming soon",
                detail: "Your order is reserved and will be confirmed once payment is received.",
            },
            PaymentMethod::CashOnDelivery => Self {
                heading: "Cash on Delivery",
                message: "Payment will be collected upon delivery.",
                detail: "Please have the exact amount ready when your order arrives.",
            },
        }
    }
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.id.short(),
            placed_at: prostore_core::format::format_date_time(order.created_at),
            customer_name: order.user_name.clone(),
            customer_email: order.user_email.to_string(),
            address: AddressView::from(&order.shipping_address),
            payment_method: order.payment_method.to_string(),
            paid: StatusView::new(order.is_paid, order.paid_at),
            delivered: StatusView::new(order.is_delivered, order.delivered_at),
            items: order.items.iter().map(OrderItemView::from).collect(),
            prices: PricesView::from(&order.prices),
            payment_panel: (!order.is_paid)
                .then(|| PaymentPanelView::for_unpaid(order.payment_method)),
        }
    }
}

/// A row in the order history table.
#[derive(Clone)]
pub struct OrderRowView {
    pub id: String,
    pub short_id: String,
    pub date: String,
    pub total: String,
    pub item_count: u32,
    pub paid: StatusView,
    pub delivered: StatusView,
}

impl From<&OrderSummary> for OrderRowView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.id.short(),
            date: table_date(order.created_at),
            total: order.total.to_string(),
            item_count: order.item_count,
            paid: StatusView::new(order.is_paid, order.paid_at),
            delivered: StatusView::new(order.is_delivered, order.delivered_at),
        }
    }
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub ctx: PageContext,
    pub order: OrderView,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/history.html")]
pub struct OrderHistoryTemplate {
    pub ctx: PageContext,
    pub orders: Vec<OrderRowView>,
    pub pagination: PaginationView,
}

/// Order history query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
}

/// Display one order to its owner or an administrator.
///
/// Anyone else gets the same 404 as for a missing order.
#[instrument(skip(state, ctx, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(id): Path<String>,
) -> Result<OrderShowTemplate> {
    let order = OrderService::new(state.pool())
        .get_for_viewer(&id, &user)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(OrderShowTemplate {
        ctx,
        order: OrderView::from(&order),
    })
}

/// Display the customer's orders, newest first.
#[instrument(skip(state, ctx, user))]
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Query(query): Query<HistoryQuery>,
) -> Result<OrderHistoryTemplate> {
    let page = OrderService::new(state.pool())
        .history(
            user.id,
            number_param(query.page.as_deref()),
            number_param(query.per_page.as_deref()),
        )
        .await?;

    let per_page = page.per_page;
    let pagination = PaginationView::new(&page, |n| {
        format!("/user/orders?page={n}&perPage={per_page}")
    });

    Ok(OrderHistoryTemplate {
        ctx,
        orders: page.items.iter().map(OrderRowView::from).collect(),
        pagination,
    })
}
