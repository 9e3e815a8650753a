//! Admin back office: dashboard and order management.
//!
//! Every handler takes [`RequireAdmin`], which re-checks the role against
//! the database.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use chrono::Utc;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use prostore_core::OrderStatusFilter;

use crate::filters;
use crate::flash;
use crate::middleware::{RequireAdmin, safe_callback};
use crate::models::{AdminOrderSummary, MonthlySales, RecentOrder};
use crate::routes::PageContext;
use crate::routes::views::{PaginationView, StatusView, number_param, table_date};
use crate::services::AdminService;
use crate::services::admin::OrderQuery;
use crate::state::AppState;

const ORDERS_PATH: &str = "/admin/orders";

// =============================================================================
// Dashboard
// =============================================================================

/// One bar of the sales chart.
#[derive(Clone)]
pub struct SalesBarView {
    pub label: String,
    pub total: String,
    /// Bar length relative to the best month, 0 to 100.
    pub percent: u32,
}

impl SalesBarView {
    fn series(months: &[MonthlySales]) -> Vec<Self> {
        let best = months
            .iter()
            .map(|m| m.total.amount())
            .max()
            .unwrap_or(Decimal::ZERO);

        months
            .iter()
            .map(|m| {
                let percent = if best > Decimal::ZERO {
                    (m.total.amount() * Decimal::ONE_HUNDRED / best)
                        .round()
                        .to_u32()
                        .unwrap_or(0)
                } else {
                    0
                };
                Self {
                    label: format!("{} {}", m.month, m.year),
                    total: m.total.to_string(),
                    percent,
                }
            })
            .collect()
    }
}

/// A row in the recent orders card.
#[derive(Clone)]
pub struct RecentOrderView {
    pub id: String,
    pub short_id: String,
    pub customer: String,
    pub email: String,
    pub total: String,
    pub date: String,
    pub is_paid: bool,
    pub is_delivered: bool,
}

impl From<&RecentOrder> for RecentOrderView {
    fn from(order: &RecentOrder) -> Self {
        Self {
            id: order.id.to_string(),
            short_id: order.id.short(),
            customer: order.user_name.clone(),
            email: order.user_email.clone(),
            total: order.total.to_string(),
            date: table_date(order.created_at),
            is_paid: order.is_paid,
            is_delivered: order.is_delivered,
        }
    }
}

/// Growth figure with its sign for styling.
#[derive(Clone)]
pub struct GrowthView {
    pub text: String,
    pub negative: bool,
}

impl GrowthView {
    fn new(percent: i64) -> Self {
        Self {
            text: if percent > 0 {
                format!("+{percent}%")
            } else {
                format!("{percent}%")
            },
            negative: percent < 0,
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub total_revenue: String,
    pub total_orders: u64,
    pub total_products: u64,
    pub total_customers: u64,
    pub revenue_growth: GrowthView,
    pub orders_growth: GrowthView,
    pub sales: Vec<SalesBarView>,
    pub recent_orders: Vec<RecentOrderView>,
}

/// Display headline stats, the sales chart, and recent orders.
#[instrument(skip(state, ctx, admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ctx: PageContext,
) -> DashboardTemplate {
    let stats = AdminService::new(state.pool()).dashboard(Utc::now()).await;
    tracing::debug!(admin_id = %admin.id, "Dashboard viewed");

    DashboardTemplate {
        ctx,
        total_revenue: stats.total_revenue.to_string(),
        total_orders: stats.total_orders,
        total_products: stats.total_products,
        total_customers: stats.total_customers,
        revenue_growth: GrowthView::new(stats.revenue_growth),
        orders_growth: GrowthView::new(stats.orders_growth),
        sales: SalesBarView::series(&stats.monthly_sales),
        recent_orders: stats.recent_orders.iter().map(RecentOrderView::from).collect(),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Admin orders query string.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersParams {
    pub page: Option<String>,
    #[serde(rename = "perPage")]
    pub per_page: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl OrdersParams {
    fn to_query(&self) -> OrderQuery {
        OrderQuery {
            page: number_param(self.page.as_deref()),
            per_page: number_param(self.per_page.as_deref()),
            status: OrderStatusFilter::from_query(self.status.as_deref()),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        }
    }
}

/// Orders list URL for `page`, keeping the active filters.
fn orders_href(query: &OrderQuery, page: u32) -> String {
    let mut params = vec![format!("page={page}")];
    if let Some(status) = query.status {
        params.push(format!("status={}", status.as_str()));
    }
    if let Some(search) = &query.search {
        params.push(format!("search={}", urlencoding::encode(search)));
    }
    format!("{ORDERS_PATH}?{}", params.join("&"))
}

/// A row in the admin orders table.
#[derive(Clone)]
pub struct AdminOrderRowView {
    pub id: String,
    pub short_id: String,
    pub customer: String,
    pub email: String,
    pub date: String,
    pub total: String,
    pub payment_method: String,
    pub paid: StatusView,
    pub delivered: StatusView,
    pub can_mark_paid: bool,
    pub can_mark_delivered: bool,
}

impl From<&AdminOrderSummary> for AdminOrderRowView {
    fn from(order: &AdminOrderSummary) -> Self {
        let cod = order.payment_method.is_cash_on_delivery();
        Self {
            id: order.id.to_string(),
            short_id: order.id.short(),
            customer: order.user_name.clone(),
            email: order.user_email.clone(),
            date: table_date(order.created_at),
            total: order.total.to_string(),
            payment_method: order.payment_method.to_string(),
            paid: StatusView::new(order.is_paid, order.paid_at),
            delivered: StatusView::new(order.is_delivered, order.delivered_at),
            can_mark_paid: cod && !(order.is_paid && order.is_delivered),
            can_mark_delivered: !cod && !order.is_delivered,
        }
    }
}

/// Status filter dropdown entry.
#[derive(Clone)]
pub struct StatusOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Orders list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub ctx: PageContext,
    pub orders: Vec<AdminOrderRowView>,
    pub pagination: PaginationView,
    pub search: String,
    pub any_status_selected: bool,
    pub status_options: Vec<StatusOptionView>,
    /// This page's URL, so actions return here.
    pub current_url: String,
}

/// Display the filtered, paginated orders table.
#[instrument(skip(state, ctx, _admin))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ctx: PageContext,
    Query(params): Query<OrdersParams>,
) -> OrdersTemplate {
    let query = params.to_query();
    let page = AdminService::new(state.pool()).list_orders(&query).await;

    OrdersTemplate {
        ctx,
        orders: page.items.iter().map(AdminOrderRowView::from).collect(),
        pagination: PaginationView::new(&page, |n| orders_href(&query, n)),
        search: query.search.clone().unwrap_or_default(),
        any_status_selected: query.status.is_some(),
        status_options: OrderStatusFilter::ALL
            .into_iter()
            .map(|s| StatusOptionView {
                value: s.as_str(),
                label: s.label(),
                selected: query.status == Some(s),
            })
            .collect(),
        current_url: orders_href(&query, page.page),
    }
}

/// Order action form data.
#[derive(Debug, Default, Deserialize)]
pub struct OrderActionForm {
    pub return_to: Option<String>,
}

fn back_to_orders(form: &OrderActionForm) -> Redirect {
    let target = form
        .return_to
        .as_deref()
        .filter(|r| r.starts_with(ORDERS_PATH))
        .map_or_else(|| ORDERS_PATH.to_owned(), |r| safe_callback(Some(r)));
    Redirect::to(&target)
}

/// Delete an order and its items.
#[instrument(skip(state, session, admin))]
pub async fn delete_order(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderActionForm>,
) -> Redirect {
    match AdminService::new(state.pool()).delete_order(&id).await {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, order_id = %id, "Order deleted");
            flash::success(&session, "Order deleted").await;
        }
        Err(e) => flash::error(&session, e.to_string()).await,
    }
    back_to_orders(&form)
}

/// Mark a paid order as delivered.
#[instrument(skip(state, session, admin))]
pub async fn mark_delivered(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderActionForm>,
) -> Redirect {
    match AdminService::new(state.pool()).mark_delivered(&id).await {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, order_id = %id, "Order marked delivered");
            flash::success(&session, "Order marked as delivered").await;
        }
        Err(e) => flash::error(&session, e.to_string()).await,
    }
    back_to_orders(&form)
}

/// Mark a cash-on-delivery order as paid and delivered.
#[instrument(skip(state, session, admin))]
pub async fn mark_paid(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OrderActionForm>,
) -> Redirect {
    match AdminService::new(state.pool())
        .mark_paid_and_delivered(&id)
        .await
    {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, order_id = %id, "Order marked paid and delivered");
            flash::success(&session, "Order marked as paid and delivered").await;
        }
        Err(e) => flash::error(&session, e.to_string()).await,
    }
    back_to_orders(&form)
}

#[cfg(test)]
mod tests {
    use prostore_core::{Money, OrderId, PaymentMethod};

    use super::*;

    fn admin_row(
        payment_method: PaymentMethod,
        is_paid: bool,
        is_delivered: bool,
    ) -> AdminOrderRowView {
        AdminOrderRowView::from(&AdminOrderSummary {
            id: OrderId::new(),
            user_name: "Jane Doe".to_string(),
            user_email: "jane@example.com".to_string(),
            total: Money::from_cents(4_500),
            payment_method,
            is_paid,
            paid_at: is_paid.then(Utc::now),
            is_delivered,
            delivered_at: is_delivered.then(Utc::now),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn test_unpaid_card_orders_can_be_delivered() {
        let row = admin_row(PaymentMethod::PayPal, false, false);
        assert!(row.can_mark_delivered);
        assert!(!row.can_mark_paid);

        let row = admin_row(PaymentMethod::Stripe, true, true);
        assert!(!row.can_mark_delivered);
    }

    #[test]
    fn test_cash_on_delivery_orders_use_mark_paid() {
        let row = admin_row(PaymentMethod::CashOnDelivery, false, false);
        assert!(row.can_mark_paid);
        assert!(!row.can_mark_delivered);

        let row = admin_row(PaymentMethod::CashOnDelivery, true, true);
        assert!(!row.can_mark_paid);
    }

    fn month(name: &str, cents: i64) -> MonthlySales {
        MonthlySales {
            month: name.to_string(),
            year: 2024,
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_sales_bars_scale_to_best_month() {
        let bars = SalesBarView::series(&[month("Jan", 5000), month("Feb", 20000), month("Mar", 0)]);
        assert_eq!(bars[0].percent, 25);
        assert_eq!(bars[1].percent, 100);
        assert_eq!(bars[2].percent, 0);
        assert_eq!(bars[1].label, "Feb 2024");
        assert_eq!(bars[1].total, "$200.00");
    }

    #[test]
    fn test_sales_bars_all_zero() {
        let bars = SalesBarView::series(&[month("Jan", 0), month("Feb", 0)]);
        assert!(bars.iter().all(|b| b.percent == 0));
    }

    #[test]
    fn test_growth_view() {
        assert_eq!(GrowthView::new(25).text, "+25%");
        assert_eq!(GrowthView::new(0).text, "0%");
        let down = GrowthView::new(-40);
        assert_eq!(down.text, "-40%");
        assert!(down.negative);
    }

    #[test]
    fn test_orders_href_keeps_filters() {
        let query = OrdersParams {
            page: Some("2".to_string()),
            per_page: None,
            status: Some("paid".to_string()),
            search: Some("  jane doe ".to_string()),
        }
        .to_query();

        assert_eq!(query.search.as_deref(), Some("jane doe"));
        assert_eq!(
            orders_href(&query, 3),
            "/admin/orders?page=3&status=paid&search=jane%20doe"
        );
        assert_eq!(orders_href(&OrderQuery::default(), 1), "/admin/orders?page=1");
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let query = OrdersParams {
            page: Some("x".to_string()),
            per_page: None,
            status: Some("shipped".to_string()),
            search: Some("   ".to_string()),
        }
        .to_query();

        assert!(query.page.is_none());
        assert!(query.status.is_none());
        assert!(query.search.is_none());
    }

    #[test]
    fn test_back_to_orders_stays_in_admin() {
        let form = OrderActionForm {
            return_to: Some("https://evil.example".to_string()),
        };
        let response = axum::response::IntoResponse::into_response(back_to_orders(&form));
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some(ORDERS_PATH)
        );
    }
}
