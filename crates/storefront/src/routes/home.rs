//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::db::ProductRepository;
use crate::filters;
use crate::routes::{PageContext, views::ProductCardView};
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCardView>,
}

/// Display the home page with the newest products.
///
/// A failed catalog query renders an empty grid rather than an error page.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> HomeTemplate {
    let products = ProductRepository::new(state.pool())
        .latest(state.config().latest_products_limit)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Loading latest products failed"))
        .unwrap_or_default();

    HomeTemplate {
        ctx,
        products: products.iter().map(ProductCardView::from).collect(),
    }
}
