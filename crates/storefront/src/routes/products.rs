//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use prostore_core::MAX_CART_QUANTITY;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CartSession;
use crate::models::{Cart, Product};
use crate::routes::PageContext;
use crate::services::CartService;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: String,
    pub images: Vec<String>,
    pub primary_image: String,
    pub rating: String,
    pub num_reviews: u32,
    pub in_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: product.price.to_string(),
            images: product.images.clone(),
            primary_image: product.primary_image().to_owned(),
            rating: format!("{:.1}", product.rating),
            num_reviews: product.num_reviews,
            in_stock: product.in_stock(),
        }
    }
}

/// The product's line in the visitor's cart.
#[derive(Clone)]
pub struct InCartView {
    pub item_id: String,
    pub quantity: u32,
    pub decrease_to: u32,
    pub increase_to: u32,
    pub can_increase: bool,
}

/// What the add-to-cart card offers.
#[derive(Clone)]
pub enum AddToCartView {
    OutOfStock,
    Add,
    InCart(InCartView),
}

impl AddToCartView {
    fn new(product: &Product, cart: Option<&Cart>) -> Self {
        if !product.in_stock() {
            return Self::OutOfStock;
        }

        let line = cart.and_then(|c| c.lines.iter().find(|l| l.product_id == product.id));
        match line {
            None => Self::Add,
            Some(line) => Self::InCart(InCartView {
                item_id: line.id.to_string(),
                quantity: line.quantity,
                decrease_to: line.quantity.saturating_sub(1),
                increase_to: line.quantity + 1,
                can_increase: line.quantity < MAX_CART_QUANTITY && line.quantity < product.stock,
            }),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub add_to_cart: AddToCartView,
    /// Where cart forms send the visitor back to.
    pub return_to: String,
}

/// Display a product by slug.
#[instrument(skip(state, ctx, cart))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    cart: CartSession,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = CartService::new(state.pool())
        .get_cart(cart.id())
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Loading cart for product page failed"))
        .ok()
        .flatten();

    Ok(ProductShowTemplate {
        ctx,
        add_to_cart: AddToCartView::new(&product, cart.as_ref()),
        return_to: format!("/product/{}", product.slug),
        product: ProductView::from(&product),
    })
}
