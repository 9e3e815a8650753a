//! Cart route handlers.
//!
//! Every mutation is a plain form POST that stores a flash message and
//! redirects. The cart cookie rides along on the redirect when a new cart
//! session was issued.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::flash;
use crate::middleware::{CartSession, OptionalAuth, safe_callback};
use crate::routes::{PageContext, views::CartLineView};
use crate::services::CartService;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
    pub return_to: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: String,
    pub quantity: String,
    pub return_to: Option<String>,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: String,
}

/// Display the cart.
#[instrument(skip(state, ctx, cart))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    cart: CartSession,
) -> CartShowTemplate {
    let cart = CartService::new(state.pool())
        .get_cart(cart.id())
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Loading cart failed"))
        .ok()
        .flatten();

    match cart {
        Some(cart) => CartShowTemplate {
            ctx,
            lines: cart.lines.iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal().to_string(),
        },
        None => CartShowTemplate {
            ctx,
            lines: Vec::new(),
            item_count: 0,
            subtotal: prostore_core::Money::ZERO.to_string(),
        },
    }
}

/// Add units of a product, creating the cart on first use.
#[instrument(skip(state, cart, session, user))]
pub async fn add(
    State(state): State<AppState>,
    mut cart: CartSession,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let session_id = cart.ensure();
    let quantity = form.quantity.as_deref().unwrap_or("1");

    match CartService::new(state.pool())
        .add_item(
            session_id,
            user.map(|u| u.id),
            &form.product_id,
            quantity,
        )
        .await
    {
        Ok(_) => flash::success(&session, "Added to cart").await,
        Err(e) => flash::error(&session, e.to_string()).await,
    }

    let back = form
        .return_to
        .map_or_else(|| "/cart".to_owned(), |r| safe_callback(Some(&r)));
    (cart, Redirect::to(&back)).into_response()
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(state, cart, session))]
pub async fn update(
    State(state): State<AppState>,
    cart: CartSession,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Redirect {
    match CartService::new(state.pool())
        .update_item(cart.id(), &form.item_id, &form.quantity)
        .await
    {
        Ok(()) => flash::success(&session, "Cart updated").await,
        Err(e) => flash::error(&session, e.to_string()).await,
    }

    let back = form
        .return_to
        .map_or_else(|| "/cart".to_owned(), |r| safe_callback(Some(&r)));
    Redirect::to(&back)
}

/// Remove one line.
#[instrument(skip(state, cart, session))]
pub async fn remove(
    State(state): State<AppState>,
    cart: CartSession,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Redirect {
    match CartService::new(state.pool())
        .remove_item(cart.id(), &form.item_id)
        .await
    {
        Ok(()) => flash::success(&session, "Item removed from cart").await,
        Err(e) => flash::error(&session, e.to_string()).await,
    }
    Redirect::to("/cart")
}

/// Empty the cart.
#[instrument(skip(state, cart, session))]
pub async fn clear(State(state): State<AppState>, cart: CartSession, session: Session) -> Redirect {
    match CartService::new(state.pool()).clear(cart.id()).await {
        Ok(()) => flash::success(&session, "Cart cleared").await,
        Err(e) => flash::error(&session, e.to_string()).await,
    }
    Redirect::to("/cart")
}
