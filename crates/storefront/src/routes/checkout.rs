//! Checkout route handlers.
//!
//! Steps run in order: shipping, payment, review. Each page checks the
//! earlier steps and sends the customer back to the first one missing.

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

use prostore_core::{PaymentMethod, ShippingAddress};

use crate::error::AppError;
use crate::filters;
use crate::flash;
use crate::middleware::{CartSession, RequireAuth, sign_in_url};
use crate::models::User;
use crate::routes::PageContext;
use crate::routes::views::{AddressView, CartLineView, PricesView};
use crate::services::checkout::require_payment_method;
use crate::services::{AuthError, AuthService, CheckoutError, CheckoutService};
use crate::state::AppState;

const SHIPPING_PATH: &str = "/checkout/shipping";
const PAYMENT_PATH: &str = "/checkout/payment";
const REVIEW_PATH: &str = "/checkout/place-order";

/// Turn a failed prerequisite into the page the customer should see.
fn step_failure(err: &CheckoutError, path: &str) -> Response {
    if let Some(target) = err.redirect_target() {
        return Redirect::to(target).into_response();
    }
    match err {
        CheckoutError::NotSignedIn | CheckoutError::UserNotFound => {
            Redirect::to(&sign_in_url(path)).into_response()
        }
        other => AppError::Internal(other.to_string()).into_response(),
    }
}

/// Shipping form values, prefilled from the saved address.
#[derive(Clone, Default, Deserialize)]
pub struct ShippingForm {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

impl ShippingForm {
    fn for_user(user: &User) -> Self {
        match &user.address {
            Some(a) => Self {
                full_name: a.full_name.clone(),
                address: a.address.clone(),
                city: a.city.clone(),
                state: a.state.clone(),
                postal_code: a.postal_code.clone(),
                country: a.country.clone(),
            },
            None => Self {
                full_name: user.name.clone(),
                country: prostore_core::DEFAULT_COUNTRY.to_owned(),
                ..Self::default()
            },
        }
    }
}

/// Shipping step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub ctx: PageContext,
    pub step: u8,
    pub form: ShippingForm,
}

/// One radio option on the payment step.
#[derive(Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Payment step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub ctx: PageContext,
    pub step: u8,
    pub options: Vec<PaymentOption>,
}

/// Review step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/place_order.html")]
pub struct ReviewTemplate {
    pub ctx: PageContext,
    pub step: u8,
    pub address: AddressView,
    pub payment_method: String,
    pub lines: Vec<CartLineView>,
    pub prices: PricesView,
}

/// Display the shipping address form.
#[instrument(skip(state, ctx, user))]
pub async fn shipping(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Response {
    match AuthService::new(state.pool()).get_user(user.id).await {
        Ok(user) => ShippingTemplate {
            ctx,
            step: 2,
            form: ShippingForm::for_user(&user),
        }
        .into_response(),
        Err(AuthError::UserNotFound) => Redirect::to(&sign_in_url(SHIPPING_PATH)).into_response(),
        Err(e) => AppError::Internal(format!("Loading checkout user failed: {e:?}")).into_response(),
    }
}

/// Validate and save the shipping address.
#[instrument(skip(state, session, user, form))]
pub async fn save_shipping(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Redirect {
    let address = match ShippingAddress::parse(
        &form.full_name,
        &form.address,
        &form.city,
        &form.state,
        &form.postal_code,
        &form.country,
    ) {
        Ok(address) => address,
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            return Redirect::to(SHIPPING_PATH);
        }
    };

    match CheckoutService::new(state.pool())
        .save_address(user.id, &address)
        .await
    {
        Ok(()) => Redirect::to(PAYMENT_PATH),
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            Redirect::to(SHIPPING_PATH)
        }
    }
}

/// Display the payment method choice.
#[instrument(skip(state, ctx, user))]
pub async fn payment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Response {
    let user = match CheckoutService::new(state.pool()).payment_step(user.id).await {
        Ok(user) => user,
        Err(e) => return step_failure(&e, PAYMENT_PATH),
    };

    let current = require_payment_method(&user).unwrap_or_default();
    let options = PaymentMethod::ALL
        .into_iter()
        .map(|m| PaymentOption {
            value: m.as_str(),
            selected: m == current,
        })
        .collect();

    PaymentTemplate {
        ctx,
        step: 3,
        options,
    }
    .into_response()
}

/// Payment form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    #[serde(rename = "paymentMethod", default)]
    pub payment_method: String,
}

/// Validate and save the payment method.
#[instrument(skip(state, session, user))]
pub async fn save_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Response {
    let service = CheckoutService::new(state.pool());
    if let Err(e) = service.payment_step(user.id).await {
        return step_failure(&e, PAYMENT_PATH);
    }

    match service
        .save_payment_method(user.id, &form.payment_method)
        .await
    {
        Ok(_) => Redirect::to(REVIEW_PATH).into_response(),
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            Redirect::to(PAYMENT_PATH).into_response()
        }
    }
}

/// Display the order review with recalculated prices.
#[instrument(skip(state, ctx, user, cart))]
pub async fn review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    cart: CartSession,
) -> Response {
    let review = match CheckoutService::new(state.pool())
        .review(user.id, cart.id())
        .await
    {
        Ok(review) => review,
        Err(e) => return step_failure(&e, REVIEW_PATH),
    };

    ReviewTemplate {
        ctx,
        step: 4,
        address: AddressView::from(&review.address),
        payment_method: review.payment_method.to_string(),
        lines: review.cart.lines.iter().map(CartLineView::from).collect(),
        prices: PricesView::from(&review.prices),
    }
    .into_response()
}

/// Place the order and show it.
#[instrument(skip(state, session, user, cart))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    cart: CartSession,
) -> Redirect {
    match CheckoutService::new(state.pool())
        .place_order(Some(user.id), cart.id())
        .await
    {
        Ok(order_id) => {
            flash::success(&session, "Order placed").await;
            Redirect::to(&format!("/orders/{order_id}"))
        }
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            Redirect::to(e.redirect_target().unwrap_or(REVIEW_PATH))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{StatusCode, header};

    use super::*;

    fn location(response: &Response) -> Option<&str> {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_step_failure_redirects_to_missing_step() {
        let response = step_failure(&CheckoutError::MissingAddress, REVIEW_PATH);
        assert_eq!(location(&response), Some(SHIPPING_PATH));

        let response = step_failure(&CheckoutError::InvalidPaymentMethod, REVIEW_PATH);
        assert_eq!(location(&response), Some(PAYMENT_PATH));

        let response = step_failure(&CheckoutError::EmptyCart, REVIEW_PATH);
        assert_eq!(location(&response), Some("/cart"));
    }

    #[test]
    fn test_step_failure_unknown_user_signs_in_again() {
        let response = step_failure(&CheckoutError::UserNotFound, PAYMENT_PATH);
        assert_eq!(
            location(&response),
            Some("/sign-in?callbackUrl=%2Fcheckout%2Fpayment")
        );
    }

    #[test]
    fn test_step_failure_internal() {
        let response = step_failure(&CheckoutError::OrderFailed, REVIEW_PATH);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
