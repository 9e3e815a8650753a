//! Authentication route handlers.
//!
//! Email and password sign-in, sign-up, and sign-out. Both sign-in and
//! sign-up finish by attaching the visitor's cart to the account and
//! returning to `callbackUrl`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::flash;
use crate::middleware::{
    CartSession, OptionalAuth, clear_current_user, safe_callback, set_current_user,
};
use crate::models::{CurrentUser, User};
use crate::routes::PageContext;
use crate::services::{AuthService, CartService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Sign-in form data.
#[derive(Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Sign-up form data.
#[derive(Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// `?callbackUrl=` on the auth pages.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_in.html")]
pub struct SignInTemplate {
    pub ctx: PageContext,
    pub callback_url: String,
    pub sign_up_href: String,
}

/// Sign-up page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/sign_up.html")]
pub struct SignUpTemplate {
    pub ctx: PageContext,
    pub callback_url: String,
    pub sign_in_href: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Put the user in the session and claim the visitor's cart.
async fn start_session(
    state: &AppState,
    session: &Session,
    cart: &CartSession,
    user: &User,
) -> Result<(), AppError> {
    let current = CurrentUser::from(user);
    set_current_user(session, &current).await?;
    set_sentry_user(&current.id, Some(current.email.as_str()));

    if let Some(cart_session) = cart.id() {
        let carts = CartService::new(state.pool());
        let attached = match carts.get_cart(Some(cart_session)).await {
            Ok(Some(_)) => carts
                .get_or_create_cart(cart_session, Some(user.id))
                .await
                .map(|_| ()),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = attached {
            tracing::warn!(error = %e, user_id = %user.id, "Attaching cart to user failed");
        }
    }

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(())
}

fn auth_page_with_callback(page: &str, callback: &str) -> String {
    if callback == "/" {
        page.to_owned()
    } else {
        format!("{page}?callbackUrl={}", urlencoding::encode(callback))
    }
}

// =============================================================================
// Sign In
// =============================================================================

/// Display the sign-in page. Signed-in visitors go straight to the callback.
#[instrument(skip(ctx))]
pub async fn sign_in_page(ctx: PageContext, Query(query): Query<CallbackQuery>) -> Response {
    let callback_url = safe_callback(query.callback_url.as_deref());
    if ctx.user.is_some() {
        return Redirect::to(&callback_url).into_response();
    }
    SignInTemplate {
        ctx,
        sign_up_href: auth_page_with_callback("/sign-up", &callback_url),
        callback_url,
    }
    .into_response()
}

/// Handle sign-in form submission.
#[instrument(skip(state, session, cart, form))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    cart: CartSession,
    Form(form): Form<SignInForm>,
) -> Result<Redirect, AppError> {
    let callback = safe_callback(form.callback_url.as_deref());

    match AuthService::new(state.pool())
        .sign_in(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            start_session(&state, &session, &cart, &user).await?;
            Ok(Redirect::to(&callback))
        }
        Err(e) => {
            tracing::debug!(error = %e, "Sign-in rejected");
            flash::error(&session, e.to_string()).await;
            Ok(Redirect::to(&auth_page_with_callback("/sign-in", &callback)))
        }
    }
}

// =============================================================================
// Sign Up
// =============================================================================

/// Display the sign-up page.
#[instrument(skip(ctx))]
pub async fn sign_up_page(ctx: PageContext, Query(query): Query<CallbackQuery>) -> Response {
    let callback_url = safe_callback(query.callback_url.as_deref());
    if ctx.user.is_some() {
        return Redirect::to(&callback_url).into_response();
    }
    SignUpTemplate {
        ctx,
        sign_in_href: auth_page_with_callback("/sign-in", &callback_url),
        callback_url,
    }
    .into_response()
}

/// Handle sign-up form submission. New accounts are signed in at once.
#[instrument(skip(state, session, cart, form))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    cart: CartSession,
    Form(form): Form<SignUpForm>,
) -> Result<Redirect, AppError> {
    let callback = safe_callback(form.callback_url.as_deref());

    match AuthService::new(state.pool())
        .sign_up(
            &form.name,
            &form.email,
            &form.password,
            &form.confirm_password,
        )
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Account created");
            start_session(&state, &session, &cart, &user).await?;
            Ok(Redirect::to(&callback))
        }
        Err(e) => {
            flash::error(&session, e.to_string()).await;
            Ok(Redirect::to(&auth_page_with_callback("/sign-up", &callback)))
        }
    }
}

// =============================================================================
// Sign Out
// =============================================================================

/// Sign out and return home. The cart cookie is left alone.
#[instrument(skip(session, user))]
pub async fn sign_out(session: Session, OptionalAuth(user): OptionalAuth) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User signed out");
    }
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_page_with_callback() {
        assert_eq!(auth_page_with_callback("/sign-in", "/"), "/sign-in");
        assert_eq!(
            auth_page_with_callback("/sign-in", "/checkout/shipping"),
            "/sign-in?callbackUrl=%2Fcheckout%2Fshipping"
        );
        assert_eq!(
            auth_page_with_callback("/sign-up", "/admin"),
            "/sign-up?callbackUrl=%2Fadmin"
        );
    }
}
