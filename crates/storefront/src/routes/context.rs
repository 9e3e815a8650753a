//! Data every full page needs for the shared layout.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::flash::{self, Flash};
use crate::middleware::{CartSession, OptionalAuth};
use crate::models::CurrentUser;
use crate::services::CartService;
use crate::state::AppState;

/// Header and flash data for `base.html`.
///
/// Extracting this consumes the pending flash message, so only page
/// (GET) handlers take it.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub flash: Option<Flash>,
}

impl PageContext {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.role.is_admin())
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.name.as_str())
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let cart = CartSession::from_request_parts(parts, state).await?;

        let cart_count = match CartService::new(state.pool()).get_cart(cart.id()).await {
            Ok(cart) => cart.map_or(0, |c| c.item_count()),
            Err(e) => {
                tracing::warn!(error = %e, "Loading cart badge failed");
                0
            }
        };

        let flash = match parts.extensions.get::<Session>() {
            Some(session) => flash::take(session).await,
            None => None,
        };

        Ok(Self {
            user,
            cart_count,
            flash,
        })
    }
}
