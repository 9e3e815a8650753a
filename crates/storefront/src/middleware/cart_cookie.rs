//! Cart-session cookie.
//!
//! The cart is keyed by its own long-lived cookie, separate from the login
//! session, so signing in or out never loses the cart. Read-only pages use the
//! existing value; cart mutations call [`CartSession::ensure`], which issues a
//! new ID when the visitor has none and sets the cookie on the response.

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header, request::Parts},
    response::{IntoResponseParts, ResponseParts},
};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use uuid::Uuid;

use crate::state::AppState;

/// Cart cookie name.
pub const CART_COOKIE_NAME: &str = "cart_session_id";

/// Cart cookie lifetime (30 days).
const CART_COOKIE_MAX_AGE_DAYS: i64 = 30;

/// The visitor's cart-session ID, if any.
#[derive(Debug, Clone, Copy)]
pub struct CartSession {
    id: Option<Uuid>,
    issued: bool,
    secure: bool,
}

impl CartSession {
    /// The existing cart-session ID, without issuing one.
    #[must_use]
    pub const fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// The cart-session ID, issuing a fresh one if the visitor has none.
    pub fn ensure(&mut self) -> Uuid {
        if let Some(id) = self.id {
            return id;
        }
        let id = Uuid::new_v4();
        self.id = Some(id);
        self.issued = true;
        id
    }

    fn set_cookie(&self) -> Option<HeaderValue> {
        let id = self.id.filter(|_| self.issued)?;
        let cookie = Cookie::build((CART_COOKIE_NAME, id.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::days(CART_COOKIE_MAX_AGE_DAYS))
            .path("/")
            .build();
        HeaderValue::from_str(&cookie.to_string()).ok()
    }
}

/// Find the cart cookie in a request's `Cookie` headers.
fn read_cart_cookie(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == CART_COOKIE_NAME)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

impl FromRequestParts<AppState> for CartSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self {
            id: read_cart_cookie(parts),
            issued: false,
            secure: state.config().secure_cookies(),
        })
    }
}

impl IntoResponseParts for CartSession {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(value) = self.set_cookie() {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Ok(res)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, ()) = Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_read_cart_cookie_among_others() {
        let id = Uuid::new_v4();
        let parts = parts_with_cookie(&format!("prostore_session=abc; {CART_COOKIE_NAME}={id}"));
        assert_eq!(read_cart_cookie(&parts), Some(id));
    }

    #[test]
    fn test_read_cart_cookie_ignores_garbage() {
        let parts = parts_with_cookie(&format!("{CART_COOKIE_NAME}=not-a-uuid"));
        assert_eq!(read_cart_cookie(&parts), None);
    }

    #[test]
    fn test_existing_id_sets_no_cookie() {
        let mut session = CartSession {
            id: Some(Uuid::new_v4()),
            issued: false,
            secure: false,
        };
        let before = session.id();
        assert_eq!(Some(session.ensure()), before);
        assert!(session.set_cookie().is_none());
    }

    #[test]
    fn test_issued_id_sets_cookie() {
        let mut session = CartSession {
            id: None,
            issued: false,
            secure: true,
        };
        let id = session.ensure();
        let header = session.set_cookie().unwrap();
        let header = header.to_str().unwrap();

        assert!(header.starts_with(&format!("{CART_COOKIE_NAME}={id}")));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Secure"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Max-Age=2592000"));
        assert!(header.contains("Path=/"));
    }
}
