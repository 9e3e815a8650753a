//! Authentication extractors.
//!
//! Signed-in users are identified by a [`CurrentUser`] stored in the session.
//! Pages that need a user redirect to sign-in with a `callbackUrl` pointing
//! back at the original path.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CurrentUser, session::keys};
use crate::state::AppState;

/// Sign-in URL that returns to `path` afterwards.
#[must_use]
pub fn sign_in_url(path: &str) -> String {
    format!("/sign-in?callbackUrl={}", urlencoding::encode(path))
}

/// A `callbackUrl` we are willing to redirect to: a local absolute path.
///
/// Anything else (other hosts, protocol-relative URLs, backslash tricks)
/// falls back to `/`.
#[must_use]
pub fn safe_callback(raw: Option<&str>) -> String {
    match raw {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path.to_owned()
        }
        _ => "/".to_owned(),
    }
}

/// Extractor that requires a signed-in user.
///
/// Anonymous visitors are redirected to the sign-in page.
pub struct RequireAuth(pub CurrentUser);

/// Error returned when an extractor refuses the request.
#[derive(Debug)]
pub enum AuthRejection {
    /// Send the visitor to sign in, then back to this path.
    RedirectToSignIn(String),
    /// Signed in, but not allowed here.
    Forbidden,
    /// The session store or database failed.
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn(path) => Redirect::to(&sign_in_url(&path)).into_response(),
            Self::Forbidden => AppError::Forbidden.into_response(),
            Self::Internal(err) => err.into_response(),
        }
    }
}

fn requested_path(parts: &Parts) -> String {
    parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned())
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Reading session user failed"))
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AuthRejection::RedirectToSignIn(requested_path(parts)))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject anonymous visitors.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Extractor that requires a signed-in administrator.
///
/// The role is re-read from the database, so demoting a user takes effect
/// on their next request rather than at their next sign-in.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        let stored = crate::db::UserRepository::new(state.pool())
            .get_by_id(user.id)
            .await
            .map_err(|e| AuthRejection::Internal(e.into()))?;

        match stored {
            Some(stored) if stored.role.is_admin() => Ok(Self(CurrentUser::from(&stored))),
            Some(_) => {
                tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Admin access denied");
                Err(AuthRejection::Forbidden)
            }
            None => Err(AuthRejection::RedirectToSignIn(requested_path(parts))),
        }
    }
}

/// Store the signed-in user in the session.
///
/// The session ID is cycled first so a pre-login session ID can't be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Clear the session on sign-out.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_url_encodes_path() {
        assert_eq!(
            sign_in_url("/checkout/shipping"),
            "/sign-in?callbackUrl=%2Fcheckout%2Fshipping"
        );
        assert_eq!(
            sign_in_url("/admin/orders?page=2"),
            "/sign-in?callbackUrl=%2Fadmin%2Forders%3Fpage%3D2"
        );
    }

    #[test]
    fn test_safe_callback_accepts_local_paths() {
        assert_eq!(safe_callback(Some("/checkout/shipping")), "/checkout/shipping");
        assert_eq!(safe_callback(Some("/admin/orders?page=2")), "/admin/orders?page=2");
    }

    #[test]
    fn test_safe_callback_rejects_offsite() {
        assert_eq!(safe_callback(None), "/");
        assert_eq!(safe_callback(Some("https://evil.example")), "/");
        assert_eq!(safe_callback(Some("//evil.example")), "/");
        assert_eq!(safe_callback(Some("/\\evil.example")), "/");
        assert_eq!(safe_callback(Some("")), "/");
    }
}
