//! Profile page.

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

use crate::error::AppError;
use crate::filters;
use crate::flash;
use crate::middleware::{RequireAuth, sign_in_url};
use crate::models::{CurrentUser, session::keys};
use crate::routes::PageContext;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

const PROFILE_PATH: &str = "/user/profile";

/// Profile template.
#[derive(Template, WebTemplate)]
#[template(path = "user/profile.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub member_since: String,
}

/// Profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
}

/// Display the signed-in user's profile.
#[instrument(skip(state, ctx, user))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Response {
    match AuthService::new(state.pool()).get_user(user.id).await {
        Ok(user) => ProfileTemplate {
            ctx,
            name: user.name,
            email: user.email.to_string(),
            member_since: prostore_core::format::format_date(user.created_at),
        }
        .into_response(),
        Err(AuthError::UserNotFound) => Redirect::to(&sign_in_url(PROFILE_PATH)).into_response(),
        Err(e) => AppError::Internal(format!("Loading profile failed: {e:?}")).into_response(),
    }
}

/// Update the display name.
///
/// The session copy is refreshed so the header shows the new name at once.
#[instrument(skip(state, session, user))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Redirect {
    match AuthService::new(state.pool())
        .update_name(user.id, &form.name)
        .await
    {
        Ok(name) => {
            let refreshed = CurrentUser { name, ..user };
            if let Err(e) = session.insert(keys::CURRENT_USER, &refreshed).await {
                tracing::warn!(error = %e, "Refreshing session user failed");
            }
            flash::success(&session, "Profile updated successfully!").await;
        }
        Err(e) => flash::error(&session, e.to_string()).await,
    }
    Redirect::to(PROFILE_PATH)
}
