//! Administrator account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an administrator with a password
//! prostore-cli admin create -e admin@example.com -n "Admin Name" -p secret123
//!
//! # Promote an existing customer account
//! prostore-cli admin promote -e jane@example.com
//! ```
//!
//! The password may also come from `PROSTORE_ADMIN_PASSWORD` so it stays out
//! of shell history.

use prostore_core::{AccountError, Email, Role, SignUp, UserId};
use prostore_storefront::db::{RepositoryError, UserRepository};
use prostore_storefront::services::auth::{AuthError, AuthService};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Account details failed the sign-up rules.
    #[error("Invalid account details: {0}")]
    Invalid(#[from] AccountError),

    /// Email already belongs to an account.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No account has this email.
    #[error("No user found with email: {0}")]
    UserNotFound(String),

    /// Account creation failed.
    #[error("Failed to create user: {0}")]
    Auth(#[from] AuthError),

    /// Database error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new administrator account.
///
/// Applies the same name, email, and password rules as customer sign-up.
///
/// # Errors
///
/// Returns `AdminError::Invalid` for bad input and `AdminError::UserExists`
/// if the email is taken.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
) -> Result<UserId, Box<dyn std::error::Error>> {
    let input = SignUp::parse(name, email, password, password).map_err(AdminError::from)?;

    let pool = super::connect().await?;

    tracing::info!("Creating admin user: {}", input.email);

    let user = AuthService::new(&pool)
        .create_user(&input, Role::Admin)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AdminError::UserExists(input.email.to_string()),
            other => AdminError::Auth(other),
        })?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}

/// Give an existing account the admin role.
///
/// The change applies on the account's next admin request; sessions are not
/// cycled.
///
/// # Errors
///
/// Returns `AdminError::UserNotFound` if no account has the email.
pub async fn promote(email: &str) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Email::parse(&email.trim().to_lowercase())
        .map_err(|_| AdminError::Invalid(AccountError::InvalidEmail))?;

    let pool = super::connect().await?;

    let user = UserRepository::new(&pool)
        .set_role(&parsed, Role::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_owned()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("{} ({}) is now an admin", user.name, user.email);
    Ok(())
}
