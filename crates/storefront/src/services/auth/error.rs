//! Authentication error types.

use thiserror::Error;

use prostore_core::AccountError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// `Display` output is shown to the customer on the sign-in and sign-up forms.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Sign-up input failed validation.
    #[error("{0}")]
    Invalid(#[from] AccountError),

    /// Wrong password or unknown email. The two are indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Signed-in user no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Email is already registered.
    #[error("Email already registered")]
    UserAlreadyExists,

    /// Account creation failed for an unexpected reason.
    #[error("Failed to create account")]
    CreateFailed,

    /// Repository/database error.
    #[error("Something went wrong")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("Something went wrong")]
    PasswordHash,
}
