//! One-shot flash messages.
//!
//! Form handlers redirect after every POST. The outcome travels to the next
//! page as a flash message in the session and is removed when read.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session::keys;

/// Flash message style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Store a flash message. Failures are logged; the redirect still happens.
pub async fn set(session: &Session, kind: FlashKind, message: impl Into<String>) {
    let flash = Flash {
        kind,
        message: message.into(),
    };
    if let Err(e) = session.insert(keys::FLASH, &flash).await {
        tracing::warn!(error = %e, "Storing flash message failed");
    }
}

/// Store a success message.
pub async fn success(session: &Session, message: impl Into<String>) {
    set(session, FlashKind::Success, message).await;
}

/// Store an error message.
pub async fn error(session: &Session, message: impl Into<String>) {
    set(session, FlashKind::Error, message).await;
}

/// Remove and return the pending flash message.
pub async fn take(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(keys::FLASH)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Reading flash message failed"))
        .ok()
        .flatten()
}
