//! One-shot notifications stored in the session.
//!
//! A handler pushes a message before redirecting; the next full page drains
//! the list and renders it.

use tower_sessions::Session;

use crate::models::{FlashLevel, FlashMessage, session_keys};

/// Queue a message for the next page view.
///
/// Session failures are logged; a lost flash never fails the request.
pub async fn push(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut pending: Vec<FlashMessage> = match session.get(session_keys::FLASHES).await {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    };
    pending.push(FlashMessage {
        level,
        text: text.into(),
    });

    if let Err(e) = session.insert(session_keys::FLASHES, &pending).await {
        tracing::error!(error = %e, "Failed to store flash message");
    }
}

/// Remove and return every pending message, oldest first.
pub async fn take(session: &Session) -> Vec<FlashMessage> {
    match session
        .remove::<Vec<FlashMessage>>(session_keys::FLASHES)
        .await
    {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}
