//! Unified error handling with Sentry integration.
//!
//! Handlers that cannot turn a failure into a flash message return
//! `Result<T, AppError>`. Server-side errors are captured to Sentry and
//! logged; the client only sees a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::blog::BlogError;
use crate::services::catalog::CatalogError;

/// Application-level error type for the site.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Template rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound => Self::NotFound("product".to_string()),
            CatalogError::Repository(e) => Self::Database(e),
            CatalogError::Image(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<BlogError> for AppError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::NotFound => Self::NotFound("post".to_string()),
            BlogError::Repository(e) => Self::Database(e),
            BlogError::SlugTaken(slug) => Self::BadRequest(format!("slug already in use: {slug}")),
            BlogError::Image(e) => Self::Internal(e.to_string()),
        }
    }
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Template(_) | Self::Session(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, message) = match &self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "Página não encontrada"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "Requisição inválida"),
            // Don't expose internal error details to clients
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erro interno do servidor",
            ),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
