//! Admin route guards.
//!
//! Every admin handler takes [`RequireAdmin`], which runs two guards in
//! order: [`requires_session`] then [`requires_admin_flag`]. A rejection
//! queues a warning flash and redirects to the login page with the
//! requested path as `next`.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::middleware::flash;
use crate::models::{CurrentUser, FlashLevel, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/admin/login";

/// Landing page after login.
pub const ADMIN_HOME: &str = "/admin";

/// Why a guard turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// No user in the session.
    NotLoggedIn,
    /// Logged in without the admin flag.
    NotAdmin,
}

impl GuardRejection {
    /// Flash text shown on the login page.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotLoggedIn => "Por favor, faça login para acessar esta página.",
            Self::NotAdmin => "Acesso restrito a administradores.",
        }
    }
}

/// First guard: a user must be stored in the session.
///
/// # Errors
///
/// Returns `GuardRejection::NotLoggedIn` when the session holds no user or
/// cannot be read.
pub async fn requires_session(session: &Session) -> Result<CurrentUser, GuardRejection> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or(GuardRejection::NotLoggedIn)
}

/// Second guard: the user must carry the admin flag.
///
/// # Errors
///
/// Returns `GuardRejection::NotAdmin` for non-admin users.
pub fn requires_admin_flag(user: CurrentUser) -> Result<CurrentUser, GuardRejection> {
    if user.is_admin {
        Ok(user)
    } else {
        Err(GuardRejection::NotAdmin)
    }
}

/// Extractor that requires a logged-in administrator.
///
/// # Example
///
/// ```rust,ignore
/// async fn dashboard(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Olá, {}!", admin.username)
/// }
/// ```
pub struct RequireAdmin(pub CurrentUser);

/// Redirect to the login page.
pub struct LoginRedirect(String);

impl LoginRedirect {
    fn for_path(path: &str) -> Self {
        let next: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
        Self(format!("{LOGIN_PATH}?next={next}"))
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.0).into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_owned();

        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>() else {
            tracing::error!("Session layer missing on admin route");
            return Err(LoginRedirect::for_path(&path));
        };

        let checked = match requires_session(session).await {
            Ok(user) => requires_admin_flag(user),
            Err(rejection) => Err(rejection),
        };

        match checked {
            Ok(user) => {
                sentry::configure_scope(|scope| {
                    scope.set_user(Some(sentry::User {
                        id: Some(user.id.to_string()),
                        username: Some(user.username.clone()),
                        ..Default::default()
                    }));
                });
                Ok(Self(user))
            }
            Err(rejection) => {
                tracing::debug!(path = %path, ?rejection, "Admin guard rejected request");
                flash::push(session, FlashLevel::Warning, rejection.message()).await;
                Err(LoginRedirect::for_path(&path))
            }
        }
    }
}

/// Where to go after login: `next` when it is an admin path on this site,
/// otherwise the dashboard.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if (path == ADMIN_HOME || path.starts_with("/admin/"))
                && !path.contains("//")
                && !path.contains('\\') =>
        {
            path
        }
        _ => ADMIN_HOME,
    }
}

/// Store the logged-in user, rotating the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Forget the logged-in user (logout), rotating the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    session.cycle_id().await
}
