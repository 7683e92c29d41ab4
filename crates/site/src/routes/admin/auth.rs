//! Admin login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user};
use crate::filters;
use crate::middleware::auth::{LOGIN_PATH, requires_admin_flag, requires_session};
use crate::middleware::{RequireAdmin, clear_current_user, flash, safe_next, set_current_user};
use crate::models::{CurrentUser, FlashLevel, FlashMessage};
use crate::services::auth::{self, AuthError};
use crate::state::AppState;

/// `?next=` on the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<FlashMessage>,
    pub next: String,
    pub username: String,
    pub error: Option<&'static str>,
}

/// Display the login page. Administrators already logged in go straight to
/// `next`.
///
/// GET /admin/login
#[instrument(skip(session))]
pub async fn login_page(session: Session, Query(query): Query<NextQuery>) -> Response {
    let signed_in = requires_session(&session)
        .await
        .and_then(requires_admin_flag)
        .is_ok();
    if signed_in {
        return Redirect::to(safe_next(query.next.as_deref())).into_response();
    }

    LoginTemplate {
        flashes: flash::take(&session).await,
        next: query.next.unwrap_or_default(),
        username: String::new(),
        error: None,
    }
    .into_response()
}

/// Verify credentials and start the admin session.
///
/// POST /admin/login
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match auth::authenticate(state.users(), &form.username, &form.password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            tracing::info!(user_id = %user.id, "Admin logged in");
            flash::push(&session, FlashLevel::Success, "Login realizado com sucesso!").await;
            Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed: invalid credentials");
            Ok(LoginTemplate {
                flashes: Vec::new(),
                next: form.next.unwrap_or_default(),
                username: form.username,
                error: Some("Usuário ou senha inválidos."),
            }
            .into_response())
        }
        Err(AuthError::Repository(e)) => Err(e.into()),
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}

/// End the admin session.
///
/// GET or POST /admin/logout
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn logout(RequireAdmin(admin): RequireAdmin, session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    tracing::info!("Admin logged out");
    flash::push(&session, FlashLevel::Info, "Você saiu do painel.").await;
    Ok(Redirect::to(LOGIN_PATH))
}
