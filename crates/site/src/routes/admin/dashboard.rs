//! Admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::{RequireAdmin, flash};
use crate::models::{CurrentUser, FlashMessage};
use crate::state::AppState;

/// Record counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardCounts {
    pub products: i64,
    pub active_products: i64,
    pub posts: i64,
    pub published_posts: i64,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub flashes: Vec<FlashMessage>,
    pub admin: CurrentUser,
    pub counts: DashboardCounts,
}

/// GET /admin
#[instrument(skip_all, fields(user_id = %admin.id))]
pub async fn dashboard(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse> {
    let counts = DashboardCounts {
        products: state.products().count().await?,
        active_products: state.products().count_active().await?,
        posts: state.blog_posts().count().await?,
        published_posts: state.blog_posts().count_published().await?,
    };

    Ok(DashboardTemplate {
        flashes: flash::take(&session).await,
        admin,
        counts,
    })
}
