//! Public blog pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::flash;
use crate::models::{BlogPost, FlashMessage};
use crate::services::blog::{Page, PostDetail, parse_page};
use crate::state::AppState;

/// `?page=` as typed; anything unparsable means page 1.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Blog listing template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub flashes: Vec<FlashMessage>,
    pub page: Page<BlogPost>,
}

/// Blog article template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/detail.html")]
pub struct BlogDetailTemplate {
    pub flashes: Vec<FlashMessage>,
    pub detail: PostDetail,
}

/// Published posts, six per page.
///
/// GET /blog
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .blog()
        .list_published(parse_page(query.page.as_deref()))
        .await?;

    Ok(BlogIndexTemplate {
        flashes: flash::take(&session).await,
        page,
    })
}

/// A published post; drafts and unknown slugs are 404.
///
/// GET /blog/{slug}
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let detail = state.blog().published_detail(&slug).await?;

    Ok(BlogDetailTemplate {
        flashes: flash::take(&session).await,
        detail,
    })
}
