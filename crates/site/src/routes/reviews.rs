//! Google reviews endpoints.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::middleware::flash;
use crate::models::FlashMessage;
use crate::services::reviews::ReviewsResult;
use crate::state::AppState;

/// Headers that keep browsers and proxies from storing the review payload.
const NO_CACHE_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (header::PRAGMA, "no-cache"),
    (header::EXPIRES, "0"),
];

/// Review JSON for the home page script.
///
/// GET /get_google_reviews
#[instrument(skip(state))]
pub async fn get_google_reviews(State(state): State<AppState>) -> Response {
    let payload = state.reviews().get_reviews().await;
    (NO_CACHE_HEADERS, Json(&*payload)).into_response()
}

/// Debug page template.
#[derive(Template, WebTemplate)]
#[template(path = "test_reviews.html")]
pub struct TestReviewsTemplate {
    pub flashes: Vec<FlashMessage>,
    pub result: ReviewsResult,
}

/// Render the cached review result server side.
///
/// GET /test_reviews
#[instrument(skip(state, session))]
pub async fn test_reviews(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let result = state.reviews().get_reviews().await;
    TestReviewsTemplate {
        flashes: flash::take(&session).await,
        result: (*result).clone(),
    }
}
