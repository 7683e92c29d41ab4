//! Product catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::flash;
use crate::models::{FlashMessage, Product};
use crate::state::AppState;

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "loja.html")]
pub struct ShopTemplate {
    pub flashes: Vec<FlashMessage>,
    pub products: Vec<Product>,
}

/// Active products, newest first.
///
/// GET /loja
#[instrument(skip(state, session))]
pub async fn loja(State(state): State<AppState>, session: Session) -> Result<impl IntoResponse> {
    let products = state.catalog().list_active().await?;
    Ok(ShopTemplate {
        flashes: flash::take(&session).await,
        products,
    })
}
