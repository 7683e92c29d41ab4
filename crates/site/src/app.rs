//! Application assembly: routes, static files and the middleware stack.

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Build the complete application router.
///
/// `store` backs the session layer: `PostgresStore` in production, a
/// `MemoryStore` for memory storage and tests. Layers are listed innermost
/// first; see [`crate::middleware`] for the resulting order.
pub fn build_app<Store>(state: AppState, store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    let config = state.config();
    let session_layer = create_session_layer(store, config);

    routes::routes(config)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .nest_service("/uploads", ServeDir::new(&config.uploads.dir))
        .layer(DefaultBodyLimit::max(config.uploads.max_bytes))
        .layer(session_layer)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::SiteConfig;
    use crate::db::Repositories;
    use crate::services::email::SmtpMailer;
    use crate::services::reviews::{GooglePlacesClient, ReviewCache, SystemClock};

    fn app() -> Router {
        let config = SiteConfig::local(
            SecretString::from("router-test-secret-".repeat(4)),
            std::env::temp_dir(),
        );
        let mailer = SmtpMailer::new(&config.mail).unwrap();
        let provider = GooglePlacesClient::new(&config.reviews).unwrap();
        let reviews = ReviewCache::new(Arc::new(provider), Arc::new(SystemClock));
        let state = AppState::new(config, Repositories::memory(), Arc::new(mailer), reviews);
        build_app(state, MemoryStore::default())
    }

    #[tokio::test]
    async fn test_health_carries_security_headers() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::CONTENT_SECURITY_POLICY));
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_admin_redirects_to_login() {
        let response = app()
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/admin/login?next=%2Fadmin"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app()
            .oneshot(Request::get("/nao-existe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
