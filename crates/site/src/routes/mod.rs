//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page with services and contact form
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (storage reachable)
//! POST /enviar_contato            - Relay the contact form by email
//! GET  /get_google_reviews        - Review JSON (cached, never stored by clients)
//! GET  /test_reviews              - Server-rendered review debug page
//! GET  /loja                      - Active products
//!
//! # Blog
//! GET  /blog?page=N               - Published posts, six per page
//! GET  /blog/{slug}               - Published post with recent posts
//!
//! # Admin (all but login require an administrator)
//! GET  /admin/login               - Login page
//! POST /admin/login               - Login action
//! GET  /admin/logout              - Logout action (POST also accepted)
//! GET  /admin                     - Dashboard with record counts
//! GET  /admin/products            - Product list
//! GET  /admin/products/new        - New product form
//! POST /admin/products/new        - Create product (multipart)
//! GET  /admin/products/edit/{id}  - Edit product form
//! POST /admin/products/edit/{id}  - Update product (multipart)
//! GET  /admin/products/delete/{id} - Delete product and its image (POST also accepted)
//! GET  /admin/blog                - Post list
//! GET  /admin/blog/new            - New post form
//! POST /admin/blog/new            - Create post (multipart)
//! GET  /admin/blog/edit/{id}      - Edit post form
//! POST /admin/blog/edit/{id}      - Update post (multipart)
//! GET  /admin/blog/delete/{id}    - Delete post and its image (POST also accepted)
//! ```

pub mod admin;
pub mod blog;
pub mod contact;
pub mod health;
pub mod home;
pub mod reviews;
pub mod shop;

use axum::{
    Router,
    routing::{MethodRouter, get, post},
};

use crate::config::SiteConfig;
use crate::middleware::rate_limit::RateLimiterLayer;
use crate::middleware::{contact_rate_limiter, login_rate_limiter};
use crate::state::AppState;

/// Wrap `route` in `limiter` when rate limiting is enabled.
fn limited(route: MethodRouter<AppState>, limiter: Option<RateLimiterLayer>) -> MethodRouter<AppState> {
    match limiter {
        Some(layer) => route.layer(layer),
        None => route,
    }
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/blog", get(blog::index))
        .route("/blog/{slug}", get(blog::show))
}

/// Create the admin routes router.
///
/// Routes are registered with full paths so the guard sees the real request
/// path when it builds the `next` parameter.
pub fn admin_routes(config: &SiteConfig) -> Router<AppState> {
    let login_limiter = config.rate_limit.then(login_rate_limiter);

    Router::new()
        .route(
            "/admin/login",
            get(admin::auth::login_page).merge(limited(post(admin::auth::login), login_limiter)),
        )
        .route(
            "/admin/logout",
            get(admin::auth::logout).post(admin::auth::logout),
        )
        .route("/admin", get(admin::dashboard::dashboard))
        // Products
        .route("/admin/products", get(admin::products::list))
        .route(
            "/admin/products/new",
            get(admin::products::new_page).post(admin::products::create),
        )
        .route(
            "/admin/products/edit/{id}",
            get(admin::products::edit_page).post(admin::products::update),
        )
        .route(
            "/admin/products/delete/{id}",
            get(admin::products::delete).post(admin::products::delete),
        )
        // Blog
        .route("/admin/blog", get(admin::blog::list))
        .route(
            "/admin/blog/new",
            get(admin::blog::new_page).post(admin::blog::create),
        )
        .route(
            "/admin/blog/edit/{id}",
            get(admin::blog::edit_page).post(admin::blog::update),
        )
        .route(
            "/admin/blog/delete/{id}",
            get(admin::blog::delete).post(admin::blog::delete),
        )
}

/// Create all routes for the site.
pub fn routes(config: &SiteConfig) -> Router<AppState> {
    let contact_limiter = config.rate_limit.then(contact_rate_limiter);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Public pages
        .route("/", get(home::home))
        .route(
            "/enviar_contato",
            limited(post(contact::enviar_contato), contact_limiter),
        )
        .route("/get_google_reviews", get(reviews::get_google_reviews))
        .route("/test_reviews", get(reviews::test_reviews))
        .route("/loja", get(shop::loja))
        .merge(blog_routes())
        .merge(admin_routes(config))
}
