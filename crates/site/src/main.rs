//! FS Eletromcz site server.
//!
//! # Architecture
//!
//! - Axum web framework with Askama templates
//! - `PostgreSQL` (or process memory) for users, products, blog posts and
//!   sessions
//! - Google Places for customer reviews, cached in process
//! - SMTP relay for the contact form

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eletromcz_site::build_app;
use eletromcz_site::config::{LogFormat, SiteConfig, StorageBackend};
use eletromcz_site::db::{self, Repositories};
use eletromcz_site::services::auth::seed_admin;
use eletromcz_site::services::email::SmtpMailer;
use eletromcz_site::services::reviews::{GooglePlacesClient, ReviewCache, SystemClock};
use eletromcz_site::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SiteConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &SiteConfig) {
    let default_filter = if config.debug {
        "eletromcz_site=debug,tower_http=debug"
    } else {
        "eletromcz_site=info,tower_http=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = SiteConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let mailer = SmtpMailer::new(&config.mail).expect("Failed to configure mailer");
    let provider = GooglePlacesClient::new(&config.reviews).expect("Failed to build HTTP client");
    let reviews = ReviewCache::new(Arc::new(provider), Arc::new(SystemClock));

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p eletromcz-cli -- migrate
    let app = match config.storage {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .clone()
                .expect("DATABASE_URL is required for postgres storage");
            let pool = db::create_pool(&database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            let repos = Repositories::postgres(&pool);
            seed_admin(repos.users.as_ref(), &config.admin_seed)
                .await
                .expect("Failed to seed administrator");

            let state = AppState::new(config.clone(), repos, Arc::new(mailer), reviews);
            build_app(state, PostgresStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            let repos = Repositories::memory();
            seed_admin(repos.users.as_ref(), &config.admin_seed)
                .await
                .expect("Failed to seed administrator");

            let state = AppState::new(config.clone(), repos, Arc::new(mailer), reviews);
            build_app(state, MemoryStore::default())
        }
    };

    let addr = config.socket_addr();
    tracing::info!("Starting site on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    // Connect info feeds the rate limiter when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
