//! Integration tests for the FS Eletromcz site.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eletromcz-integration-tests
//! ```
//!
//! Each test spawns the full router on an ephemeral port with in-memory
//! storage, a recording mailer and a scripted review provider, then drives
//! it with a cookie-keeping `reqwest` client. No database or network access
//! is needed.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, redirect};
use secrecy::SecretString;
use tempfile::TempDir;
use tower_sessions::MemoryStore;

use eletromcz_site::build_app;
use eletromcz_site::config::SiteConfig;
use eletromcz_site::db::Repositories;
use eletromcz_site::services::auth::create_admin;
use eletromcz_site::services::email::{EmailError, Mailer, OutgoingEmail};
use eletromcz_site::services::reviews::{
    Clock, PlaceDetails, Review, ReviewCache, ReviewProvider, ReviewsError,
};
use eletromcz_site::state::AppState;

/// Password given to accounts created by [`TestContext::login_admin`].
pub const ADMIN_PASSWORD: &str = "senha-de-teste-123";

// =============================================================================
// Doubles
// =============================================================================

/// Mailer that keeps every message.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Mailer whose relay is always down.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::NotConfigured("MAIL_SERVER"))
    }
}

/// Review provider that answers with a fixed outcome and counts calls.
pub struct StubProvider {
    outcome: Option<PlaceDetails>,
    calls: AtomicUsize,
}

impl StubProvider {
    /// Always succeeds with `details`.
    pub const fn ok(details: PlaceDetails) -> Self {
        Self {
            outcome: Some(details),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails as if unconfigured.
    pub const fn failing() -> Self {
        Self {
            outcome: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReviewProvider for StubProvider {
    async fn fetch(&self) -> Result<PlaceDetails, ReviewsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone().ok_or(ReviewsError::NotConfigured)
    }
}

/// Clock moved by hand.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl Default for ManualClock {
    fn default() -> Self {
        Self(Mutex::new(Utc::now()))
    }
}

impl ManualClock {
    pub fn advance(&self, by: TimeDelta) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Place details with one five-star review.
pub fn sample_place() -> PlaceDetails {
    PlaceDetails {
        name: "FS Eletromcz".to_string(),
        rating: 4.9,
        reviews: vec![Review {
            author_name: "Maria Souza".to_string(),
            profile_photo_url: "https://lh3.googleusercontent.com/a/maria".to_string(),
            rating: 5,
            text: "Serviço impecável, recomendo!".to_string(),
            time: 1_700_000_000,
            relative_time_description: "há uma semana".to_string(),
        }],
    }
}

// =============================================================================
// Context
// =============================================================================

/// Injected dependencies for one test server.
pub struct TestOptions {
    pub mailer: Arc<dyn Mailer>,
    pub provider: Arc<dyn ReviewProvider>,
    pub clock: Arc<dyn Clock>,
    /// Change the configuration before the server starts.
    pub configure: fn(&mut SiteConfig),
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            mailer: Arc::new(RecordingMailer::default()),
            provider: Arc::new(StubProvider::failing()),
            clock: Arc::new(ManualClock::default()),
            configure: |_| {},
        }
    }
}

/// A running site plus a client that keeps cookies and does not follow
/// redirects.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub state: AppState,
    upload_dir: TempDir,
}

impl TestContext {
    /// Spawn a site with default doubles.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    /// Spawn a site with the given doubles.
    pub async fn with_options(options: TestOptions) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

        let mut config = SiteConfig::local(
            SecretString::from("integration-test-secret-".repeat(3)),
            upload_dir.path().to_path_buf(),
        );
        config.static_dir = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../site/static"));
        (options.configure)(&mut config);

        let reviews = ReviewCache::new(options.provider, options.clock);
        let state = AppState::new(config, Repositories::memory(), options.mailer, reviews);
        let app = build_app(state.clone(), MemoryStore::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
            state,
            upload_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn upload_dir(&self) -> &Path {
        self.upload_dir.path()
    }

    /// GET `path` and return the body text.
    pub async fn get_text(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
            .text()
            .await
            .expect("Body was not text")
    }

    /// Create an administrator named `username` and log the client in.
    pub async fn login_admin(&self, username: &str) {
        create_admin(self.state.users(), username, ADMIN_PASSWORD)
            .await
            .expect("Failed to create admin");

        let response = self
            .client
            .post(self.url("/admin/login"))
            .form(&[("username", username), ("password", ADMIN_PASSWORD)])
            .send()
            .await
            .expect("Login request failed");
        assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    }
}

/// The `Location` header of a redirect.
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}
