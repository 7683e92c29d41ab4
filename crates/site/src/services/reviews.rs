//! Google reviews with a single-slot, time-based cache.
//!
//! The home page fetches `/get_google_reviews` from the browser. Every call
//! goes through [`ReviewCache::get_reviews`]:
//!
//! 1. A fresh cached entry is returned unchanged.
//! 2. Otherwise the [`ReviewProvider`] is asked for the place details.
//! 3. A result with at least one review is cached for [`SUCCESS_TTL`].
//! 4. Anything else (no reviews, provider status, HTTP error, timeout,
//!    missing credentials) yields the hand-written fallback reviews, cached
//!    for [`FALLBACK_TTL`] so the provider is retried sooner.
//!
//! The slot is a `tokio::sync::Mutex` held across the fetch: callers that
//! find the entry stale while a fetch is in flight wait for it and then see
//! its result, so the provider is called once per expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use crate::config::ReviewsConfig;

/// Freshness window of a live result.
pub const SUCCESS_TTL: TimeDelta = TimeDelta::hours(24);

/// Freshness window of the fallback payload.
pub const FALLBACK_TTL: TimeDelta = TimeDelta::hours(1);

/// Provider request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const PLACE_DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

const FALLBACK_PLACE_NAME: &str = "FS Eletromcz";

// =============================================================================
// Payload
// =============================================================================

/// A single review as sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author_name: String,
    pub profile_photo_url: String,
    /// Stars, 1 to 5.
    pub rating: u8,
    pub text: String,
    /// Unix seconds.
    pub time: i64,
    pub relative_time_description: String,
}

/// JSON body of `/get_google_reviews`.
///
/// `success` is always true: the client script only renders when it is set,
/// and the fallback reviews are meant to be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewsResult {
    pub success: bool,
    pub reviews: Vec<Review>,
    pub place_name: String,
    pub place_rating: f64,
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewsResult {
    fn live(details: PlaceDetails) -> Self {
        Self {
            success: true,
            reviews: details.reviews,
            place_name: details.name,
            place_rating: details.rating,
            is_fallback: false,
            error: None,
        }
    }

    /// The three hand-written reviews shown when the provider cannot be used.
    #[must_use]
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            success: true,
            reviews: fallback_reviews(),
            place_name: FALLBACK_PLACE_NAME.to_string(),
            place_rating: 5.0,
            is_fallback: true,
            error: Some(error.into()),
        }
    }
}

fn fallback_reviews() -> Vec<Review> {
    vec![
        Review {
            author_name: "Carlos Oliveira".to_string(),
            profile_photo_url: "https://ui-avatars.com/api/?name=Carlos+Oliveira&background=random"
                .to_string(),
            rating: 5,
            text: "Excelente serviço! Refizeram toda a parte elétrica da minha casa com \
                   muita organização e capricho. Recomendo a todos."
                .to_string(),
            time: 1_704_067_200,
            relative_time_description: "há 2 meses".to_string(),
        },
        Review {
            author_name: "Mariana Santos".to_string(),
            profile_photo_url: "https://ui-avatars.com/api/?name=Mariana+Santos&background=random"
                .to_string(),
            rating: 5,
            text: "Atendimento rápido e profissional. Instalaram o quadro de distribuição \
                   no mesmo dia e explicaram tudo com clareza."
                .to_string(),
            time: 1_706_745_600,
            relative_time_description: "há 1 mês".to_string(),
        },
        Review {
            author_name: "Roberto Almeida".to_string(),
            profile_photo_url: "https://ui-avatars.com/api/?name=Roberto+Almeida&background=random"
                .to_string(),
            rating: 5,
            text: "Preço justo e trabalho de qualidade na manutenção do padrão de entrada. \
                   Com certeza chamarei novamente."
                .to_string(),
            time: 1_708_300_800,
            relative_time_description: "há 3 semanas".to_string(),
        },
    ]
}

// =============================================================================
// Provider
// =============================================================================

/// Errors from fetching place details.
#[derive(Debug, thiserror::Error)]
pub enum ReviewsError {
    /// Place ID or API key not configured.
    #[error("review provider not configured")]
    NotConfigured,

    /// Request failed, timed out, or the body was not valid JSON.
    ///
    /// The request URL carries the API key, so it is stripped on conversion.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// Non-2xx response.
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// The API answered with a status other than `OK`.
    #[error("API status {status}: {message}")]
    Api { status: String, message: String },

    /// `OK` without a `result` object.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Invalid request URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for ReviewsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl ReviewsError {
    /// Cause shown in the public payload. Detail stays in the server log.
    #[must_use]
    pub fn public_cause(&self) -> String {
        match self {
            Self::NotConfigured => "review provider not configured".to_string(),
            Self::Http(e) if e.is_timeout() => "review provider timed out".to_string(),
            Self::Http(e) if e.is_decode() => "malformed provider response".to_string(),
            Self::Http(_) => "review provider unreachable".to_string(),
            Self::Status(status) => format!("provider HTTP status {}", status.as_u16()),
            Self::Api { status, .. } => format!("provider API status {status}"),
            Self::Malformed(_) => "malformed provider response".to_string(),
            Self::Url(_) => "invalid provider request".to_string(),
        }
    }
}

/// Place details needed by the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceDetails {
    pub name: String,
    pub rating: f64,
    pub reviews: Vec<Review>,
}

/// Source of place details.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    async fn fetch(&self) -> Result<PlaceDetails, ReviewsError>;
}

/// Google Places Details API client.
#[derive(Clone)]
pub struct GooglePlacesClient {
    client: reqwest::Client,
    place_id: Option<String>,
    api_key: Option<SecretString>,
}

impl GooglePlacesClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ReviewsConfig) -> Result<Self, ReviewsError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            place_id: config.place_id.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn details_url(&self) -> Result<Url, ReviewsError> {
        let (Some(place_id), Some(api_key)) = (&self.place_id, &self.api_key) else {
            return Err(ReviewsError::NotConfigured);
        };

        Ok(Url::parse_with_params(
            PLACE_DETAILS_URL,
            &[
                ("place_id", place_id.as_str()),
                ("fields", "name,rating,reviews"),
                ("language", "pt-BR"),
                ("reviews_sort", "newest"),
                ("key", api_key.expose_secret()),
            ],
        )?)
    }
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    result: Option<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    reviews: Vec<PlaceReview>,
}

#[derive(Debug, Deserialize)]
struct PlaceReview {
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    profile_photo_url: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    relative_time_description: String,
}

impl From<PlaceReview> for Review {
    fn from(review: PlaceReview) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rating = review.rating.round().clamp(1.0, 5.0) as u8;
        Self {
            author_name: review.author_name,
            profile_photo_url: review.profile_photo_url,
            rating,
            text: review.text,
            time: review.time,
            relative_time_description: review.relative_time_description,
        }
    }
}

impl PlaceDetailsResponse {
    fn into_details(self) -> Result<PlaceDetails, ReviewsError> {
        if self.status != "OK" {
            return Err(ReviewsError::Api {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            });
        }
        let result = self
            .result
            .ok_or_else(|| ReviewsError::Malformed("missing result".to_string()))?;

        Ok(PlaceDetails {
            name: result.name,
            rating: result.rating,
            reviews: result.reviews.into_iter().map(Review::from).collect(),
        })
    }
}

#[async_trait]
impl ReviewProvider for GooglePlacesClient {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<PlaceDetails, ReviewsError> {
        let url = self.details_url()?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReviewsError::Status(status));
        }

        response.json::<PlaceDetailsResponse>().await?.into_details()
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// Cache
// =============================================================================

/// A cached payload and how long it stays fresh.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<ReviewsResult>,
    pub fetched_at: DateTime<Utc>,
    pub ttl: TimeDelta,
}

/// Whether `entry` may still be served at `now`.
#[must_use]
pub fn is_fresh(entry: &CacheEntry, now: DateTime<Utc>) -> bool {
    now - entry.fetched_at < entry.ttl
}

/// Process-wide review cache, owned by `AppState`.
pub struct ReviewCache {
    provider: Arc<dyn ReviewProvider>,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<CacheEntry>>,
}

impl ReviewCache {
    #[must_use]
    pub fn new(provider: Arc<dyn ReviewProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Cached or freshly fetched reviews. Never fails: provider errors turn
    /// into the fallback payload.
    pub async fn get_reviews(&self) -> Arc<ReviewsResult> {
        let mut slot = self.slot.lock().await;
        let now = self.clock.now();

        if let Some(entry) = slot.as_ref()
            && is_fresh(entry, now)
        {
            tracing::debug!(
                fetched_at = %entry.fetched_at,
                is_fallback = entry.payload.is_fallback,
                "Serving cached reviews"
            );
            return Arc::clone(&entry.payload);
        }

        let (payload, ttl) = match self.provider.fetch().await {
            Ok(details) if !details.reviews.is_empty() => {
                tracing::info!(
                    place = %details.name,
                    count = details.reviews.len(),
                    "Fetched reviews from provider"
                );
                (ReviewsResult::live(details), SUCCESS_TTL)
            }
            Ok(details) => {
                tracing::warn!(place = %details.name, "Provider returned no reviews");
                (
                    ReviewsResult::fallback("nenhuma avaliação encontrada"),
                    FALLBACK_TTL,
                )
            }
            Err(ReviewsError::NotConfigured) => {
                tracing::warn!("Review provider not configured, using fallback reviews");
                (
                    ReviewsResult::fallback(ReviewsError::NotConfigured.public_cause()),
                    FALLBACK_TTL,
                )
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch reviews, using fallback reviews");
                (ReviewsResult::fallback(e.public_cause()), FALLBACK_TTL)
            }
        };

        let payload = Arc::new(payload);
        *slot = Some(CacheEntry {
            payload: Arc::clone(&payload),
            fetched_at: now,
            ttl,
        });
        payload
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use super::*;

    struct ManualClock(StdMutex<DateTime<Utc>>);

    impl ManualClock {
        fn new() -> Self {
            Self(StdMutex::new(
                DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            ))
        }

        fn advance(&self, by: TimeDelta) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    /// Returns the queued outcomes in order, repeating the last one.
    struct ScriptedProvider {
        calls: AtomicUsize,
        outcomes: Vec<fn() -> Result<PlaceDetails, ReviewsError>>,
    }

    #[async_trait]
    impl ReviewProvider for ScriptedProvider {
        async fn fetch(&self) -> Result<PlaceDetails, ReviewsError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = call.min(self.outcomes.len() - 1);
            (self.outcomes[index])()
        }
    }

    fn live() -> Result<PlaceDetails, ReviewsError> {
        Ok(PlaceDetails {
            name: "FS Eletromcz".to_string(),
            rating: 4.9,
            reviews: vec![Review {
                author_name: "Ana".to_string(),
                profile_photo_url: String::new(),
                rating: 5,
                text: "Ótimo".to_string(),
                time: 1_700_000_000,
                relative_time_description: "há uma semana".to_string(),
            }],
        })
    }

    fn empty() -> Result<PlaceDetails, ReviewsError> {
        Ok(PlaceDetails {
            name: "FS Eletromcz".to_string(),
            rating: 0.0,
            reviews: vec![],
        })
    }

    fn denied() -> Result<PlaceDetails, ReviewsError> {
        Err(ReviewsError::Api {
            status: "REQUEST_DENIED".to_string(),
            message: "invalid key".to_string(),
        })
    }

    fn cache(
        outcomes: Vec<fn() -> Result<PlaceDetails, ReviewsError>>,
    ) -> (ReviewCache, Arc<ScriptedProvider>, Arc<ManualClock>) {
        let provider = Arc::new(ScriptedProvider {
            calls: AtomicUsize::new(0),
            outcomes,
        });
        let clock = Arc::new(ManualClock::new());
        let cache = ReviewCache::new(provider.clone(), clock.clone());
        (cache, provider, clock)
    }

    #[tokio::test]
    async fn test_live_result_is_cached_for_a_day() {
        let (cache, provider, clock) = cache(vec![live]);

        let first = cache.get_reviews().await;
        clock.advance(TimeDelta::hours(23));
        let second = cache.get_reviews().await;

        assert!(!first.is_fallback);
        assert_eq!(
            serde_json::to_string(&*first).unwrap(),
            serde_json::to_string(&*second).unwrap()
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        clock.advance(TimeDelta::hours(1));
        cache.get_reviews().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fallback_is_retried_after_an_hour() {
        let (cache, provider, clock) = cache(vec![denied, live]);

        let first = cache.get_reviews().await;
        assert!(first.is_fallback);
        assert_eq!(first.reviews.len(), 3);
        assert!(first.error.as_deref().unwrap().contains("REQUEST_DENIED"));

        clock.advance(TimeDelta::minutes(59));
        assert!(cache.get_reviews().await.is_fallback);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        clock.advance(TimeDelta::minutes(1));
        assert!(!cache.get_reviews().await.is_fallback);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_reviews_falls_back() {
        let (cache, _, _) = cache(vec![empty]);
        let result = cache.get_reviews().await;
        assert!(result.is_fallback);
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let (cache, provider, _) = cache(vec![live]);
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_reviews().await })
            })
            .collect();
        for handle in handles {
            assert!(!handle.await.unwrap().is_fallback);
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    /// A port nothing listens on.
    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn test_transport_error_never_exposes_api_key() {
        let port = closed_port().await;
        let err: ReviewsError = reqwest::Client::new()
            .get(format!("http://127.0.0.1:{port}/details?key=SUPER-SECRET-KEY"))
            .send()
            .await
            .unwrap_err()
            .into();

        assert!(!err.to_string().contains("SUPER-SECRET-KEY"));
        assert!(!format!("{err:?}").contains("SUPER-SECRET-KEY"));

        let json = serde_json::to_string(&ReviewsResult::fallback(err.public_cause())).unwrap();
        assert!(!json.contains("SUPER-SECRET-KEY"));
        assert!(json.contains("review provider unreachable"));
    }

    #[test]
    fn test_public_cause_hides_provider_message() {
        let err = ReviewsError::Api {
            status: "REQUEST_DENIED".to_string(),
            message: "The provided API key is invalid. key=abc".to_string(),
        };
        assert_eq!(err.public_cause(), "provider API status REQUEST_DENIED");
    }

    #[test]
    fn test_is_fresh_boundary() {
        let now = Utc::now();
        let entry = CacheEntry {
            payload: Arc::new(ReviewsResult::fallback("x")),
            fetched_at: now,
            ttl: FALLBACK_TTL,
        };
        assert!(is_fresh(&entry, now + TimeDelta::minutes(59)));
        assert!(!is_fresh(&entry, now + TimeDelta::hours(1)));
    }

    #[test]
    fn test_fallback_reviews_are_well_formed() {
        let result = ReviewsResult::fallback("offline");
        assert_eq!(result.reviews.len(), 3);
        for review in &result.reviews {
            assert!(!review.author_name.is_empty());
            assert!((1..=5).contains(&review.rating));
        }
    }

    #[test]
    fn test_error_field_omitted_when_absent() {
        let json = serde_json::to_value(ReviewsResult::live(live().unwrap())).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "status": "OK",
            "result": {
                "name": "FS Eletromcz",
                "rating": 4.8,
                "reviews": [{
                    "author_name": "João",
                    "profile_photo_url": "https://lh3.googleusercontent.com/a/x",
                    "rating": 4,
                    "text": "Bom serviço",
                    "time": 1700000000,
                    "relative_time_description": "há 2 semanas"
                }]
            }
        }"#;
        let details = serde_json::from_str::<PlaceDetailsResponse>(body)
            .unwrap()
            .into_details()
            .unwrap();
        assert_eq!(details.reviews.len(), 1);
        assert_eq!(details.reviews[0].rating, 4);
        assert_eq!(details.reviews[0].author_name, "João");
    }

    #[test]
    fn test_response_status_not_ok() {
        let body = r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#;
        let result = serde_json::from_str::<PlaceDetailsResponse>(body)
            .unwrap()
            .into_details();
        assert!(matches!(result, Err(ReviewsError::Api { .. })));
    }

    #[test]
    fn test_details_url_requires_credentials() {
        let client = GooglePlacesClient::new(&ReviewsConfig::default()).unwrap();
        assert!(matches!(
            client.details_url(),
            Err(ReviewsError::NotConfigured)
        ));
    }

    #[test]
    fn test_details_url_parameters() {
        let client = GooglePlacesClient::new(&ReviewsConfig {
            place_id: Some("ChIJ123".to_string()),
            api_key: Some(SecretString::from("key-value")),
        })
        .unwrap();
        let url = client.details_url().unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("place_id=ChIJ123"));
        assert!(query.contains("fields=name%2Crating%2Creviews"));
        assert!(query.contains("language=pt-BR"));
        assert!(query.contains("reviews_sort=newest"));
    }
}
