//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SECRET_KEY` - Session signing secret (min 32 chars, high entropy)
//! - `DATABASE_URL` - `PostgreSQL` connection string (only with `SITE_STORAGE=postgres`)
//!
//! ## Optional
//! - `DEBUG` - Verbose logging (default: false)
//! - `SITE_HOST` - Bind address (default: 127.0.0.1)
//! - `SITE_PORT` - Listen port (default: 5000)
//! - `SITE_BASE_URL` - Public URL (default: `http://localhost:5000`)
//! - `SITE_STORAGE` - `postgres` or `memory` (default: postgres)
//! - `STATIC_DIR` - Static assets (default: crates/site/static)
//! - `UPLOAD_DIR` - Uploaded images (default: crates/site/static/uploads)
//! - `MAX_UPLOAD_BYTES` - Request body limit (default: 16 MiB)
//! - `MAIL_SERVER`, `MAIL_PORT`, `MAIL_USE_TLS`, `MAIL_USE_SSL` - SMTP relay
//! - `MAIL_USERNAME`, `MAIL_PASSWORD` - SMTP credentials
//! - `MAIL_DEFAULT_SENDER` - From header (default: `FS Eletromcz <MAIL_USERNAME>`)
//! - `CONTACT_RECIPIENT` - Where contact form messages go (default: sender address)
//! - `GOOGLE_PLACE_ID`, `GOOGLE_PLACES_API_KEY` - Review provider
//! - `ADMIN_USERNAME`, `ADMIN_PASSWORD` - First-boot administrator
//! - `RATE_LIMIT` - Rate limit login and contact (default: true)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT` - Error tracking
//! - `LOG_FORMAT` - `text` or `json` (default: text)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SECRET_KEY_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default request body limit (16 MiB), sized for product photos.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "you-will-never-guess",
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where records and sessions live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `PostgreSQL` through sqlx.
    Postgres,
    /// Process memory. Everything is lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'postgres' or 'memory', got '{other}'")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Site application configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Session signing secret
    pub secret_key: SecretString,
    /// Verbose logging
    pub debug: bool,
    /// Storage backend for records and sessions
    pub storage: StorageBackend,
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Image upload settings
    pub uploads: UploadConfig,
    /// SMTP settings for the contact form
    pub mail: MailConfig,
    /// Google Places review provider
    pub reviews: ReviewsConfig,
    /// Administrator created at first boot
    pub admin_seed: AdminSeedConfig,
    /// Apply governor rate limits to login and contact
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

/// Image upload configuration.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory holding product and blog images
    pub dir: PathBuf,
    /// Maximum request body size in bytes
    pub max_bytes: usize,
}

/// SMTP configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    /// STARTTLS after connecting
    pub use_tls: bool,
    /// Implicit TLS from the first byte
    pub use_ssl: bool,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// From header, e.g. `FS Eletromcz <contato@example.com>`
    pub default_sender: Option<String>,
    /// Destination of contact form messages
    pub contact_recipient: Option<String>,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("use_tls", &self.use_tls)
            .field("use_ssl", &self.use_ssl)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("default_sender", &self.default_sender)
            .field("contact_recipient", &self.contact_recipient)
            .finish()
    }
}

/// Google Places configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone, Default)]
pub struct ReviewsConfig {
    pub place_id: Option<String>,
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for ReviewsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewsConfig")
            .field("place_id", &self.place_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// First-boot administrator.
#[derive(Debug, Clone)]
pub struct AdminSeedConfig {
    pub username: String,
    pub password: Option<SecretString>,
}

impl SiteConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the secret key fails validation (length, placeholder, entropy).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("SITE_HOST", "127.0.0.1")?;
        let port = parse_env("SITE_PORT", "5000")?;
        let base_url = get_env_or_default("SITE_BASE_URL", "http://localhost:5000");
        let secret_key = get_validated_secret("SECRET_KEY")?;
        validate_secret_key(&secret_key, "SECRET_KEY")?;

        let storage: StorageBackend = parse_env("SITE_STORAGE", "postgres")?;
        let database_url = get_optional_env("DATABASE_URL").map(SecretString::from);
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_URL".to_string()));
        }

        Ok(Self {
            host,
            port,
            base_url,
            secret_key,
            debug: parse_bool_env("DEBUG", false)?,
            storage,
            database_url,
            static_dir: PathBuf::from(get_env_or_default("STATIC_DIR", "crates/site/static")),
            uploads: UploadConfig::from_env()?,
            mail: MailConfig::from_env()?,
            reviews: ReviewsConfig::from_env(),
            admin_seed: AdminSeedConfig::from_env(),
            rate_limit: parse_bool_env("RATE_LIMIT", true)?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            log_format: parse_env("LOG_FORMAT", "text")?,
        })
    }

    /// Configuration for local runs and tests: memory storage, no mail
    /// relay, no review provider, no rate limiting.
    #[must_use]
    pub fn local(secret_key: SecretString, upload_dir: PathBuf) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://localhost:5000".to_string(),
            secret_key,
            debug: true,
            storage: StorageBackend::Memory,
            database_url: None,
            static_dir: PathBuf::from("crates/site/static"),
            uploads: UploadConfig {
                dir: upload_dir,
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            mail: MailConfig {
                server: "localhost".to_string(),
                port: 25,
                use_tls: false,
                use_ssl: false,
                username: None,
                password: None,
                default_sender: Some("FS Eletromcz <site@localhost>".to_string()),
                contact_recipient: Some("contato@localhost".to_string()),
            },
            reviews: ReviewsConfig::default(),
            admin_seed: AdminSeedConfig {
                username: "admin".to_string(),
                password: None,
            },
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            log_format: LogFormat::Text,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dir: PathBuf::from(get_env_or_default(
                "UPLOAD_DIR",
                "crates/site/static/uploads",
            )),
            max_bytes: parse_env("MAX_UPLOAD_BYTES", "16777216")?,
        })
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let username = get_optional_env("MAIL_USERNAME");
        let default_sender = get_optional_env("MAIL_DEFAULT_SENDER")
            .or_else(|| username.as_ref().map(|u| format!("FS Eletromcz <{u}>")));
        let contact_recipient = get_optional_env("CONTACT_RECIPIENT").or_else(|| username.clone());

        Ok(Self {
            server: get_env_or_default("MAIL_SERVER", "smtp.gmail.com"),
            port: parse_env("MAIL_PORT", "587")?,
            use_tls: parse_bool_env("MAIL_USE_TLS", true)?,
            use_ssl: parse_bool_env("MAIL_USE_SSL", false)?,
            username,
            password: get_optional_env("MAIL_PASSWORD").map(SecretString::from),
            default_sender,
            contact_recipient,
        })
    }
}

impl ReviewsConfig {
    fn from_env() -> Self {
        Self {
            place_id: get_optional_env("GOOGLE_PLACE_ID"),
            api_key: get_optional_env("GOOGLE_PLACES_API_KEY").map(SecretString::from),
        }
    }
}

impl AdminSeedConfig {
    fn from_env() -> Self {
        Self {
            username: get_env_or_default("ADMIN_USERNAME", "admin"),
            password: get_optional_env("ADMIN_PASSWORD").map(SecretString::from),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true`/`1`/`t`/`yes`/`on`, `false`/`0`/`f`/`no`/`off`).
fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| {
        parse_bool(&value)
            .ok_or_else(|| ConfigError::InvalidEnvVar(key.to_string(), value.clone()))
    })
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "t" | "yes" | "on" => Some(true),
        "false" | "0" | "f" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate that the secret key meets minimum length requirements.
fn validate_secret_key(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SECRET_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SECRET_KEY_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        SiteConfig::local(
            SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"),
            PathBuf::from("/tmp/uploads"),
        )
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_rejects_flask_default() {
        let result = validate_secret_strength("you-will-never-guess", "SECRET_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(40), "SECRET_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "SECRET_KEY").is_ok());
    }

    #[test]
    fn test_validate_secret_key_length() {
        assert!(validate_secret_key(&SecretString::from("short"), "SECRET_KEY").is_err());
        assert!(validate_secret_key(&SecretString::from("k".repeat(32)), "SECRET_KEY").is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("t"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!(
            "Postgres".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn test_is_https() {
        let mut config = test_config();
        assert!(!config.is_https());
        config.base_url = "https://fseletromcz.com.br".to_string();
        assert!(config.is_https());
    }

    #[test]
    fn test_mail_config_debug_redacts_password() {
        let mut mail = test_config().mail;
        mail.password = Some(SecretString::from("smtp-app-password-value"));
        let debug_output = format!("{mail:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("smtp-app-password-value"));
    }

    #[test]
    fn test_reviews_config_debug_redacts_key() {
        let reviews = ReviewsConfig {
            place_id: Some("ChIJplace".to_string()),
            api_key: Some(SecretString::from("AIzaSyKeyValue")),
        };
        let debug_output = format!("{reviews:?}");
        assert!(debug_output.contains("ChIJplace"));
        assert!(!debug_output.contains("AIzaSyKeyValue"));
    }
}
