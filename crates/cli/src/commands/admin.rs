//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! fs-cli admin create -u admin -p 'uma-senha-forte'
//! ADMIN_PASSWORD='uma-senha-forte' fs-cli admin create -u admin
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_PASSWORD` - Password when `-p` is not given

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use eletromcz_site::db::PgUserRepository;
use eletromcz_site::services::auth::{AuthError, create_admin};

use super::migrate::{MigrationError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Neither `-p` nor `ADMIN_PASSWORD` was given.
    #[error("No password given; pass -p or set ADMIN_PASSWORD")]
    MissingPassword,

    /// Database connection error.
    #[error(transparent)]
    Connect(#[from] MigrationError),

    /// Account rejected (weak password, taken username, ...).
    #[error("Failed to create admin: {0}")]
    Auth(#[from] AuthError),
}

/// Create a new administrator.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if no password is available, the database is
/// unreachable, or the account is rejected.
pub async fn create_user(username: &str, password: Option<String>) -> Result<i32, AdminError> {
    dotenvy::dotenv().ok();

    let password: SecretString = password
        .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or(AdminError::MissingPassword)?;

    let pool = connect().await?;
    let users = PgUserRepository::new(pool);

    tracing::info!("Creating admin user: {}", username);
    let user = create_admin(&users, username, password.expose_secret()).await?;

    tracing::info!("Admin user created with ID: {}", user.id);
    Ok(user.id.as_i32())
}
