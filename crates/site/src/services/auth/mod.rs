//! Authentication service.
//!
//! Password verification against Argon2 hashes, admin account creation and
//! the first-boot administrator seed.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;

use crate::config::AdminSeedConfig;
use crate::db::{RepositoryError, UserRepository};
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum username length (matches the `users.username` column).
const MAX_USERNAME_LENGTH: usize = 80;

/// Verify a username and password.
///
/// Unknown users and wrong passwords produce the same error so the login
/// form cannot be used to probe for accounts.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
pub async fn authenticate(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let Some(user) = users.find_by_username(username.trim()).await? else {
        // Hash anyway so both paths take comparable time.
        let _ = hash_password(password);
        return Err(AuthError::InvalidCredentials);
    };

    verify_password(password, &user.password_hash)?;

    Ok(user)
}

/// Create an administrator account.
///
/// # Errors
///
/// Returns `AuthError::InvalidUsername` or `AuthError::WeakPassword` on bad
/// input, and `AuthError::UserAlreadyExists` if the username is taken.
pub async fn create_admin(
    users: &dyn UserRepository,
    username: &str,
    password: &str,
) -> Result<User, AuthError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "must be 1-{MAX_USERNAME_LENGTH} characters"
        )));
    }
    validate_password(password)?;

    let password_hash = hash_password(password)?;

    users
        .create(NewUser {
            username: username.to_string(),
            password_hash,
            is_admin: true,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })
}

/// Create the configured administrator when no user exists yet.
///
/// Returns the new user, or `None` when users already exist or no password
/// is configured.
///
/// # Errors
///
/// Returns an error if the repository fails or the configured credentials
/// are rejected.
pub async fn seed_admin(
    users: &dyn UserRepository,
    seed: &AdminSeedConfig,
) -> Result<Option<User>, AuthError> {
    if users.count().await? > 0 {
        return Ok(None);
    }

    let Some(password) = &seed.password else {
        tracing::warn!(
            "No users exist and ADMIN_PASSWORD is not set; \
             create an administrator with `fs-cli admin create`"
        );
        return Ok(None);
    };

    let user = create_admin(users, &seed.username, password.expose_secret()).await?;
    tracing::info!(username = %user.username, "Created initial administrator");
    Ok(Some(user))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password doesn't match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
