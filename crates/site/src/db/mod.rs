//! Persistence for users, products and blog posts.
//!
//! # Backends
//!
//! Each record type has a repository trait with two implementations:
//!
//! - `PostgreSQL` (`users`, `products`, `blog_posts` modules) - production
//! - in-memory ([`memory`]) - local development and tests
//!
//! Handlers only see `Arc<dyn ...Repository>` through [`Repositories`], so the
//! backend is chosen once at startup from `SITE_STORAGE`.
//!
//! # Tables
//!
//! - `users` - Admin panel accounts
//! - `products` - Shop catalog
//! - `blog_posts` - Blog articles
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/site/migrations/` and run via:
//! ```bash
//! cargo run -p eletromcz-cli -- migrate
//! ```

pub mod blog_posts;
pub mod memory;
pub mod products;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use eletromcz_core::{BlogPostId, ProductId, Slug, UserId};

use crate::models::{BlogPost, BlogPostFields, NewUser, Product, ProductFields, User};

pub use blog_posts::PgBlogPostRepository;
pub use products::PgProductRepository;
pub use users::PgUserRepository;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Admin panel accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by login name.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by ID.
    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Insert a user. `Conflict` when the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Number of users.
    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Shop catalog.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Active products, newest first.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;

    /// All products, newest first.
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, fields: &ProductFields) -> Result<Product, RepositoryError>;

    /// Overwrite every editable column. `NotFound` for an unknown ID.
    async fn update(
        &self,
        id: ProductId,
        fields: &ProductFields,
    ) -> Result<Product, RepositoryError>;

    /// Delete and return the removed row. `NotFound` for an unknown ID.
    async fn delete(&self, id: ProductId) -> Result<Product, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;

    async fn count_active(&self) -> Result<i64, RepositoryError>;
}

/// Blog articles.
#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// Published posts, newest first.
    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<BlogPost>, RepositoryError>;

    /// Published posts other than `exclude`, newest first.
    async fn list_recent_published(
        &self,
        exclude: BlogPostId,
        limit: i64,
    ) -> Result<Vec<BlogPost>, RepositoryError>;

    /// All posts, newest first.
    async fn list_all(&self) -> Result<Vec<BlogPost>, RepositoryError>;

    async fn find(&self, id: BlogPostId) -> Result<Option<BlogPost>, RepositoryError>;

    async fn find_by_slug(&self, slug: &Slug) -> Result<Option<BlogPost>, RepositoryError>;

    /// Whether another post already uses `slug`.
    async fn slug_exists(
        &self,
        slug: &Slug,
        exclude: Option<BlogPostId>,
    ) -> Result<bool, RepositoryError>;

    /// Insert a post. `Conflict` when the slug is taken.
    async fn create(
        &self,
        fields: &BlogPostFields,
        author_id: Option<UserId>,
    ) -> Result<BlogPost, RepositoryError>;

    /// Overwrite every editable column and bump `updated_at`.
    async fn update(
        &self,
        id: BlogPostId,
        fields: &BlogPostFields,
    ) -> Result<BlogPost, RepositoryError>;

    /// Delete and return the removed row. `NotFound` for an unknown ID.
    async fn delete(&self, id: BlogPostId) -> Result<BlogPost, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;

    async fn count_published(&self) -> Result<i64, RepositoryError>;
}

/// The repositories handed to `AppState`.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub blog_posts: Arc<dyn BlogPostRepository>,
}

impl Repositories {
    /// `PostgreSQL` repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            products: Arc::new(PgProductRepository::new(pool.clone())),
            blog_posts: Arc::new(PgBlogPostRepository::new(pool.clone())),
        }
    }

    /// Empty in-memory repositories.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserRepository::default()),
            products: Arc::new(memory::MemoryProductRepository::default()),
            blog_posts: Arc::new(memory::MemoryBlogPostRepository::default()),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
