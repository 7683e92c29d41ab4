//! Domain models for the site.
//!
//! Row types double as domain types: every column maps to a validated core
//! type (`Price`, `Slug`, typed IDs), so `sqlx::FromRow` yields values that
//! already satisfy the invariants.

pub mod blog_post;
pub mod product;
pub mod session;
pub mod user;

pub use blog_post::{BlogPost, BlogPostFields};
pub use product::{Product, ProductFields};
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::{NewUser, User};
