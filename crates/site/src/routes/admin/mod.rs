//! Admin panel route handlers.
//!
//! Everything except the login page takes [`RequireAdmin`]. Mutations use
//! POST; forms carrying an image are multipart.
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

pub mod auth;
pub mod blog;
pub mod dashboard;
pub mod products;
pub mod upload;
