//! Business logic services for the site.
//!
//! # Services
//!
//! - `auth` - Password verification and administrator accounts
//! - `blog` - Blog post CRUD, slugs and pagination
//! - `catalog` - Product CRUD
//! - `contact` - Contact form relay
//! - `email` - SMTP delivery
//! - `reviews` - Cached Google reviews
//! - `uploads` - Image files on disk
//! - `validation` - Per-field form errors

pub mod auth;
pub mod blog;
pub mod catalog;
pub mod contact;
pub mod email;
pub mod reviews;
pub mod uploads;
pub mod validation;
