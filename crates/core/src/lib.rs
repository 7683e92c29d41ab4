//! FS Eletromcz Core - Shared domain types.
//!
//! This crate provides the types shared by the site and the CLI:
//! - `site` - Public marketing site, catalog, blog and admin panel
//! - `cli` - Command-line tools for migrations and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, decimal prices and URL slugs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
