//! Core types for the site.

pub mod id;
pub mod price;
pub mod slug;

pub use id::*;
pub use price::{Price, PriceError};
pub use slug::{Slug, SlugError, slugify};
