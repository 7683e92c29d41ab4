//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded in the span and Sentry scope)
//! 4. Security headers (CSP, frame and MIME protections)
//! 5. Session layer (tower-sessions, signed cookie)
//! 6. Rate limiting (governor, login and contact routes only)
//!
//! Admin routes add the [`RequireAdmin`] extractor on top.

pub mod auth;
pub mod flash;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{RequireAdmin, clear_current_user, safe_next, set_current_user};
pub use rate_limit::{contact_rate_limiter, login_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
