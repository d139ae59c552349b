//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Rate limiting on `/auth` (governor)
//!
//! Bearer authentication is an extractor ([`RequireBearer`]) rather than a
//! layer so the health check stays open.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::RequireBearer;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
