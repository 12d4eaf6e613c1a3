//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for inline scripts)
//! 5. Security headers (CSP, frame options, etc.)
//! 6. Session layer (tower-sessions, in-memory store)
//! 7. Token bootstrap (ensure a Wix refresh token, page routes only)

pub mod csp;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod token;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use token::{
    AUTH_ERROR_COOKIE, REFRESH_TOKEN_COOKIE, RequireMember, Visitor, clear_refresh_cookie,
    member_cookie, token_bootstrap_middleware,
};
