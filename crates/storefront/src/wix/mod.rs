//! Wix Headless REST API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`; request/response bodies live in `wire.rs`
//!   and are converted to the domain types in `types.rs`
//! - Wix is source of truth - NO local sync, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL) and
//!   for access tokens (until shortly before expiry)
//!
//! # APIs
//!
//! ## OAuth
//! - Anonymous visitor tokens, refresh-token exchange, member tokens
//!
//! ## eCommerce
//! - Current cart, checkout creation, order search
//!
//! ## Stores Reader
//! - Products and collections
//!
//! ## Members / IAM
//! - Login, registration, verification, password reset, profile
//!
//! # Example
//!
//! ```rust,ignore
//! use mon_storefront::wix::WixClient;
//!
//! let client = WixClient::new(&config.wix);
//!
//! let tokens = client.generate_visitor_tokens().await?;
//! let product = client.get_product_by_slug("gold-hoops").await?;
//! ```

mod auth;
mod cache;
mod cart;
mod catalog;
mod client;
mod conversions;
pub mod media;
mod members;
pub mod types;
mod wire;

pub use catalog::{DEFAULT_LIMIT, DEFAULT_MAX_PRICE, ProductQuery};
pub use client::WixClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Wix APIs.
#[derive(Debug, Error)]
pub enum WixError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {}", format_api_error(message, code.as_deref()))]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Wix.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Token exchange or member authentication failed.
    #[error("Authentication error: {0}")]
    Auth(String),
}

impl WixError {
    /// Application error code attached by Wix, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

fn format_api_error(message: &str, code: Option<&str>) -> String {
    let message = if message.is_empty() {
        "(no error details provided)"
    } else {
        message
    };
    match code {
        Some(code) => format!("{message} [{code}]"),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wix_error_display() {
        let err = WixError::NotFound("product gold-hoops".to_string());
        assert_eq!(err.to_string(), "Not found: product gold-hoops");
    }

    #[test]
    fn test_api_error_with_code() {
        let err = WixError::Api {
            status: 400,
            message: "Bad credentials".to_string(),
            code: Some("-19976".to_string()),
        };
        assert_eq!(err.to_string(), "API error (400): Bad credentials [-19976]");
        assert_eq!(err.code(), Some("-19976"));
    }

    #[test]
    fn test_api_error_empty_message() {
        let err = WixError::Api {
            status: 500,
            message: String::new(),
            code: None,
        };
        assert_eq!(
            err.to_string(),
            "API error (500): (no error details provided)"
        );
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_rate_limited_error() {
        let err = WixError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}
