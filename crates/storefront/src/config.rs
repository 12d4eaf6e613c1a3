//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `WIX_CLIENT_ID` - Wix Headless OAuth client ID
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `WIX_APP_ID` - Catalog app ID used in cart line items (default: Wix Stores)
//! - `WIX_API_BASE_URL` - API root (default: <https://www.wixapis.com>)
//! - `WIX_HTTP_TIMEOUT_SECS` - Outbound request timeout (default: 30)
//! - `FEATURED_PRODUCTS_FEATURED_CATEGORY_ID` - Collection shown on the home page
//! - `FEATURED_PRODUCTS_NEW_CATEGORY_ID` - Collection shown as new arrivals / deals
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// App ID of the Wix Stores catalog; cart line items reference products through it.
pub const WIX_STORES_APP_ID: &str = "1380b703-ce81-ff05-f115-39571d94dfcd";

const DEFAULT_WIX_API_BASE_URL: &str = "https://www.wixapis.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Wix Headless API configuration
    pub wix: WixConfig,
    /// Collections featured on listing pages
    pub catalog: CatalogConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Wix Headless API configuration.
#[derive(Debug, Clone)]
pub struct WixConfig {
    /// OAuth client ID of the headless project (public)
    pub client_id: String,
    /// Catalog app ID for cart catalog references
    pub app_id: String,
    /// API root without trailing slash
    pub api_base_url: String,
    /// Timeout applied to every outbound request
    pub timeout: Duration,
}

/// Catalog identifiers, consumed as opaque strings.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Collection for the "featured" grid on the home page
    pub featured_category_id: Option<String>,
    /// Collection for new arrivals and the deals page
    pub new_category_id: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parsed::<IpAddr>("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("STOREFRONT_PORT", "3000")?;
        let base_url = env
            .required("STOREFRONT_BASE_URL")?
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let wix = WixConfig {
            client_id: env.required("WIX_CLIENT_ID")?,
            app_id: env.or_default("WIX_APP_ID", WIX_STORES_APP_ID),
            api_base_url: env
                .or_default("WIX_API_BASE_URL", DEFAULT_WIX_API_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            timeout: Duration::from_secs(env.parsed::<u64>("WIX_HTTP_TIMEOUT_SECS", "30")?),
        };

        let catalog = CatalogConfig {
            featured_category_id: env.optional("FEATURED_PRODUCTS_FEATURED_CATEGORY_ID"),
            new_category_id: env.optional("FEATURED_PRODUCTS_NEW_CATEGORY_ID"),
        };

        Ok(Self {
            host,
            port,
            base_url,
            wix,
            catalog,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parsed::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get a variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| map.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("STOREFRONT_BASE_URL", "http://localhost:3000/"),
        ("WIX_CLIENT_ID", "5b9a2f3c-client"),
    ];

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.port, 3000);
        assert_eq!(config.wix.app_id, WIX_STORES_APP_ID);
        assert_eq!(config.wix.api_base_url, "https://www.wixapis.com");
        assert_eq!(config.wix.timeout, Duration::from_secs(30));
        assert!(config.catalog.featured_category_id.is_none());
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_missing_client_id() {
        let err = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "WIX_CLIENT_ID"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("WIX_CLIENT_ID", "  "),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("STOREFRONT_PORT", "not-a-port"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_PORT"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = load(&[
            ("STOREFRONT_BASE_URL", "not a url"),
            ("WIX_CLIENT_ID", "abc"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_https_base_url_enables_secure_cookies() {
        let config = load(&[
            ("STOREFRONT_BASE_URL", "https://mon.example"),
            ("WIX_CLIENT_ID", "abc"),
            ("FEATURED_PRODUCTS_NEW_CATEGORY_ID", "new-arrivals"),
        ])
        .unwrap();
        assert!(config.secure_cookies());
        assert_eq!(
            config.catalog.new_category_id.as_deref(),
            Some("new-arrivals")
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = load(MINIMAL).unwrap();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
