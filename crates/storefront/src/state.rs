//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::wix::{WixClient, WixError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the Wix API client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    wix: WixClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wix HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, WixError> {
        let wix = WixClient::new(&config.wix)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, wix }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Wix API client.
    #[must_use]
    pub fn wix(&self) -> &WixClient {
        &self.inner.wix
    }

    /// Absolute URL for a path on this storefront.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.config.base_url)
    }
}
