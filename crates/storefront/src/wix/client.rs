//! Shared HTTP plumbing for the Wix REST APIs.
//!
//! Endpoint groups (auth, catalog, cart, members) add their methods to
//! [`WixClient`] in sibling modules; this module owns request execution and
//! status handling.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::WixConfig;
use crate::wix::WixError;
use crate::wix::types::AccessToken;

use super::cache::CacheValue;
use super::wire::ErrorBody;

// =============================================================================
// WixClient
// =============================================================================

/// Client for the Wix Headless REST APIs.
///
/// Cheap to clone. Catalog responses are cached for 5 minutes and access
/// tokens until shortly before they expire.
#[derive(Clone)]
pub struct WixClient {
    pub(super) inner: Arc<WixClientInner>,
}

pub(super) struct WixClientInner {
    pub(super) client: reqwest::Client,
    pub(super) base_url: String,
    pub(super) client_id: String,
    pub(super) app_id: String,
    pub(super) cache: Cache<String, CacheValue>,
    pub(super) tokens: Cache<String, AccessToken>,
}

impl WixClient {
    /// Create a new Wix API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &WixConfig) -> Result<Self, WixError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        // Wix access tokens live for 4 hours; expiry is re-checked on every hit.
        let tokens = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(4 * 60 * 60))
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(WixClientInner {
                client,
                base_url: config.api_base_url.clone(),
                client_id: config.client_id.clone(),
                app_id: config.app_id.clone(),
                cache,
                tokens,
            }),
        })
    }

    /// OAuth client ID of the headless project.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Catalog app ID used in cart catalog references.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.inner.app_id
    }

    fn request(&self, method: Method, path: &str, token: Option<&AccessToken>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self
            .inner
            .client
            .request(method, url)
            .header("Content-Type", "application/json");
        match token {
            Some(token) => builder.header("Authorization", token.expose()),
            None => builder,
        }
    }

    pub(super) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&AccessToken>,
    ) -> Result<T, WixError> {
        self.execute(path, self.request(Method::GET, path, token))
            .await
    }

    pub(super) async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<T, WixError> {
        self.execute(path, self.request(Method::POST, path, token).json(body))
            .await
    }

    pub(super) async fn patch<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        token: Option<&AccessToken>,
    ) -> Result<T, WixError> {
        self.execute(path, self.request(Method::PATCH, path, token).json(body))
            .await
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<T, WixError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(WixError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WixError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            return Err(api_error(status, &response_text));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                path = %path,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Wix response"
            );
            WixError::Parse(e)
        })
    }
}

/// Build an [`WixError::Api`] from a non-success response body.
fn api_error(status: StatusCode, body: &str) -> WixError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed
        .details
        .and_then(|d| d.application_error)
        .map(|e| e.code)
        .filter(|c| !c.is_empty());

    let message = if parsed.message.is_empty() {
        body.chars().take(200).collect()
    } else {
        parsed.message
    };

    if status.is_server_error() {
        tracing::error!(status = %status, body = %body.chars().take(500).collect::<String>(), "Wix API returned server error");
    } else {
        tracing::warn!(status = %status, code = ?code, "Wix API rejected request");
    }

    WixError::Api {
        status: status.as_u16(),
        message,
        code,
    }
}
