//! Integration tests for the MON storefront.
//!
//! Tests drive the full router (middleware stack included) with
//! `tower::ServiceExt::oneshot`, against a `wiremock` server standing in
//! for the Wix REST APIs. No network access or credentials are needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mon-integration-tests
//! ```

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, Response, header},
};
use mon_storefront::{config::StorefrontConfig, routes, state::AppState};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

/// Path of the Wix OAuth token endpoint.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Storefront wired to a mock Wix server.
pub struct TestContext {
    pub wix: MockServer,
    pub app: Router,
}

impl TestContext {
    /// Start a mock Wix server and build the storefront against it.
    ///
    /// # Panics
    ///
    /// Panics if the test configuration is rejected.
    pub async fn new() -> Self {
        let wix = MockServer::start().await;
        let base_url = wix.uri();
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "WIX_CLIENT_ID" => Some("test-client".to_string()),
            "WIX_API_BASE_URL" => Some(base_url.clone()),
            "FEATURED_PRODUCTS_FEATURED_CATEGORY_ID" => Some("featured".to_string()),
            _ => None,
        })
        .expect("valid test configuration");
        let state = AppState::new(config).expect("application state");

        Self {
            wix,
            app: routes::app(state),
        }
    }

    /// Send one request through the app.
    ///
    /// The router is cloned so sessions persist across calls.
    ///
    /// # Panics
    ///
    /// Panics if the router fails, which it never does for valid requests.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Answer anonymous token grants with visitor tokens.
    pub async fn mock_visitor_tokens(&self) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_partial_json(json!({"grantType": "anonymous"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_response("visitor")))
            .mount(&self.wix)
            .await;
    }

    /// Number of requests the mock Wix server received at `endpoint`.
    ///
    /// # Panics
    ///
    /// Panics if request recording is disabled.
    pub async fn requests_to(&self, endpoint: &str) -> usize {
        self.wix
            .received_requests()
            .await
            .expect("request recording enabled")
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count()
    }
}

/// OAuth token response with a `{prefix}-access` / `{prefix}-refresh` pair.
#[must_use]
pub fn token_response(prefix: &str) -> Value {
    json!({
        "access_token": format!("{prefix}-access"),
        "refresh_token": format!("{prefix}-refresh"),
        "expires_in": 14_400,
        "token_type": "Bearer"
    })
}

/// Cart response holding one line per `(line id, product id, name, amount, quantity)`.
#[must_use]
pub fn cart_response(lines: &[(&str, &str, &str, &str, u32)]) -> Value {
    let line_items: Vec<Value> = lines
        .iter()
        .map(|(id, product_id, name, amount, quantity)| {
            json!({
                "id": id,
                "quantity": quantity,
                "catalogReference": {
                    "catalogItemId": product_id,
                    "appId": "215238eb-22a5-4c36-9e7b-e7c08025e04e"
                },
                "productName": {"original": name},
                "price": {"amount": amount}
            })
        })
        .collect();

    json!({
        "cart": {
            "id": "cart-1",
            "currency": "ZAR",
            "lineItems": line_items
        }
    })
}

/// `Cookie` header value carrying the `name=value` pairs a response set.
#[must_use]
pub fn cookies_from(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether a response sets the named cookie.
#[must_use]
pub fn sets_cookie(headers: &HeaderMap, name: &str) -> bool {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

/// Collect a response body as UTF-8.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
