//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /list                   - Product listing (?cat,name,min,max,type,sort,page)
//! GET  /deals                  - New arrivals listing
//! GET  /products/{slug}        - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/checkout          - Redirect to Wix hosted checkout
//!
//! # Payment
//! GET  /checkout               - Manual payment instructions
//! GET  /upload-proof           - Proof of payment form
//! POST /upload-proof           - Proof of payment upload (single PDF)
//! GET  /success                - Thank-you page after hosted checkout
//!
//! # Auth
//! GET  /login                  - Login page (?mode=login|register|reset|verify)
//! POST /login                  - Login, sign-up, reset or verify action
//! POST /logout                 - Logout action
//!
//! # Profile (requires member token)
//! GET  /profile                - Profile and order history
//! POST /profile                - Update profile
//!
//! # Static
//! GET  /about-us               - About page
//! ```

pub mod auth;
pub mod cart;
pub mod context;
pub mod home;
pub mod pages;
pub mod products;
pub mod profile;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{
    create_session_layer, csp_nonce_middleware, request_id_middleware,
    security_headers_middleware, token_bootstrap_middleware,
};
use crate::state::AppState;

pub use context::PageContext;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/checkout", post(cart::checkout))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(pages::checkout))
        .route(
            "/upload-proof",
            get(pages::upload_proof_page)
                .post(pages::upload_proof)
                .layer(pages::upload_body_limit()),
        )
        .route("/success", get(pages::success))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create all page routes for the storefront.
///
/// Every page route needs a Wix refresh token, so the token bootstrap
/// middleware wraps this router.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Product routes
        .route("/list", get(products::list))
        .route("/deals", get(products::deals))
        .route("/products/{slug}", get(products::show))
        // Cart routes
        .nest("/cart", cart_routes())
        // Payment pages
        .merge(payment_routes())
        // Auth routes
        .merge(auth_routes())
        // Profile routes
        .route("/profile", get(profile::show).post(profile::update))
        // Static pages
        .route("/about-us", get(pages::about))
        .layer(from_fn_with_state(state, token_bootstrap_middleware))
}

/// Build the full application with its middleware stack.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes(state.clone()))
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(csp_nonce_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Wix.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::StorefrontConfig;

    fn test_state() -> AppState {
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "WIX_CLIENT_ID" => Some("client-1".to_string()),
            // Nothing listens here; token requests fail fast.
            "WIX_API_BASE_URL" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_health_skips_token_bootstrap() {
        let response = app(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookies: Vec<_> = response.headers().get_all(header::SET_COOKIE).iter().collect();
        assert!(cookies.is_empty());
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("content-security-policy"));
    }

    #[tokio::test]
    async fn test_profile_redirects_visitors_to_login() {
        let response = app(test_state())
            .oneshot(Request::get("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        // Provider unreachable: flagged, not fatal.
        let flagged = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .any(|v| v.to_str().unwrap().starts_with("authError="));
        assert!(flagged);
    }
}
