//! Cart add/remove through HTTP, with the snapshot kept in the session.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use mon_integration_tests::{TestContext, body_text, cart_response, cookies_from};
use serde_json::json;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{body_partial_json, header as header_is, method, path},
};

const ADD_PATH: &str = "/ecom/v1/carts/current/add-to-cart";
const REMOVE_PATH: &str = "/ecom/v1/carts/current/remove-line-items";

fn form_post(uri: &str, cookies: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookies)
        .header("HX-Request", "true")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// First visit, returning the cookies to send afterwards.
async fn start_session(ctx: &TestContext) -> String {
    ctx.mock_visitor_tokens().await;
    let response = ctx
        .send(Request::get("/about-us").body(Body::empty()).unwrap())
        .await;
    cookies_from(response.headers())
}

/// Cookies after a response, keeping ones it did not replace.
fn merge_cookies(previous: &str, response_cookies: &str) -> String {
    if response_cookies.is_empty() {
        return previous.to_string();
    }
    let replaced: Vec<&str> = response_cookies
        .split("; ")
        .filter_map(|pair| pair.split('=').next())
        .collect();
    previous
        .split("; ")
        .filter(|pair| pair.split('=').next().is_some_and(|name| !replaced.contains(&name)))
        .chain(response_cookies.split("; "))
        .collect::<Vec<_>>()
        .join("; ")
}

async fn cart_count(ctx: &TestContext, cookies: &str) -> String {
    let response = ctx
        .send(
            Request::get("/cart/count")
                .header(header::COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_text(response).await
}

#[tokio::test]
async fn test_add_item_updates_badge_and_session() {
    let ctx = TestContext::new().await;
    let cookies = start_session(&ctx).await;

    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .and(header_is("Authorization", "visitor-access"))
        .and(body_partial_json(json!({
            "lineItems": [{
                "catalogReference": {"catalogItemId": "ring"},
                "quantity": 2
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_response(&[(
            "line-1", "ring", "Pearl Ring", "250", 2,
        )])))
        .expect(1)
        .mount(&ctx.wix)
        .await;

    let response = ctx
        .send(form_post("/cart/add", &cookies, "product_id=ring&quantity=2"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("HX-Trigger").unwrap(), "cart-updated");
    let cookies = merge_cookies(&cookies, &cookies_from(response.headers()));
    assert!(body_text(response).await.contains(">1</span>"));

    // One line item, read back from the session without calling Wix.
    assert!(cart_count(&ctx, &cookies).await.contains(">1</span>"));
}

#[tokio::test]
async fn test_failed_remove_keeps_snapshot() {
    let ctx = TestContext::new().await;
    let cookies = start_session(&ctx).await;

    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_response(&[
            ("line-1", "ring", "Pearl Ring", "250", 1),
            ("line-2", "hoops", "Gold Hoops", "120", 1),
        ])))
        .mount(&ctx.wix)
        .await;
    Mock::given(method("POST"))
        .and(path(REMOVE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("unavailable"))
        .mount(&ctx.wix)
        .await;

    let added = ctx
        .send(form_post("/cart/add", &cookies, "product_id=hoops"))
        .await;
    assert_eq!(added.status(), StatusCode::OK);
    let cookies = merge_cookies(&cookies, &cookies_from(added.headers()));

    let removed = ctx
        .send(form_post("/cart/remove", &cookies, "item_id=line-1"))
        .await;
    assert_eq!(removed.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(removed).await.contains("Failed to remove item from cart"));

    assert!(cart_count(&ctx, &cookies).await.contains(">2</span>"));
}

#[tokio::test]
async fn test_remove_returns_items_fragment() {
    let ctx = TestContext::new().await;
    let cookies = start_session(&ctx).await;

    Mock::given(method("POST"))
        .and(path(REMOVE_PATH))
        .and(body_partial_json(json!({"lineItemIds": ["line-1"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_response(&[(
            "line-2", "hoops", "Gold Hoops", "120", 3,
        )])))
        .expect(1)
        .mount(&ctx.wix)
        .await;

    let response = ctx
        .send(form_post("/cart/remove", &cookies, "item_id=line-1"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("id=\"cart-items\""));
    assert!(body.contains("Gold Hoops"));
    assert!(body.contains("R360.00"));
}

#[tokio::test]
async fn test_plain_form_add_redirects_to_cart() {
    let ctx = TestContext::new().await;
    let cookies = start_session(&ctx).await;

    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_response(&[(
            "line-1", "ring", "Pearl Ring", "250", 1,
        )])))
        .mount(&ctx.wix)
        .await;

    let request = Request::post("/cart/add")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookies)
        .body(Body::from("product_id=ring"))
        .unwrap();
    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/cart");
}

#[tokio::test]
async fn test_logout_deletes_cart_session() {
    let ctx = TestContext::new().await;
    let cookies = start_session(&ctx).await;

    Mock::given(method("POST"))
        .and(path(ADD_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_response(&[(
            "line-1", "ring", "Pearl Ring", "250", 1,
        )])))
        .mount(&ctx.wix)
        .await;

    let added = ctx
        .send(form_post("/cart/add", &cookies, "product_id=ring"))
        .await;
    assert_eq!(added.status(), StatusCode::OK);
    let cookies = merge_cookies(&cookies, &cookies_from(added.headers()));
    assert!(cart_count(&ctx, &cookies).await.contains(">1</span>"));

    let logged_out = ctx
        .send(
            Request::post("/logout")
                .header(header::COOKIE, &cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(logged_out.status(), StatusCode::SEE_OTHER);
    let session_removed = logged_out
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("mon_session=;"));
    assert!(session_removed);

    // The old session id no longer resolves to a stored cart.
    assert!(cart_count(&ctx, &cookies).await.contains(">0</span>"));
}
