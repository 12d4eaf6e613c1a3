//! Visitor token bootstrap through the full middleware stack.

#![allow(clippy::unwrap_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use mon_integration_tests::{TOKEN_PATH, TestContext, body_text, cookies_from, sets_cookie};
use wiremock::{Mock, ResponseTemplate, matchers::path};

#[tokio::test]
async fn test_first_visit_requests_visitor_tokens_once() {
    let ctx = TestContext::new().await;
    ctx.mock_visitor_tokens().await;

    let response = ctx
        .send(Request::get("/about-us").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sets_cookie(response.headers(), "refreshToken"));
    assert_eq!(ctx.requests_to(TOKEN_PATH).await, 1);

    let set_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("refreshToken="))
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Max-Age=2592000"));
}

#[tokio::test]
async fn test_returning_visitor_reuses_cookie() {
    let ctx = TestContext::new().await;
    ctx.mock_visitor_tokens().await;

    let first = ctx
        .send(Request::get("/about-us").body(Body::empty()).unwrap())
        .await;
    let cookies = cookies_from(first.headers());

    let second = ctx
        .send(
            Request::get("/about-us")
                .header(header::COOKIE, cookies)
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(second.status(), StatusCode::OK);
    assert!(!sets_cookie(second.headers(), "refreshToken"));
    // Still only the first visit's request.
    assert_eq!(ctx.requests_to(TOKEN_PATH).await, 1);
}

#[tokio::test]
async fn test_token_failure_is_flagged_not_fatal() {
    let ctx = TestContext::new().await;
    Mock::given(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&ctx.wix)
        .await;

    let response = ctx
        .send(Request::get("/about-us").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sets_cookie(response.headers(), "authError"));
    assert!(!sets_cookie(response.headers(), "refreshToken"));
    assert!(body_text(response).await.contains("MON CLOTHING &amp; JEWELLERY"));
}

#[tokio::test]
async fn test_health_does_not_touch_wix() {
    let ctx = TestContext::new().await;
    ctx.mock_visitor_tokens().await;

    let response = ctx
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
    assert_eq!(ctx.requests_to(TOKEN_PATH).await, 0);
}
