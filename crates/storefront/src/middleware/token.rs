//! Visitor token bootstrap.
//!
//! Every page request needs a Wix refresh token. When the `refreshToken`
//! cookie is missing or unreadable, anonymous visitor tokens are requested
//! (exactly once per request) and written back as a 30-day cookie. Provider
//! failures are logged, flagged with an `authError` cookie, and the request
//! is served without a token.
//!
//! The token is placed in request extensions; handlers read it with the
//! [`Visitor`] and [`RequireMember`] extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use tracing::{debug, error, warn};

use crate::state::AppState;
use crate::wix::{AccessToken, RefreshToken};

/// Cookie holding the JSON-encoded refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Cookie flagging a failed visitor token request.
pub const AUTH_ERROR_COOKIE: &str = "authError";

/// Message stored in the `authError` cookie.
pub const AUTH_ERROR_MESSAGE: &str = "Failed to generate visitor tokens";

const VISITOR_COOKIE_DAYS: i64 = 30;
const MEMBER_COOKIE_DAYS: i64 = 2;
const AUTH_ERROR_COOKIE_HOURS: i64 = 1;

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Read the refresh token from the request's `Cookie` headers.
#[must_use]
pub fn refresh_token_from_headers(headers: &HeaderMap) -> Option<RefreshToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == REFRESH_TOKEN_COOKIE)
        .and_then(|cookie| {
            let decoded = urlencoding::decode(cookie.value()).ok()?;
            serde_json::from_str::<RefreshToken>(&decoded)
                .inspect_err(|e| debug!("Unreadable refresh token cookie: {e}"))
                .ok()
        })
        .filter(|token| !token.value.is_empty())
}

fn refresh_cookie(
    token: &RefreshToken,
    max_age: Duration,
    same_site: SameSite,
    secure: bool,
) -> Option<Cookie<'static>> {
    let json = serde_json::to_string(token)
        .inspect_err(|e| error!("Failed to encode refresh token: {e}"))
        .ok()?;
    Some(
        Cookie::build((REFRESH_TOKEN_COOKIE, urlencoding::encode(&json).into_owned()))
            .path("/")
            .http_only(true)
            .secure(secure)
            .same_site(same_site)
            .max_age(max_age)
            .build(),
    )
}

/// `Set-Cookie` value for a visitor token (30 days, `SameSite=Strict`).
#[must_use]
pub fn visitor_cookie(token: &RefreshToken, secure: bool) -> Option<HeaderValue> {
    refresh_cookie(
        token,
        Duration::days(VISITOR_COOKIE_DAYS),
        SameSite::Strict,
        secure,
    )
    .and_then(|c| HeaderValue::from_str(&c.to_string()).ok())
}

/// `Set-Cookie` value for a member token (2 days, `SameSite=Lax`).
#[must_use]
pub fn member_cookie(token: &RefreshToken, secure: bool) -> Option<HeaderValue> {
    refresh_cookie(
        token,
        Duration::days(MEMBER_COOKIE_DAYS),
        SameSite::Lax,
        secure,
    )
    .and_then(|c| HeaderValue::from_str(&c.to_string()).ok())
}

/// `Set-Cookie` value that deletes the refresh token.
#[must_use]
pub fn clear_refresh_cookie() -> HeaderValue {
    HeaderValue::from_static("refreshToken=; Path=/; Max-Age=0; HttpOnly")
}

fn auth_error_cookie(secure: bool) -> Option<HeaderValue> {
    let cookie = Cookie::build((
        AUTH_ERROR_COOKIE,
        urlencoding::encode(AUTH_ERROR_MESSAGE).into_owned(),
    ))
    .path("/")
    .http_only(true)
    .secure(secure)
    .same_site(SameSite::Strict)
    .max_age(Duration::hours(AUTH_ERROR_COOKIE_HOURS))
    .build();
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Whether the handler already wrote a refresh token cookie (login/logout).
fn sets_refresh_cookie(response: &Response) -> bool {
    let prefix = format!("{REFRESH_TOKEN_COOKIE}=");
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}

// =============================================================================
// Middleware
// =============================================================================

/// Ensure the request carries a refresh token, requesting visitor tokens if needed.
pub async fn token_bootstrap_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = refresh_token_from_headers(request.headers()) {
        request.extensions_mut().insert(token);
        return next.run(request).await;
    }

    let secure = state.config().secure_cookies();

    match state.wix().generate_visitor_tokens().await {
        Ok(tokens) => {
            debug!("Issued visitor tokens");
            request.extensions_mut().insert(tokens.refresh_token.clone());
            let mut response = next.run(request).await;
            if !sets_refresh_cookie(&response)
                && let Some(cookie) = visitor_cookie(&tokens.refresh_token, secure)
            {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response
        }
        Err(e) => {
            error!(
                client_id = %state.wix().client_id(),
                error = %e,
                "Failed to generate visitor tokens"
            );
            let mut response = next.run(request).await;
            if let Some(cookie) = auth_error_cookie(secure) {
                response.headers_mut().append(header::SET_COOKIE, cookie);
            }
            response
        }
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// The refresh token for this request, if bootstrap succeeded.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Visitor(token): Visitor) -> impl IntoResponse {
///     match token {
///         Some(t) if t.is_member() => "Welcome back",
///         _ => "Hello, guest",
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Visitor(pub Option<RefreshToken>);

impl Visitor {
    /// Whether the token belongs to a logged-in member.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.0.as_ref().is_some_and(RefreshToken::is_member)
    }

    /// Exchange the refresh token for an access token.
    ///
    /// Returns `None` (after logging) when there is no token or the exchange fails.
    pub async fn access_token(&self, state: &AppState) -> Option<AccessToken> {
        let refresh = self.0.as_ref()?;
        state
            .wix()
            .access_token(refresh)
            .await
            .inspect_err(|e| warn!("Access token exchange failed: {e}"))
            .ok()
    }
}

impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<RefreshToken>().cloned()))
    }
}

/// Extractor that requires a logged-in member and yields their tokens.
///
/// Visitors are redirected to the login page.
pub struct RequireMember {
    pub refresh: RefreshToken,
    pub access: AccessToken,
}

/// Rejection when a member token is required.
pub enum MemberRejection {
    /// No member token; send the visitor to log in.
    RedirectToLogin,
}

impl IntoResponse for MemberRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireMember {
    type Rejection = MemberRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let refresh = parts
            .extensions
            .get::<RefreshToken>()
            .filter(|t| t.is_member())
            .cloned()
            .ok_or(MemberRejection::RedirectToLogin)?;

        let access = state.wix().access_token(&refresh).await.map_err(|e| {
            warn!("Member token exchange failed: {e}");
            MemberRejection::RedirectToLogin
        })?;

        Ok(Self { refresh, access })
    }
}
