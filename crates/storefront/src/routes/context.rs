//! Values every full page needs for the base layout.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::cart::CartStore;
use crate::middleware::CspNonce;
use crate::wix::RefreshToken;

/// Layout context: CSP nonce, header cart badge, and login state.
///
/// The cart count comes from the persisted store, so rendering the header
/// never calls Wix. Handlers that refresh the cart should overwrite
/// `cart_count` with the new counter.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    pub cart_count: usize,
    pub is_member: bool,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let is_member = parts
            .extensions
            .get::<RefreshToken>()
            .is_some_and(RefreshToken::is_member);

        let cart_count = match Session::from_request_parts(parts, state).await {
            Ok(session) => CartStore::load(&session).await.counter(),
            Err(_) => 0,
        };

        Ok(Self {
            nonce,
            cart_count,
            is_member,
        })
    }
}
