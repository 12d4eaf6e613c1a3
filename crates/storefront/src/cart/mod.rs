//! Per-visitor cart store.
//!
//! Holds the last cart snapshot returned by Wix along with the derived
//! line-item counter. Every successful operation replaces the snapshot
//! wholesale with the server's response; a failed operation leaves it
//! untouched. The store is persisted in the visitor's session under
//! [`CartStore::SESSION_KEY`] so the header badge renders without a
//! round-trip.
//!
//! There are no optimistic updates, retries or request de-duplication.
//! Concurrent operations from the same visitor resolve last-write-wins.

use std::future::Future;

use mon_core::{LineItemId, Price, ProductId, VariantId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{error, instrument};

use crate::wix::{AccessToken, Cart, LineItemInput, WixError};

/// Remote cart operations the store depends on.
pub trait CartService: Send + Sync {
    /// Fetch the visitor's current cart (empty when none exists).
    fn current_cart(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<Cart, WixError>> + Send;

    /// Add a line item and return the updated cart.
    fn add_line_item(
        &self,
        token: &AccessToken,
        item: LineItemInput,
    ) -> impl Future<Output = Result<Cart, WixError>> + Send;

    /// Remove a line item and return the updated cart.
    fn remove_line_item(
        &self,
        token: &AccessToken,
        line_item_id: &LineItemId,
    ) -> impl Future<Output = Result<Cart, WixError>> + Send;
}

/// Cart store errors. Display strings are shown to shoppers.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Failed to fetch cart")]
    Fetch(#[source] WixError),

    #[error("Failed to add item to cart")]
    Add(#[source] WixError),

    #[error("Failed to remove item from cart")]
    Remove(#[source] WixError),

    #[error("Cart session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Whether an operation is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CartStatus {
    #[default]
    Idle,
    Loading,
}

/// Last-known cart snapshot plus derived values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartStore {
    cart: Cart,
    counter: usize,
    #[serde(skip)]
    status: CartStatus,
}

impl CartStore {
    /// Session key the store is persisted under.
    pub const SESSION_KEY: &'static str = "cart-storage";

    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Number of line items in the snapshot.
    #[must_use]
    pub const fn counter(&self) -> usize {
        self.counter
    }

    /// Σ unit price × quantity over the snapshot.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.cart.subtotal()
    }

    /// Whether an operation is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == CartStatus::Loading
    }

    fn replace(&mut self, cart: Cart) {
        self.counter = cart.len();
        self.cart = cart;
    }

    /// Run `op`, replacing the snapshot on success.
    async fn run<F>(&mut self, op: F, wrap: fn(WixError) -> CartError) -> Result<(), CartError>
    where
        F: Future<Output = Result<Cart, WixError>> + Send,
    {
        self.status = CartStatus::Loading;
        let result = op.await;
        self.status = CartStatus::Idle;

        match result {
            Ok(cart) => {
                self.replace(cart);
                Ok(())
            }
            Err(e) => {
                let err = wrap(e);
                error!(error = ?err, "{err}");
                Err(err)
            }
        }
    }

    /// Refresh the snapshot from the remote cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Fetch`]; the previous snapshot is kept.
    #[instrument(skip_all)]
    pub async fn fetch<S: CartService>(
        &mut self,
        service: &S,
        token: &AccessToken,
    ) -> Result<(), CartError> {
        self.run(service.current_cart(token), CartError::Fetch)
            .await
    }

    /// Add `quantity` of a catalog item (and optional variant).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Add`]; the previous snapshot is kept.
    #[instrument(skip(self, service, token))]
    pub async fn add_item<S: CartService>(
        &mut self,
        service: &S,
        token: &AccessToken,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        quantity: u32,
    ) -> Result<(), CartError> {
        let item = LineItemInput {
            catalog_item_id: product_id,
            variant_id,
            quantity,
        };
        self.run(service.add_line_item(token, item), CartError::Add)
            .await
    }

    /// Remove a line item. Removing an id that is not in the cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Remove`]; the previous snapshot is kept.
    #[instrument(skip(self, service, token))]
    pub async fn remove_item<S: CartService>(
        &mut self,
        service: &S,
        token: &AccessToken,
        line_item_id: &LineItemId,
    ) -> Result<(), CartError> {
        self.run(
            service.remove_line_item(token, line_item_id),
            CartError::Remove,
        )
        .await
    }

    // =========================================================================
    // Session Persistence
    // =========================================================================

    /// Load the store from the session, or an empty one.
    pub async fn load(session: &Session) -> Self {
        match session.get::<Self>(Self::SESSION_KEY).await {
            Ok(Some(mut store)) => {
                store.counter = store.cart.len();
                store
            }
            Ok(None) => Self::new(),
            Err(e) => {
                tracing::warn!("Failed to load cart from session: {e}");
                Self::new()
            }
        }
    }

    /// Persist the store to the session.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Session`] if the session store fails.
    pub async fn save(&self, session: &Session) -> Result<(), CartError> {
        session.insert(Self::SESSION_KEY, self).await?;
        Ok(())
    }

    /// Drop the persisted store (on logout or token loss).
    ///
    /// The session holds nothing but the cart, so the whole record is
    /// deleted from the store rather than re-saved empty.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Session`] if the session store fails.
    pub async fn clear(session: &Session) -> Result<(), CartError> {
        session.flush().await?;
        Ok(())
    }
}
