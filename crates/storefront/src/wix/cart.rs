//! eCommerce current cart, checkout and redirect endpoints.

use tracing::{debug, instrument};

use mon_core::{CheckoutId, LineItemId};

use crate::cart::CartService;
use crate::wix::WixError;
use crate::wix::types::{AccessToken, Cart, LineItemInput, RedirectCallbacks, RedirectSession};

use super::auth::REDIRECT_SESSION_PATH;
use super::client::WixClient;
use super::conversions::convert_cart;
use super::wire::{
    AddToCartLineItem, AddToCartRequest, Callbacks, CartResponse, CreateCheckoutRequest,
    CreateCheckoutResponse, EcomCheckout, RedirectSessionRequest, RedirectSessionResponse,
    RemoveLineItemsRequest, WireCatalogOptions, WireCatalogReference,
};

const CURRENT_CART_PATH: &str = "/ecom/v1/carts/current";
const ADD_TO_CART_PATH: &str = "/ecom/v1/carts/current/add-to-cart";
const REMOVE_LINE_ITEMS_PATH: &str = "/ecom/v1/carts/current/remove-line-items";
const CREATE_CHECKOUT_PATH: &str = "/ecom/v1/carts/current/create-checkout";

impl WixClient {
    /// Get the visitor's current cart. A missing cart is returned as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn get_current_cart(&self, token: &AccessToken) -> Result<Cart, WixError> {
        match self.get::<CartResponse>(CURRENT_CART_PATH, Some(token)).await {
            Ok(response) => Ok(convert_cart(response.cart)),
            Err(WixError::NotFound(_)) => {
                debug!("No current cart");
                Ok(Cart::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Add line items to the current cart, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_current_cart(
        &self,
        token: &AccessToken,
        items: &[LineItemInput],
    ) -> Result<Cart, WixError> {
        let body = AddToCartRequest {
            line_items: items
                .iter()
                .map(|item| AddToCartLineItem {
                    catalog_reference: WireCatalogReference {
                        catalog_item_id: item.catalog_item_id.to_string(),
                        app_id: self.app_id().to_string(),
                        options: item.variant_id.as_ref().map(|v| WireCatalogOptions {
                            variant_id: Some(v.to_string()),
                        }),
                    },
                    quantity: item.quantity,
                })
                .collect(),
        };
        let response: CartResponse = self.post(ADD_TO_CART_PATH, &body, Some(token)).await?;
        Ok(convert_cart(response.cart))
    }

    /// Remove line items from the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_line_items_from_current_cart(
        &self,
        token: &AccessToken,
        line_item_ids: &[LineItemId],
    ) -> Result<Cart, WixError> {
        let body = RemoveLineItemsRequest {
            line_item_ids: line_item_ids.iter().map(LineItemId::as_str).collect(),
        };
        let response: CartResponse = self
            .post(REMOVE_LINE_ITEMS_PATH, &body, Some(token))
            .await?;
        Ok(convert_cart(response.cart))
    }

    /// Create a checkout from the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is empty or the API request fails.
    #[instrument(skip_all)]
    pub async fn create_checkout_from_current_cart(
        &self,
        token: &AccessToken,
    ) -> Result<CheckoutId, WixError> {
        let body = CreateCheckoutRequest {
            channel_type: "WEB",
        };
        let response: CreateCheckoutResponse = self
            .post(CREATE_CHECKOUT_PATH, &body, Some(token))
            .await?;
        Ok(CheckoutId::new(response.checkout_id))
    }

    /// Create a redirect session to the hosted checkout page.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(checkout_id = %checkout_id))]
    pub async fn create_checkout_redirect(
        &self,
        token: &AccessToken,
        checkout_id: &CheckoutId,
        callbacks: &RedirectCallbacks,
    ) -> Result<RedirectSession, WixError> {
        let body = RedirectSessionRequest {
            ecom_checkout: Some(EcomCheckout {
                checkout_id: checkout_id.as_str(),
            }),
            logout: None,
            callbacks: Callbacks {
                post_flow_url: &callbacks.post_flow_url,
                thank_you_page_url: callbacks.thank_you_page_url.as_deref(),
            },
        };
        let response: RedirectSessionResponse = self
            .post(REDIRECT_SESSION_PATH, &body, Some(token))
            .await?;
        Ok(RedirectSession {
            id: response.redirect_session.id,
            full_url: response.redirect_session.full_url,
        })
    }
}

impl CartService for WixClient {
    async fn current_cart(&self, token: &AccessToken) -> Result<Cart, WixError> {
        self.get_current_cart(token).await
    }

    async fn add_line_item(
        &self,
        token: &AccessToken,
        item: LineItemInput,
    ) -> Result<Cart, WixError> {
        self.add_to_current_cart(token, std::slice::from_ref(&item))
            .await
    }

    async fn remove_line_item(
        &self,
        token: &AccessToken,
        line_item_id: &LineItemId,
    ) -> Result<Cart, WixError> {
        self.remove_line_items_from_current_cart(token, std::slice::from_ref(line_item_id))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use mon_core::{ProductId, VariantId};
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;
    use crate::config::WixConfig;

    fn client(server: &MockServer) -> WixClient {
        WixClient::new(&WixConfig {
            client_id: "client-1".to_string(),
            app_id: "stores-app".to_string(),
            api_base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn token() -> AccessToken {
        AccessToken::new("access-1", i64::MAX)
    }

    #[tokio::test]
    async fn test_missing_cart_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CURRENT_CART_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cart = client(&server).get_current_cart(&token()).await.unwrap();
        assert!(cart.line_items.is_empty());
        assert!(cart.id.is_none());
    }

    #[tokio::test]
    async fn test_add_sends_catalog_reference() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADD_TO_CART_PATH))
            .and(header("Authorization", "access-1"))
            .and(body_json(json!({
                "lineItems": [{
                    "catalogReference": {
                        "catalogItemId": "ring",
                        "appId": "stores-app",
                        "options": {"variantId": "gold"}
                    },
                    "quantity": 2
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cart": {
                    "id": "cart-1",
                    "currency": "ZAR",
                    "lineItems": [{
                        "id": "line-1",
                        "quantity": 2,
                        "catalogReference": {"catalogItemId": "ring", "appId": "stores-app"},
                        "productName": {"original": "Ring"},
                        "price": {"amount": "100.5"}
                    }]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let item = LineItemInput {
            catalog_item_id: ProductId::new("ring"),
            variant_id: Some(VariantId::new("gold")),
            quantity: 2,
        };
        let cart = client(&server)
            .add_to_current_cart(&token(), &[item])
            .await
            .unwrap();

        assert_eq!(cart.line_items.len(), 1);
        assert_eq!(cart.subtotal().display(), "R201.00");
    }

    #[tokio::test]
    async fn test_add_without_variant_omits_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ADD_TO_CART_PATH))
            .and(body_json(json!({
                "lineItems": [{
                    "catalogReference": {"catalogItemId": "ring", "appId": "stores-app"},
                    "quantity": 1
                }]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"cart": {"lineItems": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let item = LineItemInput {
            catalog_item_id: ProductId::new("ring"),
            variant_id: None,
            quantity: 1,
        };
        client(&server)
            .add_to_current_cart(&token(), &[item])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_checkout_redirect_callbacks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REDIRECT_SESSION_PATH))
            .and(body_json(json!({
                "ecomCheckout": {"checkoutId": "co-1"},
                "callbacks": {
                    "postFlowUrl": "https://shop.example/",
                    "thankYouPageUrl": "https://shop.example/success"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "redirectSession": {"id": "rs-1", "fullUrl": "https://pay.example/rs-1"}
            })))
            .mount(&server)
            .await;

        let callbacks = RedirectCallbacks {
            post_flow_url: "https://shop.example/".to_string(),
            thank_you_page_url: Some("https://shop.example/success".to_string()),
        };
        let redirect = client(&server)
            .create_checkout_redirect(&token(), &CheckoutId::new("co-1"), &callbacks)
            .await
            .unwrap();
        assert_eq!(redirect.full_url, "https://pay.example/rs-1");
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REMOVE_LINE_ITEMS_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let err = client(&server)
            .remove_line_items_from_current_cart(&token(), &[LineItemId::new("line-1")])
            .await
            .unwrap_err();
        assert!(matches!(err, WixError::Api { status: 503, .. }));
    }
}
