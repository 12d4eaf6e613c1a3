//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads;
//! plain form posts fall back to a redirect to `/cart`. Each visitor's
//! [`CartStore`] lives in their session and is replaced with Wix's response
//! after every successful operation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use mon_core::{LineItemId, ProductId, VariantId};

use crate::cart::{CartError, CartStore};
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::Visitor;
use crate::routes::context::PageContext;
use crate::state::AppState;
use crate::wix::{LineItem, RedirectCallbacks, WixError, media};

/// Event HTMX listeners refresh the header badge on.
const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

impl From<&LineItem> for CartItemView {
    fn from(line: &LineItem) -> Self {
        Self {
            id: line.id.to_string(),
            name: line.product_name.clone(),
            quantity: line.quantity,
            price: line.unit_price.display(),
            line_price: line.line_total().display(),
            image_url: line
                .image
                .as_deref()
                .map(|image| media::scaled_to_fill(image, 72, 96)),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: usize,
    pub is_loading: bool,
}

impl From<&CartStore> for CartView {
    fn from(store: &CartStore) -> Self {
        Self {
            items: store
                .cart()
                .line_items
                .iter()
                .map(CartItemView::from)
                .collect(),
            subtotal: store.subtotal().display(),
            item_count: store.counter(),
            is_loading: store.is_loading(),
        }
    }
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub error: Option<String>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

// =============================================================================
// Helpers
// =============================================================================

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
}

fn missing_token() -> WixError {
    WixError::Auth("No visitor token for this request".to_string())
}

/// Render a failed cart operation for HTMX or a full page request.
fn cart_failure(err: CartError, htmx: bool) -> Response {
    if htmx {
        (
            StatusCode::BAD_GATEWAY,
            Html(format!("<span class=\"cart-error\">{err}</span>")),
        )
            .into_response()
    } else {
        AppError::from(err).into_response()
    }
}

async fn persist(store: &CartStore, session: &Session) {
    if let Err(e) = store.save(session).await {
        tracing::error!("Failed to save cart to session: {e}");
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page, refreshing the snapshot from Wix.
///
/// A failed refresh keeps showing the last-known cart with an error notice.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    mut ctx: PageContext,
    session: Session,
) -> impl IntoResponse {
    let mut store = CartStore::load(&session).await;

    let result = match visitor.access_token(&state).await {
        Some(token) => store.fetch(state.wix(), &token).await,
        None => Err(CartError::Fetch(missing_token())),
    };

    let error = match result {
        Ok(()) => {
            persist(&store, &session).await;
            None
        }
        Err(e) => Some(e.to_string()),
    };

    ctx.cart_count = store.counter();
    CartShowTemplate {
        ctx,
        cart: CartView::from(&store),
        error,
    }
}

/// Add an item to the cart.
///
/// HTMX requests get the new badge and a `cart-updated` trigger.
#[instrument(skip(state, visitor, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    visitor: Visitor,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let htmx = is_htmx(&headers);
    let mut store = CartStore::load(&session).await;

    let variant_id = form
        .variant_id
        .filter(|v| !v.trim().is_empty())
        .map(VariantId::new);
    let quantity = form.quantity.unwrap_or(1).max(1);
    add_breadcrumb("cart", "Add item", Some(&[("product_id", form.product_id.as_str())]));

    let result = match visitor.access_token(&state).await {
        Some(token) => {
            store
                .add_item(
                    state.wix(),
                    &token,
                    ProductId::new(form.product_id),
                    variant_id,
                    quantity,
                )
                .await
        }
        None => Err(CartError::Add(missing_token())),
    };

    if let Err(e) = result {
        return cart_failure(e, htmx);
    }
    persist(&store, &session).await;

    if htmx {
        (
            AppendHeaders([CART_UPDATED_TRIGGER]),
            CartCountTemplate {
                count: store.counter(),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Remove a line item from the cart.
///
/// HTMX requests get the refreshed cart items fragment.
#[instrument(skip(state, visitor, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    visitor: Visitor,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let htmx = is_htmx(&headers);
    let mut store = CartStore::load(&session).await;
    let line_item_id = LineItemId::new(form.item_id);

    let result = match visitor.access_token(&state).await {
        Some(token) => store.remove_item(state.wix(), &token, &line_item_id).await,
        None => Err(CartError::Remove(missing_token())),
    };

    if let Err(e) = result {
        return cart_failure(e, htmx);
    }
    persist(&store, &session).await;

    if htmx {
        (
            AppendHeaders([CART_UPDATED_TRIGGER]),
            CartItemsTemplate {
                cart: CartView::from(&store),
            },
        )
            .into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Cart count badge (HTMX), from the persisted snapshot.
#[instrument(skip_all)]
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: CartStore::load(&session).await.counter(),
    }
}

/// Create a checkout from the current cart and redirect to Wix's hosted page.
#[instrument(skip_all)]
pub async fn checkout(State(state): State<AppState>, visitor: Visitor) -> Response {
    let Some(token) = visitor.access_token(&state).await else {
        return Redirect::to("/cart").into_response();
    };

    let callbacks = RedirectCallbacks {
        post_flow_url: state.url("/"),
        thank_you_page_url: Some(state.url("/success")),
    };

    let redirect = async {
        let checkout_id = state.wix().create_checkout_from_current_cart(&token).await?;
        state
            .wix()
            .create_checkout_redirect(&token, &checkout_id, &callbacks)
            .await
    };

    match redirect.await {
        Ok(hosted) => Redirect::to(&hosted.full_url).into_response(),
        Err(e) => {
            tracing::error!("Checkout error: {e}");
            Redirect::to("/cart").into_response()
        }
    }
}
