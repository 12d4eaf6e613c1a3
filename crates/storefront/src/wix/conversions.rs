//! Conversions from wire bodies to domain types.

use mon_core::{
    CollectionId, ContactId, CurrencyCode, LineItemId, LoginState, MemberId, OrderId, Price,
    ProductId, VariantId,
};
use tracing::warn;

use super::types::{
    Cart, Collection, Image, InfoSection, LineItem, LoginResponse, Member, Order, Product,
    ProductOption, ProductVariant,
};
use super::wire::{
    StateMachineResponse, WireAmount, WireCart, WireCollection, WireLineItem, WireMedia,
    WireMediaItem, WireMember, WireOrder, WirePriceData, WireProduct, WireVariant,
};

fn currency(code: Option<&str>) -> CurrencyCode {
    code.map_or_else(CurrencyCode::default, CurrencyCode::from_code)
}

/// Parse an amount, contributing zero when missing or malformed.
fn price_or_zero(amount: Option<&str>, currency_code: CurrencyCode) -> Price {
    match amount {
        Some(raw) => Price::parse(raw, currency_code).unwrap_or_else(|e| {
            warn!(amount = %raw, error = %e, "Unparseable amount, treating as zero");
            Price::zero(currency_code)
        }),
        None => Price::zero(currency_code),
    }
}

fn wire_amount(amount: Option<&WireAmount>, currency_code: CurrencyCode) -> Option<Price> {
    amount.map(|a| price_or_zero(Some(&a.as_string()), currency_code))
}

// =============================================================================
// Cart
// =============================================================================

pub fn convert_cart(cart: WireCart) -> Cart {
    let currency_code = currency(cart.currency.as_deref());
    Cart {
        id: cart.id,
        line_items: cart
            .line_items
            .into_iter()
            .filter_map(|line| convert_line_item(line, currency_code))
            .collect(),
        currency: currency_code,
    }
}

fn convert_line_item(line: WireLineItem, currency_code: CurrencyCode) -> Option<LineItem> {
    let Some(id) = line.id else {
        warn!("Cart line item without id skipped");
        return None;
    };

    let (product_id, variant_id) = line.catalog_reference.map_or_else(
        || (ProductId::new(""), None),
        |r| {
            let variant = r
                .options
                .and_then(|o| o.variant_id)
                .map(VariantId::new);
            (ProductId::new(r.catalog_item_id), variant)
        },
    );

    let amount = line
        .price
        .as_ref()
        .and_then(|p| p.amount.as_deref().or(p.converted_amount.as_deref()));

    Some(LineItem {
        id: LineItemId::new(id),
        product_id,
        variant_id,
        product_name: line
            .product_name
            .and_then(|n| n.translated.or(n.original))
            .unwrap_or_default(),
        unit_price: price_or_zero(amount, currency_code),
        quantity: line.quantity.unwrap_or(1),
        sku: line.physical_properties.and_then(|p| p.sku),
        image: line.image.map(super::wire::WireImageRef::into_url),
    })
}

// =============================================================================
// Catalog
// =============================================================================

fn convert_media_item(item: WireMediaItem) -> Option<Image> {
    item.image.filter(|i| !i.url.is_empty()).map(|i| Image {
        url: i.url,
        alt_text: i.alt_text.or(item.title),
    })
}

fn main_image(media: Option<&mut WireMedia>) -> Option<Image> {
    media
        .and_then(|m| m.main_media.take())
        .and_then(convert_media_item)
}

fn convert_variant(
    variant: WireVariant,
    options: &[ProductOption],
    currency_code: CurrencyCode,
) -> ProductVariant {
    let mut choices: Vec<(String, String)> = Vec::with_capacity(variant.choices.len());
    let mut remaining = variant.choices;
    for option in options {
        if let Some(value) = remaining.remove(&option.name) {
            choices.push((option.name.clone(), value));
        }
    }
    choices.extend(remaining);

    let price = variant
        .variant
        .and_then(|v| v.price_data)
        .and_then(|p| wire_amount(p.discounted_price.as_ref().or(p.price.as_ref()), currency_code));

    ProductVariant {
        id: VariantId::new(variant.id),
        choices,
        price,
        in_stock: variant.stock.and_then(|s| s.in_stock).unwrap_or(true),
    }
}

pub fn convert_product(product: WireProduct) -> Product {
    let WireProduct {
        id,
        slug,
        name,
        description,
        price_data,
        price,
        stock,
        mut media,
        product_options,
        variants,
        additional_info_sections,
        collection_ids,
    } = product;

    let price_data: WirePriceData = price_data.or(price).unwrap_or_default();
    let currency_code = currency(price_data.currency.as_deref());
    let list_price = wire_amount(price_data.price.as_ref(), currency_code)
        .unwrap_or_else(|| Price::zero(currency_code));
    let discounted_price =
        wire_amount(price_data.discounted_price.as_ref(), currency_code).unwrap_or(list_price);

    let options: Vec<ProductOption> = product_options
        .into_iter()
        .map(|o| ProductOption {
            name: o.name,
            choices: o.choices.into_iter().map(|c| c.value).collect(),
        })
        .collect();

    let variants = variants
        .into_iter()
        .map(|v| convert_variant(v, &options, currency_code))
        .collect();

    let main_image = main_image(media.as_mut());
    let images = media
        .map(|m| m.items.into_iter().filter_map(convert_media_item).collect())
        .unwrap_or_default();

    let stock_quantity = stock.as_ref().and_then(|s| s.quantity);
    let in_stock = stock
        .and_then(|s| s.in_stock)
        .unwrap_or_else(|| stock_quantity.is_none_or(|q| q > 0));

    Product {
        id: ProductId::new(id),
        slug,
        name,
        description: description.filter(|d| !d.trim().is_empty()),
        price: list_price,
        discounted_price,
        stock_quantity,
        in_stock,
        main_image,
        images,
        options,
        variants,
        info_sections: additional_info_sections
            .into_iter()
            .map(|s| InfoSection {
                title: s.title,
                description: s.description,
            })
            .collect(),
        collection_ids: collection_ids.into_iter().map(CollectionId::new).collect(),
    }
}

pub fn convert_collection(collection: WireCollection) -> Collection {
    let mut media = collection.media;
    Collection {
        id: CollectionId::new(collection.id),
        slug: collection.slug,
        name: collection.name,
        image: main_image(media.as_mut()),
    }
}

// =============================================================================
// Members & Orders
// =============================================================================

pub fn convert_member(member: WireMember) -> Member {
    let contact = member.contact.unwrap_or_default();
    Member {
        id: MemberId::new(member.id),
        contact_id: member.contact_id.map(ContactId::new),
        login_email: member.login_email,
        nickname: member.profile.and_then(|p| p.nickname),
        first_name: contact.first_name,
        last_name: contact.last_name,
        phones: contact.phones,
    }
}

pub fn convert_order(order: WireOrder) -> Order {
    let currency_code = currency(order.currency.as_deref());
    let subtotal = order
        .price_summary
        .and_then(|s| s.subtotal)
        .and_then(|m| m.amount);

    Order {
        id: OrderId::new(order.id),
        number: order.number,
        subtotal: price_or_zero(subtotal.as_deref(), currency_code),
        created_at: order
            .created_date
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&chrono::Utc)),
        status: order
            .status
            .and_then(|s| serde_json::from_value(serde_json::Value::String(s)).ok())
            .unwrap_or_default(),
    }
}

// =============================================================================
// IAM
// =============================================================================

pub fn convert_login(response: StateMachineResponse) -> LoginResponse {
    let state = match response.state.as_str() {
        "SUCCESS" => LoginState::Success,
        "REQUIRE_EMAIL_VERIFICATION" => LoginState::RequireEmailVerification,
        "REQUIRE_OWNER_APPROVAL" => LoginState::RequireOwnerApproval,
        other => {
            warn!(state = %other, "Unexpected login state");
            LoginState::Failure
        }
    };

    LoginResponse {
        state,
        session_token: response.session_token,
        state_token: response.state_token,
        error_code: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mon_core::OrderStatus;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_convert_cart_defaults() {
        let wire: WireCart = serde_json::from_value(serde_json::json!({
            "id": "cart-1",
            "currency": "ZAR",
            "lineItems": [
                {
                    "id": "li-1",
                    "quantity": 2,
                    "catalogReference": {
                        "catalogItemId": "p-1",
                        "appId": "app",
                        "options": {"variantId": "v-1"}
                    },
                    "productName": {"original": "Gold Hoops"},
                    "price": {"amount": "100"},
                    "physicalProperties": {"sku": "GH-01"},
                    "image": "wix:image://v1/abc/hoops.jpg"
                },
                {
                    "id": "li-2",
                    "catalogReference": {"catalogItemId": "p-2", "appId": "app"},
                    "productName": {"original": "Scarf"},
                    "price": {"amount": "not-a-number"}
                },
                {"quantity": 1}
            ]
        }))
        .unwrap();

        let cart = convert_cart(wire);
        assert_eq!(cart.len(), 2);

        let first = &cart.line_items[0];
        assert_eq!(first.variant_id.as_ref().unwrap().as_str(), "v-1");
        assert_eq!(first.sku.as_deref(), Some("GH-01"));
        assert_eq!(first.quantity, 2);

        let second = &cart.line_items[1];
        assert_eq!(second.quantity, 1);
        assert!(second.variant_id.is_none());
        assert_eq!(second.unit_price.amount, Decimal::ZERO);

        assert_eq!(cart.subtotal().amount, Decimal::from(200));
    }

    #[test]
    fn test_convert_product() {
        let wire: WireProduct = serde_json::from_value(serde_json::json!({
            "id": "p-1",
            "slug": "gold-hoops",
            "name": "Gold Hoops",
            "description": "<p>Shiny</p>",
            "priceData": {"currency": "ZAR", "price": 150, "discountedPrice": 120.5},
            "stock": {"quantity": 3, "inStock": true},
            "media": {
                "mainMedia": {"image": {"url": "https://static.wixstatic.com/media/main.jpg"}},
                "items": [{"image": {"url": "https://static.wixstatic.com/media/a.jpg"}}]
            },
            "productOptions": [{"name": "Size", "choices": [{"value": "S"}, {"value": "M"}]}],
            "variants": [{"id": "v-1", "choices": {"Size": "M"}, "stock": {"inStock": false}}],
            "additionalInfoSections": [{"title": "shortDesc", "description": "Lovely"}],
            "collectionIds": ["c-1"]
        }))
        .unwrap();

        let product = convert_product(wire);
        assert_eq!(product.price.display(), "R150.00");
        assert_eq!(product.discounted_price.display(), "R120.50");
        assert!(product.is_discounted());
        assert_eq!(product.stock_quantity, Some(3));
        assert_eq!(product.options[0].choices, vec!["S", "M"]);
        assert_eq!(product.variants[0].title(), "M");
        assert!(!product.variants[0].in_stock);
        assert_eq!(product.info_section("shortDesc"), Some("Lovely"));
        assert_eq!(product.images.len(), 1);
        assert!(product.main_image.is_some());
    }

    #[test]
    fn test_convert_order_status_and_date() {
        let wire: WireOrder = serde_json::from_value(serde_json::json!({
            "id": "o-1",
            "number": "10001",
            "createdDate": "2024-05-01T10:00:00.000Z",
            "status": "APPROVED",
            "priceSummary": {"subtotal": {"amount": "350.00"}}
        }))
        .unwrap();

        let order = convert_order(wire);
        assert_eq!(order.status, OrderStatus::Approved);
        assert_eq!(order.subtotal.display(), "R350.00");
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_convert_login_unknown_state_is_failure() {
        let response = convert_login(StateMachineResponse {
            state: "STATUS_CHECK".to_string(),
            session_token: None,
            state_token: None,
        });
        assert_eq!(response.state, LoginState::Failure);
    }
}
