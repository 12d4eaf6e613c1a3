//! Request and response bodies as they appear on the wire.
//!
//! Everything here is camelCase JSON except the OAuth token response, which
//! uses snake_case. Fields Wix documents as optional are `Option` or
//! `#[serde(default)]` so partial objects still parse.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Errors
// =============================================================================

/// Error body returned with non-success statuses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub message: String,
    pub details: Option<ErrorDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorDetails {
    pub application_error: Option<ApplicationError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationError {
    pub code: String,
    pub description: String,
}

// =============================================================================
// OAuth
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

// =============================================================================
// IAM
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LoginId<'a> {
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub login_id: LoginId<'a>,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterProfile<'a> {
    pub nickname: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub login_id: LoginId<'a>,
    pub password: &'a str,
    pub profile: RegisterProfile<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest<'a> {
    pub code: &'a str,
    pub state_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRedirect<'a> {
    pub url: &'a str,
    pub client_id: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RecoveryRequest<'a> {
    pub email: &'a str,
    pub redirect: RecoveryRedirect<'a>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateMachineResponse {
    pub state: String,
    pub session_token: Option<String>,
    pub state_token: Option<String>,
}

// =============================================================================
// Redirect Sessions
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcomCheckout<'a> {
    pub checkout_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutTarget<'a> {
    pub client_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Callbacks<'a> {
    pub post_flow_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thank_you_page_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSessionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecom_checkout: Option<EcomCheckout<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logout: Option<LogoutTarget<'a>>,
    pub callbacks: Callbacks<'a>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSessionResponse {
    pub redirect_session: WireRedirectSession,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRedirectSession {
    #[serde(default)]
    pub id: String,
    pub full_url: String,
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CartResponse {
    pub cart: WireCart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireCart {
    pub id: Option<String>,
    pub line_items: Vec<WireLineItem>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireLineItem {
    pub id: Option<String>,
    pub quantity: Option<u32>,
    pub catalog_reference: Option<WireCatalogReference>,
    pub product_name: Option<WireProductName>,
    pub price: Option<WireMoney>,
    pub physical_properties: Option<WirePhysicalProperties>,
    pub image: Option<WireImageRef>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireCatalogReference {
    pub catalog_item_id: String,
    pub app_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<WireCatalogOptions>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireCatalogOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireProductName {
    pub original: Option<String>,
    pub translated: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMoney {
    pub amount: Option<String>,
    pub converted_amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePhysicalProperties {
    pub sku: Option<String>,
}

/// Images arrive either as a bare media URI or as an object with a URL.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireImageRef {
    Uri(String),
    Object { url: String },
}

impl WireImageRef {
    pub fn into_url(self) -> String {
        match self {
            Self::Uri(url) | Self::Object { url } => url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartLineItem {
    pub catalog_reference: WireCatalogReference,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub line_items: Vec<AddToCartLineItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLineItemsRequest<'a> {
    pub line_item_ids: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest<'a> {
    pub channel_type: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    pub checkout_id: String,
}

// =============================================================================
// Stores Reader
// =============================================================================

#[derive(Debug, Serialize)]
pub struct Paging {
    pub limit: u32,
    pub offset: u32,
}

/// Query envelope; `filter` and `sort` are JSON documents serialized to strings.
#[derive(Debug, Serialize)]
pub struct QueryBody {
    pub filter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    pub paging: Paging,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub query: QueryBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductsResponse {
    pub products: Vec<WireProduct>,
    pub total_results: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireProduct {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price_data: Option<WirePriceData>,
    pub price: Option<WirePriceData>,
    pub stock: Option<WireStock>,
    pub media: Option<WireMedia>,
    pub product_options: Vec<WireProductOption>,
    pub variants: Vec<WireVariant>,
    pub additional_info_sections: Vec<WireInfoSection>,
    pub collection_ids: Vec<String>,
}

/// Stores Reader amounts are JSON numbers; tolerate strings too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireAmount {
    Number(serde_json::Number),
    Text(String),
}

impl WireAmount {
    pub fn as_string(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WirePriceData {
    pub currency: Option<String>,
    pub price: Option<WireAmount>,
    pub discounted_price: Option<WireAmount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireStock {
    pub quantity: Option<u32>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMedia {
    pub main_media: Option<WireMediaItem>,
    pub items: Vec<WireMediaItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireMediaItem {
    pub image: Option<WireMediaImage>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMediaImage {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireProductOption {
    pub name: String,
    pub choices: Vec<WireChoice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireChoice {
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireVariant {
    pub id: String,
    pub choices: BTreeMap<String, String>,
    pub variant: Option<WireVariantData>,
    pub stock: Option<WireStock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireVariantData {
    pub price_data: Option<WirePriceData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireInfoSection {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub product: WireProduct,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionsResponse {
    pub collections: Vec<WireCollection>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionResponse {
    pub collection: WireCollection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireCollection {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub media: Option<WireMedia>,
}

// =============================================================================
// Members & Orders
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MemberResponse {
    pub member: WireMember,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMember {
    pub id: String,
    pub contact_id: Option<String>,
    pub login_email: Option<String>,
    pub profile: Option<WireMemberProfile>,
    pub contact: Option<WireMemberContact>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WireMemberProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMemberContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub phones: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateMemberBody {
    pub profile: WireMemberProfile,
    pub contact: WireMemberContact,
}

#[derive(Debug, Serialize)]
pub struct UpdateMemberRequest {
    pub member: UpdateMemberBody,
}

#[derive(Debug, Serialize)]
pub struct OrderSearch {
    pub filter: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct SearchOrdersRequest {
    pub search: OrderSearch,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrdersResponse {
    pub orders: Vec<WireOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireOrder {
    pub id: String,
    pub number: Option<String>,
    pub created_date: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub price_summary: Option<WirePriceSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WirePriceSummary {
    pub subtotal: Option<WireMoney>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_parse() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Bad","details":{"applicationError":{"code":"-19976","description":"wrong password"}}}"#,
        )
        .unwrap();
        assert_eq!(body.message, "Bad");
        assert_eq!(
            body.details.unwrap().application_error.unwrap().code,
            "-19976"
        );
    }

    #[test]
    fn test_image_ref_variants() {
        let uri: WireImageRef = serde_json::from_str(r#""wix:image://v1/abc/a.jpg""#).unwrap();
        assert_eq!(uri.into_url(), "wix:image://v1/abc/a.jpg");
        let obj: WireImageRef = serde_json::from_str(r#"{"url":"https://x/y.jpg"}"#).unwrap();
        assert_eq!(obj.into_url(), "https://x/y.jpg");
    }

    #[test]
    fn test_add_to_cart_omits_missing_variant() {
        let body = AddToCartRequest {
            line_items: vec![AddToCartLineItem {
                catalog_reference: WireCatalogReference {
                    catalog_item_id: "p1".to_string(),
                    app_id: "app".to_string(),
                    options: None,
                },
                quantity: 1,
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "lineItems": [{
                    "catalogReference": {"catalogItemId": "p1", "appId": "app"},
                    "quantity": 1
                }]
            })
        );
    }

    #[test]
    fn test_amount_number_or_string() {
        let n: WireAmount = serde_json::from_str("149.9").unwrap();
        assert_eq!(n.as_string(), "149.9");
        let s: WireAmount = serde_json::from_str(r#""20.00""#).unwrap();
        assert_eq!(s.as_string(), "20.00");
    }
}
