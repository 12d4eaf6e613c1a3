//! Domain types for the Wix Headless APIs.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! wire structs in `wire.rs`.

use std::fmt;

use mon_core::{
    CollectionId, ContactId, CurrencyCode, LineItemId, LoginState, MemberId, OrderId,
    OrderStatus, Price, ProductId, VariantId,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

// =============================================================================
// Token Types
// =============================================================================

/// Who a refresh token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenRole {
    /// Anonymous shopper.
    #[default]
    Visitor,
    /// Logged-in site member.
    Member,
}

/// Long-lived refresh credential, persisted JSON-encoded in the `refreshToken` cookie.
///
/// Implements `Debug` manually to redact the token value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Opaque token value issued by Wix.
    pub value: String,
    /// Visitor or member.
    #[serde(default)]
    pub role: TokenRole,
}

impl RefreshToken {
    /// Whether the token belongs to a logged-in member.
    #[must_use]
    pub fn is_member(&self) -> bool {
        self.role == TokenRole::Member
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("value", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// Short-lived bearer credential exchanged from a refresh token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    value: SecretString,
    /// Unix timestamp (seconds) after which the token must not be used.
    pub expires_at: i64,
}

impl AccessToken {
    /// Create a new access token.
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: i64) -> Self {
        Self {
            value: SecretString::from(value.into()),
            expires_at,
        }
    }

    /// The raw value for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the token is expired (or about to be) at `now`.
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        // Treat tokens within a minute of expiry as expired.
        now + 60 >= self.expires_at
    }
}

/// A refresh/access token pair returned by the OAuth endpoint.
#[derive(Debug, Clone)]
pub struct Tokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Error codes Wix attaches to failed login or registration attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginErrorCode {
    InvalidEmail,
    InvalidPassword,
    EmailAlreadyExists,
    ResetPassword,
    Other(String),
}

impl LoginErrorCode {
    /// Map an IAM application error code to a login error.
    ///
    /// Accepts both the numeric codes returned by the REST API and the
    /// symbolic names used by the Wix SDKs.
    #[must_use]
    pub fn from_wix_code(code: &str) -> Self {
        match code {
            "-19999" | "invalidEmail" => Self::InvalidEmail,
            "-19976" | "invalidPassword" => Self::InvalidPassword,
            "-19995" | "emailAlreadyExists" => Self::EmailAlreadyExists,
            "-19973" | "resetPassword" => Self::ResetPassword,
            other => Self::Other(other.to_string()),
        }
    }

    /// Static message shown to the shopper.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidEmail | Self::InvalidPassword => "Invalid email or password!",
            Self::EmailAlreadyExists => "Email already exists!",
            Self::ResetPassword => "You need to reset your password!",
            Self::Other(_) => "An unexpected error occurred!",
        }
    }
}

/// Result of a login, registration, or verification call.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub state: LoginState,
    /// Present on `SUCCESS`; exchanged for member tokens.
    pub session_token: Option<String>,
    /// Present when further steps (e.g. email verification) are required.
    pub state_token: Option<String>,
    /// Present on `FAILURE`.
    pub error_code: Option<LoginErrorCode>,
}

impl LoginResponse {
    /// Build a failure response from an error code.
    #[must_use]
    pub const fn failure(code: LoginErrorCode) -> Self {
        Self {
            state: LoginState::Failure,
            session_token: None,
            state_token: None,
            error_code: Some(code),
        }
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// One entry in a cart: a purchasable catalog item/variant and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line item ID (used for removal).
    pub id: LineItemId,
    /// Catalog item the line refers to.
    pub product_id: ProductId,
    /// Selected variant, if the product has options.
    pub variant_id: Option<VariantId>,
    /// Product name at the time it was added.
    pub product_name: String,
    /// Price of a single unit.
    pub unit_price: Price,
    /// Number of units.
    pub quantity: u32,
    /// Stock keeping unit.
    pub sku: Option<String>,
    /// Wix media reference or URL.
    pub image: Option<String>,
}

impl LineItem {
    /// Unit price multiplied by quantity.
    ///
    /// An amount too large to represent is treated as zero.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.checked_mul(self.quantity).unwrap_or_else(|| {
            tracing::warn!(line_item = %self.id, "Line total overflows, treating as zero");
            Price::zero(self.unit_price.currency_code)
        })
    }
}

/// A shopper's current cart as returned by the eCommerce API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Cart ID; `None` for the empty placeholder cart.
    pub id: Option<String>,
    /// Line items in the order Wix returned them.
    pub line_items: Vec<LineItem>,
    /// Currency of all amounts in the cart.
    pub currency: CurrencyCode,
}

impl Cart {
    /// Sum of unit price × quantity over all line items.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        if self.line_items.is_empty() {
            return Price::zero(self.currency);
        }
        self.line_items.iter().map(LineItem::line_total).sum()
    }

    /// Number of line items (not units).
    #[must_use]
    pub fn len(&self) -> usize {
        self.line_items.len()
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// A line item to add to the current cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemInput {
    pub catalog_item_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: u32,
}

/// A hosted checkout page the shopper is redirected to.
#[derive(Debug, Clone)]
pub struct RedirectSession {
    pub id: String,
    pub full_url: String,
}

/// Where the hosted flow sends the shopper afterwards.
#[derive(Debug, Clone)]
pub struct RedirectCallbacks {
    pub post_flow_url: String,
    pub thank_you_page_url: Option<String>,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Product media image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt_text: Option<String>,
}

/// A product option (e.g. "Size") and its choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub choices: Vec<String>,
}

/// A purchasable combination of option choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    /// Option name → chosen value.
    pub choices: Vec<(String, String)>,
    pub price: Option<Price>,
    pub in_stock: bool,
}

impl ProductVariant {
    /// Human-readable title such as `"M / Gold"`.
    #[must_use]
    pub fn title(&self) -> String {
        self.choices
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Titled block of extra product copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSection {
    pub title: String,
    /// HTML description.
    pub description: String,
}

/// Read-only projection of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    /// HTML description.
    pub description: Option<String>,
    pub price: Price,
    pub discounted_price: Price,
    pub stock_quantity: Option<u32>,
    pub in_stock: bool,
    pub main_image: Option<Image>,
    pub images: Vec<Image>,
    pub options: Vec<ProductOption>,
    pub variants: Vec<ProductVariant>,
    pub info_sections: Vec<InfoSection>,
    pub collection_ids: Vec<CollectionId>,
}

impl Product {
    /// Whether the product sells below its list price.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discounted_price.amount < self.price.amount
    }

    /// Description of the info section titled `title`.
    #[must_use]
    pub fn info_section(&self, title: &str) -> Option<&str> {
        self.info_sections
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.description.as_str())
    }
}

/// A page of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Zero-based page index.
    pub current_page: u32,
    pub total_results: Option<u32>,
    pub has_prev: bool,
    pub has_next: bool,
}

/// A catalog collection (category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub slug: String,
    pub name: String,
    pub image: Option<Image>,
}

/// Product types a listing may be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Physical,
    Digital,
}

impl ProductType {
    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Physical => "physical",
            Self::Digital => "digital",
        }
    }

    /// Parse a query-string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "physical" => Some(Self::Physical),
            "digital" => Some(Self::Digital),
            _ => None,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort on a product field, parsed from `"asc price"` / `"desc lastUpdated"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSort {
    pub order: SortOrder,
    pub field: String,
}

impl ProductSort {
    /// Parse `"<asc|desc> <field>"`. Anything else is ignored.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split_whitespace();
        let order = match parts.next()? {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => return None,
        };
        let field = parts.next()?;
        if parts.next().is_some() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return None;
        }
        Some(Self {
            order,
            field: field.to_string(),
        })
    }
}

// =============================================================================
// Member & Order Types
// =============================================================================

/// The logged-in site member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub contact_id: Option<ContactId>,
    pub login_email: Option<String>,
    pub nickname: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phones: Vec<String>,
}

/// Editable member profile fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberUpdate {
    pub nickname: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// A past order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub number: Option<String>,
    pub subtotal: Price,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub status: OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(id: &str, amount: &str, quantity: u32) -> LineItem {
        LineItem {
            id: LineItemId::new(id),
            product_id: ProductId::new(format!("p-{id}")),
            variant_id: None,
            product_name: format!("Item {id}"),
            unit_price: Price::parse(amount, CurrencyCode::ZAR).unwrap(),
            quantity,
            sku: None,
            image: None,
        }
    }

    #[test]
    fn test_subtotal_two_items() {
        let cart = Cart {
            id: Some("cart-1".to_string()),
            line_items: vec![line("a", "100", 2), line("b", "50", 1)],
            currency: CurrencyCode::ZAR,
        };
        assert_eq!(cart.subtotal().amount, Decimal::from(250));
        assert_eq!(cart.subtotal().display(), "R250.00");
    }

    #[test]
    fn test_subtotal_empty_cart() {
        let cart = Cart::default();
        assert_eq!(cart.subtotal().amount, Decimal::ZERO);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_subtotal_decimal_precision() {
        let cart = Cart {
            id: None,
            line_items: vec![line("a", "0.10", 3), line("b", "0.20", 1)],
            currency: CurrencyCode::ZAR,
        };
        assert_eq!(cart.subtotal().amount, Decimal::new(50, 2));
    }

    #[test]
    fn test_subtotal_survives_huge_amounts() {
        let huge = "79228162514264337593543950335";
        let cart = Cart {
            id: Some("cart-1".to_string()),
            line_items: vec![line("a", huge, 2), line("b", "50", 1)],
            currency: CurrencyCode::ZAR,
        };
        assert_eq!(cart.line_items.first().unwrap().line_total().amount, Decimal::ZERO);
        assert_eq!(cart.subtotal().display(), "R50.00");

        let cart = Cart {
            id: Some("cart-1".to_string()),
            line_items: vec![line("a", huge, 1), line("b", huge, 1)],
            currency: CurrencyCode::ZAR,
        };
        assert_eq!(cart.subtotal().amount, Decimal::MAX);
    }

    #[test]
    fn test_login_error_messages() {
        assert_eq!(
            LoginErrorCode::from_wix_code("invalidEmail").user_message(),
            "Invalid email or password!"
        );
        assert_eq!(
            LoginErrorCode::from_wix_code("-19976").user_message(),
            "Invalid email or password!"
        );
        assert_eq!(
            LoginErrorCode::from_wix_code("emailAlreadyExists").user_message(),
            "Email already exists!"
        );
        assert_eq!(
            LoginErrorCode::from_wix_code("resetPassword").user_message(),
            "You need to reset your password!"
        );
        assert_eq!(
            LoginErrorCode::from_wix_code("somethingElse").user_message(),
            "An unexpected error occurred!"
        );
    }

    #[test]
    fn test_refresh_token_debug_redacts_value() {
        let token = RefreshToken {
            value: "very-secret-refresh".to_string(),
            role: TokenRole::Visitor,
        };
        let debug = format!("{token:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret-refresh"));
    }

    #[test]
    fn test_refresh_token_json_shape() {
        let token = RefreshToken {
            value: "abc".to_string(),
            role: TokenRole::Member,
        };
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"value":"abc","role":"member"}"#);

        // Role defaults to visitor when absent.
        let parsed: RefreshToken = serde_json::from_str(r#"{"value":"xyz"}"#).unwrap();
        assert_eq!(parsed.role, TokenRole::Visitor);
    }

    #[test]
    fn test_access_token_expiry_margin() {
        let token = AccessToken::new("t", 1_000);
        assert!(!token.is_expired_at(900));
        assert!(token.is_expired_at(950));
    }

    #[test]
    fn test_product_sort_parse() {
        assert_eq!(
            ProductSort::parse("asc price"),
            Some(ProductSort {
                order: SortOrder::Asc,
                field: "price".to_string()
            })
        );
        assert_eq!(
            ProductSort::parse("desc lastUpdated").map(|s| s.order),
            Some(SortOrder::Desc)
        );
        assert!(ProductSort::parse("sideways price").is_none());
        assert!(ProductSort::parse("asc").is_none());
        assert!(ProductSort::parse("asc price; drop").is_none());
    }

    #[test]
    fn test_variant_title() {
        let variant = ProductVariant {
            id: VariantId::new("v1"),
            choices: vec![
                ("Size".to_string(), "M".to_string()),
                ("Metal".to_string(), "Gold".to_string()),
            ],
            price: None,
            in_stock: true,
        };
        assert_eq!(variant.title(), "M / Gold");
    }
}
