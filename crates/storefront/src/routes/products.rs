//! Product route handlers: listing, deals, and product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use mon_core::{CollectionId, VariantId};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::Visitor;
use crate::routes::context::PageContext;
use crate::state::AppState;
use crate::wix::{
    DEFAULT_LIMIT, DEFAULT_MAX_PRICE, Product, ProductPage, ProductQuery, ProductSort,
    ProductType, media,
};

/// Info section Wix editors use for the one-line card blurb.
const SHORT_DESCRIPTION_SECTION: &str = "shortDesc";

/// Products shown under "You may also like" on the detail page.
const RELATED_LIMIT: u32 = 8;

/// Products per page on the deals listing.
const DEALS_LIMIT: u32 = 8;

// =============================================================================
// View Types
// =============================================================================

/// Product card for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub slug: String,
    pub name: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub image_url: Option<String>,
    pub hover_image_url: Option<String>,
    /// May contain HTML; strip before display.
    pub short_description: Option<String>,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        let (price, compare_at_price) = if product.is_discounted() {
            (
                product.discounted_price.display(),
                Some(product.price.display()),
            )
        } else {
            (product.price.display(), None)
        };

        Self {
            slug: product.slug.clone(),
            name: product.name.clone(),
            price,
            compare_at_price,
            image_url: product
                .main_image
                .as_ref()
                .map(|img| media::scaled_to_fill(&img.url, 600, 800)),
            hover_image_url: product
                .images
                .get(1)
                .map(|img| media::scaled_to_fill(&img.url, 600, 800)),
            short_description: product
                .info_section(SHORT_DESCRIPTION_SECTION)
                .map(String::from),
        }
    }
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub thumb_url: String,
    pub alt: String,
}

/// A purchasable variant in the detail page selector.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub price: Option<String>,
    pub in_stock: bool,
}

/// A titled block of product copy.
#[derive(Clone)]
pub struct InfoSectionView {
    pub title: String,
    pub description_html: String,
}

/// Product detail view.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description_html: Option<String>,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub images: Vec<ImageView>,
    /// Selectable variants; empty when the product has no options.
    pub variants: Vec<VariantView>,
    /// Variant id to submit when there is nothing to choose.
    pub default_variant_id: String,
    pub in_stock: bool,
    /// Upper bound for the quantity input.
    pub max_quantity: u32,
    pub info_sections: Vec<InfoSectionView>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let card = ProductCardView::from(product);

        let images = product
            .main_image
            .iter()
            .chain(product.images.iter())
            .fold(Vec::<ImageView>::new(), |mut acc, img| {
                let url = media::scaled_to_fill(&img.url, 1000, 1250);
                if !acc.iter().any(|seen| seen.url == url) {
                    acc.push(ImageView {
                        url,
                        thumb_url: media::scaled_to_fill(&img.url, 160, 200),
                        alt: img.alt_text.clone().unwrap_or_else(|| product.name.clone()),
                    });
                }
                acc
            });

        let variants = if product.options.is_empty() {
            Vec::new()
        } else {
            product
                .variants
                .iter()
                .filter(|v| !v.id.is_default())
                .map(|v| VariantView {
                    id: v.id.to_string(),
                    title: v.title(),
                    price: v.price.as_ref().map(mon_core::Price::display),
                    in_stock: v.in_stock,
                })
                .collect()
        };

        Self {
            id: product.id.to_string(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            description_html: product.description.clone().filter(|d| !d.is_empty()),
            price: card.price,
            compare_at_price: card.compare_at_price,
            images,
            variants,
            default_variant_id: VariantId::DEFAULT.to_string(),
            in_stock: product.in_stock,
            max_quantity: product.stock_quantity.unwrap_or(99).max(1),
            info_sections: product
                .info_sections
                .iter()
                .filter(|s| s.title != SHORT_DESCRIPTION_SECTION)
                .map(|s| InfoSectionView {
                    title: s.title.clone(),
                    description_html: s.description.clone(),
                })
                .collect(),
        }
    }
}

/// Pagination state for a listing.
#[derive(Clone)]
pub struct PaginationView {
    pub current_page: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

// =============================================================================
// Listing Query
// =============================================================================

/// Listing query string: `?cat=&name=&min=&max=&type=&sort=&page=`.
///
/// Values are kept as strings so blank form fields do not reject the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub cat: Option<String>,
    pub name: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl ListQuery {
    /// Collection slug, if one was requested.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        non_blank(self.cat.as_ref())
    }

    /// Zero-based page index; garbage reads as the first page.
    #[must_use]
    pub fn page(&self) -> u32 {
        non_blank(self.page.as_ref())
            .and_then(|p| p.parse().ok())
            .unwrap_or(0)
    }

    /// Whether `sort` is the selected ordering.
    #[must_use]
    pub fn sort_is(&self, sort: &str) -> bool {
        non_blank(self.sort.as_ref()) == Some(sort)
    }

    #[must_use]
    pub fn type_is(&self, product_type: &str) -> bool {
        non_blank(self.product_type.as_ref()) == Some(product_type)
    }

    /// Build the catalog query for this listing.
    #[must_use]
    pub fn to_product_query(&self, collection_id: Option<CollectionId>, limit: u32) -> ProductQuery {
        let product_types = non_blank(self.product_type.as_ref())
            .and_then(ProductType::parse)
            .map_or_else(|| ProductQuery::default().product_types, |t| vec![t]);

        ProductQuery {
            name: non_blank(self.name.as_ref()).map(String::from),
            collection_id,
            product_types,
            min_price: non_blank(self.min.as_ref())
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            max_price: non_blank(self.max.as_ref())
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_PRICE),
            sort: non_blank(self.sort.as_ref()).and_then(ProductSort::parse),
            limit,
            page: self.page(),
        }
    }

    /// URL of this listing on another page, keeping the other filters.
    #[must_use]
    pub fn page_url(&self, path: &str, page: u32) -> String {
        let mut pairs: Vec<(&str, String)> = [
            ("cat", &self.cat),
            ("name", &self.name),
            ("min", &self.min),
            ("max", &self.max),
            ("type", &self.product_type),
            ("sort", &self.sort),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_blank(value.as_ref()).map(|v| (key, v.to_string())))
        .collect();
        pairs.push(("page", page.to_string()));

        let query = pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{query}")
    }

    fn pagination(&self, path: &str, page: &ProductPage) -> PaginationView {
        PaginationView {
            current_page: page.current_page,
            prev_url: page
                .has_prev
                .then(|| self.page_url(path, page.current_page.saturating_sub(1))),
            next_url: page
                .has_next
                .then(|| self.page_url(path, page.current_page.saturating_add(1))),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductListTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub action: &'static str,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
    pub query: ListQuery,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub related: Vec<ProductCardView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Product listing with filters, sort and paging.
///
/// An unknown `cat` slug is a 404; no `cat` lists the whole catalog.
#[instrument(skip(state, visitor, ctx))]
pub async fn list(
    State(state): State<AppState>,
    visitor: Visitor,
    ctx: PageContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let token = visitor.access_token(&state).await;

    let collection = match query.category() {
        Some(slug) => Some(
            state
                .wix()
                .get_collection_by_slug(token.as_ref(), slug)
                .await?,
        ),
        None => None,
    };

    let product_query =
        query.to_product_query(collection.as_ref().map(|c| c.id.clone()), DEFAULT_LIMIT);
    let page = state
        .wix()
        .query_products(token.as_ref(), &product_query)
        .await?;

    Ok(ProductListTemplate {
        ctx,
        title: collection.map_or_else(|| "Shop".to_string(), |c| c.name),
        action: "/list",
        products: page.products.iter().map(ProductCardView::from).collect(),
        pagination: query.pagination("/list", &page),
        query,
    })
}

/// Deals: the new-arrivals collection, paged.
#[instrument(skip(state, visitor, ctx))]
pub async fn deals(
    State(state): State<AppState>,
    visitor: Visitor,
    ctx: PageContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let token = visitor.access_token(&state).await;

    let collection_id = state
        .config()
        .catalog
        .new_category_id
        .as_deref()
        .map(CollectionId::new);
    let product_query = ProductQuery {
        page: query.page(),
        ..ProductQuery::collection(collection_id, DEALS_LIMIT)
    };
    let page = state
        .wix()
        .query_products(token.as_ref(), &product_query)
        .await?;

    Ok(ProductListTemplate {
        ctx,
        title: "Deals".to_string(),
        action: "/list",
        products: page.products.iter().map(ProductCardView::from).collect(),
        pagination: query.pagination("/deals", &page),
        query: ListQuery::default(),
    })
}

/// Product detail page.
#[instrument(skip(state, visitor, ctx), fields(slug = %slug))]
pub async fn show(
    State(state): State<AppState>,
    visitor: Visitor,
    ctx: PageContext,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let token = visitor.access_token(&state).await;

    let product = state
        .wix()
        .get_product_by_slug(token.as_ref(), &slug)
        .await
        .map_err(|e| match e {
            crate::wix::WixError::NotFound(_) => {
                AppError::NotFound(format!("Product not found: {slug}"))
            }
            other => other.into(),
        })?;

    let featured = state
        .config()
        .catalog
        .featured_category_id
        .as_deref()
        .map(CollectionId::new);
    let related = state
        .wix()
        .query_products(
            token.as_ref(),
            &ProductQuery::collection(featured, RELATED_LIMIT),
        )
        .await
        .map_or_else(
            |e| {
                tracing::warn!("Failed to fetch related products: {e}");
                Vec::new()
            },
            |page| {
                page.products
                    .iter()
                    .filter(|p| p.id != product.id)
                    .map(ProductCardView::from)
                    .collect()
            },
        );

    Ok(ProductShowTemplate {
        ctx,
        product: ProductView::from(&product),
        related,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mon_core::{CurrencyCode, Price, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::wix::{Image, InfoSection, ProductOption, ProductVariant, SortOrder};

    fn product() -> Product {
        Product {
            id: ProductId::new("p-1"),
            slug: "gold-hoops".to_string(),
            name: "Gold Hoops".to_string(),
            description: Some("<p>Shiny</p>".to_string()),
            price: Price::new(Decimal::new(250, 0), CurrencyCode::ZAR),
            discounted_price: Price::new(Decimal::new(200, 0), CurrencyCode::ZAR),
            stock_quantity: Some(3),
            in_stock: true,
            main_image: Some(Image {
                url: "https://static.wixstatic.com/media/abc.jpg".to_string(),
                alt_text: None,
            }),
            images: vec![
                Image {
                    url: "https://static.wixstatic.com/media/abc.jpg".to_string(),
                    alt_text: None,
                },
                Image {
                    url: "https://static.wixstatic.com/media/def.jpg".to_string(),
                    alt_text: Some("Side".to_string()),
                },
            ],
            options: vec![ProductOption {
                name: "Size".to_string(),
                choices: vec!["S".to_string(), "M".to_string()],
            }],
            variants: vec![ProductVariant {
                id: VariantId::new("v-1"),
                choices: vec![("Size".to_string(), "S".to_string())],
                price: None,
                in_stock: true,
            }],
            info_sections: vec![
                InfoSection {
                    title: "shortDesc".to_string(),
                    description: "<p>Everyday hoops</p>".to_string(),
                },
                InfoSection {
                    title: "Care".to_string(),
                    description: "Keep dry".to_string(),
                },
            ],
            collection_ids: Vec::new(),
        }
    }

    #[test]
    fn test_card_shows_discount() {
        let card = ProductCardView::from(&product());
        assert_eq!(card.price, "R200.00");
        assert_eq!(card.compare_at_price.as_deref(), Some("R250.00"));
        assert_eq!(
            card.short_description.as_deref(),
            Some("<p>Everyday hoops</p>")
        );
        assert!(card.hover_image_url.unwrap().contains("def.jpg"));
    }

    #[test]
    fn test_detail_view_dedupes_images_and_hides_short_desc() {
        let view = ProductView::from(&product());
        assert_eq!(view.images.len(), 2);
        assert_eq!(view.info_sections.len(), 1);
        assert_eq!(view.info_sections[0].title, "Care");
        assert_eq!(view.variants.len(), 1);
        assert_eq!(view.variants[0].title, "S");
        assert_eq!(view.max_quantity, 3);
    }

    #[test]
    fn test_list_query_defaults() {
        let query = ListQuery::default().to_product_query(None, DEFAULT_LIMIT);
        assert_eq!(query, ProductQuery::default());
    }

    #[test]
    fn test_list_query_parses_filters() {
        let params = ListQuery {
            cat: Some("rings".to_string()),
            name: Some(" Gold ".to_string()),
            min: Some("10".to_string()),
            max: Some(String::new()),
            product_type: Some("digital".to_string()),
            sort: Some("asc price".to_string()),
            page: Some("2".to_string()),
        };
        let query = params.to_product_query(Some(CollectionId::new("c-1")), 4);
        assert_eq!(query.name.as_deref(), Some("Gold"));
        assert_eq!(query.min_price, 10);
        assert_eq!(query.max_price, DEFAULT_MAX_PRICE);
        assert_eq!(query.product_types, vec![ProductType::Digital]);
        assert_eq!(query.sort.as_ref().unwrap().order, SortOrder::Asc);
        assert_eq!(query.offset(), 8);
    }

    #[test]
    fn test_garbage_page_is_first_page() {
        let params = ListQuery {
            page: Some("abc".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(params.page(), 0);
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let params = ListQuery {
            cat: Some("rings".to_string()),
            name: Some("rose gold".to_string()),
            sort: Some(String::new()),
            page: Some("1".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(
            params.page_url("/list", 2),
            "/list?cat=rings&name=rose%20gold&page=2"
        );
    }
}
