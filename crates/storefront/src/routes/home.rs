//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use mon_core::CollectionId;

use crate::filters;
use crate::middleware::Visitor;
use crate::routes::context::PageContext;
use crate::routes::products::ProductCardView;
use crate::state::AppState;
use crate::wix::{Collection, ProductQuery, media};

/// Products in the featured grid.
const FEATURED_LIMIT: u32 = 8;
/// Products in the new arrivals strip.
const NEW_LIMIT: u32 = 4;
/// Categories in the browse grid.
const CATEGORY_LIMIT: u32 = 20;

// =============================================================================
// Hero Configuration (Static content for the slider)
// =============================================================================

/// A single slide in the hero slider.
#[derive(Clone)]
pub struct HeroSlide {
    pub title: &'static str,
    pub description: &'static str,
    pub url: &'static str,
    /// CSS modifier selecting the slide's backdrop.
    pub theme: &'static str,
}

fn hero_slides() -> Vec<HeroSlide> {
    vec![
        HeroSlide {
            title: "Summer Sale Collections",
            description: "Sale! Buy 3 & Get Up to 50% off!",
            url: "/list",
            theme: "summer",
        },
        HeroSlide {
            title: "Summer Sale Collections",
            description: "Sale! Up to 20% off!",
            url: "/deals",
            theme: "summer-deals",
        },
        HeroSlide {
            title: "Spring Sale Collections",
            description: "Sale! Up to 50% off!",
            url: "/list",
            theme: "spring",
        },
    ]
}

/// Category tile for the browse grid.
#[derive(Clone)]
pub struct CategoryView {
    pub slug: String,
    pub name: String,
    pub image_url: Option<String>,
}

impl From<&Collection> for CategoryView {
    fn from(collection: &Collection) -> Self {
        Self {
            slug: collection.slug.clone(),
            name: collection.name.clone(),
            image_url: collection
                .image
                .as_ref()
                .map(|img| media::scaled_to_fill(&img.url, 640, 480)),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub hero: Vec<HeroSlide>,
    pub featured_products: Vec<ProductCardView>,
    pub categories: Vec<CategoryView>,
    pub new_products: Vec<ProductCardView>,
}

fn collection_query(id: Option<&str>, limit: u32) -> ProductQuery {
    ProductQuery::collection(id.map(CollectionId::new), limit)
}

/// Display the home page.
///
/// Each section degrades to empty on its own when Wix fails.
#[instrument(skip(state, visitor, ctx))]
pub async fn home(
    State(state): State<AppState>,
    visitor: Visitor,
    ctx: PageContext,
) -> impl IntoResponse {
    let token = visitor.access_token(&state).await;
    let catalog = &state.config().catalog;
    let wix = state.wix();

    let featured_query = collection_query(catalog.featured_category_id.as_deref(), FEATURED_LIMIT);
    let new_query = collection_query(catalog.new_category_id.as_deref(), NEW_LIMIT);

    let (featured, collections, new_arrivals) = tokio::join!(
        wix.query_products(token.as_ref(), &featured_query),
        wix.query_collections(token.as_ref(), CATEGORY_LIMIT),
        wix.query_products(token.as_ref(), &new_query),
    );

    let featured_products = featured.map_or_else(
        |e| {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        },
        |page| page.products.iter().map(ProductCardView::from).collect(),
    );

    let categories = collections.map_or_else(
        |e| {
            tracing::error!("Failed to fetch categories: {e}");
            Vec::new()
        },
        |collections| collections.iter().map(CategoryView::from).collect(),
    );

    let new_products = new_arrivals.map_or_else(
        |e| {
            tracing::error!("Failed to fetch new products: {e}");
            Vec::new()
        },
        |page| page.products.iter().map(ProductCardView::from).collect(),
    );

    HomeTemplate {
        ctx,
        hero: hero_slides(),
        featured_products,
        categories,
        new_products,
    }
}
