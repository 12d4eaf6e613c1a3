//! Stores Reader: products and collections.

use serde_json::{Value, json};
use tracing::{debug, instrument};

use mon_core::CollectionId;

use crate::wix::WixError;
use crate::wix::types::{AccessToken, Collection, Product, ProductPage, ProductSort, ProductType, SortOrder};

use super::cache::CacheValue;
use super::client::WixClient;
use super::conversions::{convert_collection, convert_product};
use super::wire::{
    CollectionResponse, CollectionsResponse, Paging, ProductsResponse, QueryBody, QueryRequest,
};

const PRODUCTS_QUERY_PATH: &str = "/stores-reader/v1/products/query";
const COLLECTIONS_QUERY_PATH: &str = "/stores-reader/v1/collections/query";

/// Default page size on listing pages.
pub const DEFAULT_LIMIT: u32 = 4;
/// Upper price bound when none is given.
pub const DEFAULT_MAX_PRICE: u32 = 999_999;

/// Filters, sort and paging for a product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Name prefix.
    pub name: Option<String>,
    /// Restrict to one collection.
    pub collection_id: Option<CollectionId>,
    /// Allowed product types.
    pub product_types: Vec<ProductType>,
    /// Exclusive lower price bound.
    pub min_price: u32,
    /// Exclusive upper price bound.
    pub max_price: u32,
    pub sort: Option<ProductSort>,
    pub limit: u32,
    /// Zero-based page index.
    pub page: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            name: None,
            collection_id: None,
            product_types: vec![ProductType::Physical, ProductType::Digital],
            min_price: 0,
            max_price: DEFAULT_MAX_PRICE,
            sort: None,
            limit: DEFAULT_LIMIT,
            page: 0,
        }
    }
}

impl ProductQuery {
    /// Query for a single collection with the given page size.
    #[must_use]
    pub fn collection(collection_id: Option<CollectionId>, limit: u32) -> Self {
        Self {
            collection_id,
            limit,
            ..Self::default()
        }
    }

    /// Offset of the first product on the requested page.
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.page.saturating_mul(self.limit)
    }

    /// Wix filter document.
    #[must_use]
    pub fn filter(&self) -> Value {
        let mut filter = serde_json::Map::new();
        if let Some(name) = self.name.as_deref().filter(|n| !n.is_empty()) {
            filter.insert("name".to_string(), json!({ "$startsWith": name }));
        }
        if let Some(id) = &self.collection_id {
            filter.insert(
                "collectionIds".to_string(),
                json!({ "$hasSome": [id.as_str()] }),
            );
        }
        let types: Vec<&str> = self.product_types.iter().map(ProductType::as_str).collect();
        filter.insert("productType".to_string(), json!({ "$hasSome": types }));
        filter.insert(
            "priceData.price".to_string(),
            json!({ "$gt": self.min_price, "$lt": self.max_price }),
        );
        Value::Object(filter)
    }

    /// Wix sort document, if a sort was requested.
    #[must_use]
    pub fn sort_document(&self) -> Option<Value> {
        self.sort.as_ref().map(|s| {
            let direction = match s.order {
                SortOrder::Asc => "asc",
                SortOrder::Desc => "desc",
            };
            json!([{ s.field.as_str(): direction }])
        })
    }

    fn cache_key(&self) -> Option<String> {
        // Name searches are not cached.
        if self.name.is_some() {
            return None;
        }
        Some(format!(
            "products:{}:{:?}:{}:{}:{:?}:{}:{}",
            self.collection_id.as_ref().map_or("", |c| c.as_str()),
            self.product_types,
            self.min_price,
            self.max_price,
            self.sort,
            self.limit,
            self.page
        ))
    }

    fn to_request(&self) -> QueryRequest {
        QueryRequest {
            query: QueryBody {
                filter: self.filter().to_string(),
                sort: self.sort_document().map(|s| s.to_string()),
                paging: Paging {
                    limit: self.limit,
                    offset: self.offset(),
                },
            },
        }
    }
}

impl WixClient {
    /// Query products with filters and paging.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn query_products(
        &self,
        token: Option<&AccessToken>,
        query: &ProductQuery,
    ) -> Result<ProductPage, WixError> {
        let cache_key = query.cache_key();

        if let Some(key) = &cache_key
            && let Some(CacheValue::Products(page)) = self.inner.cache.get(key).await
        {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let response: ProductsResponse = self
            .post(PRODUCTS_QUERY_PATH, &query.to_request(), token)
            .await?;

        let returned = u32::try_from(response.products.len()).unwrap_or(u32::MAX);
        let has_next = response.total_results.map_or(returned >= query.limit, |total| {
            query.offset().saturating_add(returned) < total
        });

        let page = ProductPage {
            products: response.products.into_iter().map(convert_product).collect(),
            current_page: query.page,
            total_results: response.total_results,
            has_prev: query.page > 0,
            has_next,
        };

        if let Some(key) = cache_key {
            self.inner
                .cache
                .insert(key, CacheValue::Products(page.clone()))
                .await;
        }

        Ok(page)
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`WixError::NotFound`] if no product has the slug.
    #[instrument(skip(self, token), fields(slug = %slug))]
    pub async fn get_product_by_slug(
        &self,
        token: Option<&AccessToken>,
        slug: &str,
    ) -> Result<Product, WixError> {
        let cache_key = format!("product:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let request = QueryRequest {
            query: QueryBody {
                filter: json!({ "slug": slug }).to_string(),
                sort: None,
                paging: Paging {
                    limit: 1,
                    offset: 0,
                },
            },
        };
        let response: ProductsResponse = self.post(PRODUCTS_QUERY_PATH, &request, token).await?;

        let product = response
            .products
            .into_iter()
            .next()
            .map(convert_product)
            .ok_or_else(|| WixError::NotFound(format!("Product not found: {slug}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn query_collections(
        &self,
        token: Option<&AccessToken>,
        limit: u32,
    ) -> Result<Vec<Collection>, WixError> {
        let cache_key = format!("collections:{limit}");

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let request = QueryRequest {
            query: QueryBody {
                filter: "{}".to_string(),
                sort: None,
                paging: Paging { limit, offset: 0 },
            },
        };
        let response: CollectionsResponse =
            self.post(COLLECTIONS_QUERY_PATH, &request, token).await?;

        let collections: Vec<Collection> = response
            .collections
            .into_iter()
            .map(convert_collection)
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(collections.clone()))
            .await;

        Ok(collections)
    }

    /// Get a collection by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`WixError::NotFound`] if no collection has the slug.
    #[instrument(skip(self, token), fields(slug = %slug))]
    pub async fn get_collection_by_slug(
        &self,
        token: Option<&AccessToken>,
        slug: &str,
    ) -> Result<Collection, WixError> {
        let cache_key = format!("collection:{slug}");

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let path = format!(
            "/stores-reader/v1/collections/slug/{}",
            urlencoding::encode(slug)
        );
        let response: CollectionResponse = self
            .get(&path, token)
            .await
            .map_err(|e| match e {
                WixError::NotFound(_) => WixError::NotFound(format!("Collection not found: {slug}")),
                other => other,
            })?;

        let collection = convert_collection(response.collection);

        self.inner
            .cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_filter() {
        let query = ProductQuery::default();
        assert_eq!(
            query.filter(),
            json!({
                "productType": {"$hasSome": ["physical", "digital"]},
                "priceData.price": {"$gt": 0, "$lt": 999_999}
            })
        );
        assert_eq!(query.limit, 4);
        assert!(query.sort_document().is_none());
    }

    #[test]
    fn test_full_query_filter() {
        let query = ProductQuery {
            name: Some("Gold".to_string()),
            collection_id: Some(CollectionId::new("c-1")),
            product_types: vec![ProductType::Physical],
            min_price: 100,
            max_price: 500,
            sort: ProductSort::parse("desc price"),
            limit: 8,
            page: 2,
        };
        assert_eq!(
            query.filter(),
            json!({
                "name": {"$startsWith": "Gold"},
                "collectionIds": {"$hasSome": ["c-1"]},
                "productType": {"$hasSome": ["physical"]},
                "priceData.price": {"$gt": 100, "$lt": 500}
            })
        );
        assert_eq!(query.sort_document(), Some(json!([{"price": "desc"}])));
        assert_eq!(query.offset(), 16);
    }

    #[test]
    fn test_name_search_not_cached() {
        let mut query = ProductQuery::default();
        assert!(query.cache_key().is_some());
        query.name = Some("ring".to_string());
        assert!(query.cache_key().is_none());
    }

    #[test]
    fn test_request_serializes_filter_as_string() {
        let request = ProductQuery::collection(Some(CollectionId::new("new")), 4).to_request();
        let json = serde_json::to_value(&request).unwrap();
        assert!(json["query"]["filter"].is_string());
        assert_eq!(json["query"]["paging"], json!({"limit": 4, "offset": 0}));
        assert!(json["query"].get("sort").is_none());
    }
}
