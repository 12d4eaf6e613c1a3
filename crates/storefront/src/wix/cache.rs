//! Cache types for catalog responses.

use crate::wix::types::{Collection, Product, ProductPage};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    Collection(Box<Collection>),
    Collections(Vec<Collection>),
}
