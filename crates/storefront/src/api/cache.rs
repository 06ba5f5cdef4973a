//! Cache types for catalog responses.

use super::types::{Category, Product, ProductPage};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    ProductPage(ProductPage),
    Categories(Vec<Category>),
}
