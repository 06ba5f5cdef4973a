//! Catalog endpoints: products and categories.
//!
//! Read-only responses are cached for the configured catalog TTL. Search
//! results are never cached. Admin mutations flush the whole cache.

use reqwest::Method;
use tracing::{debug, info, instrument};

use emporium_core::ProductId;

use super::cache::CacheValue;
use super::types::{Category, Product, ProductInput, ProductPage};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let cache_key = "products:all".to_string();

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send_data(
                self.request(Method::GET, "products/all"),
                "Failed to fetch products",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// A single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = format!("product:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .send_data(
                self.request(Method::GET, &format!("products/product/{id}/product")),
                "Failed to fetch product",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Every product in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ApiError> {
        let cache_key = format!("category:{category}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .send_data(
                self.request(Method::GET, &format!("products/{category}/all")),
                "Failed to fetch category products",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// One page of a category's products.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products_page(
        &self,
        category: &str,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError> {
        let cache_key = format!("category:{category}:{page}:{limit}");

        if let Some(CacheValue::ProductPage(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product page");
            return Ok(products);
        }

        let products: ProductPage = self
            .send_data(
                self.request(Method::GET, &format!("products/{category}"))
                    .query(&[("page", page), ("limit", limit)]),
                "Failed to fetch category products",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::ProductPage(products.clone()))
            .await;

        Ok(products)
    }

    /// Search products by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        name: &str,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, ApiError> {
        self.send_data(
            self.request(Method::GET, "products/search").query(&[
                ("name", name.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ]),
            "Failed to search products",
        )
        .await
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let cache_key = "categories".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories: Vec<Category> = self
            .send_data(
                self.request(Method::GET, "categories/all"),
                "Failed to fetch categories",
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is not an admin.
    #[instrument(skip(self, input, token), fields(name = %input.name))]
    pub async fn add_product(&self, input: &ProductInput, token: &str) -> Result<Product, ApiError> {
        let product: Product = self
            .send_data(
                self.authed(Method::POST, "products/add", token).json(input),
                "Failed to add product",
            )
            .await?;
        self.inner.cache.invalidate_all();
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is not an admin.
    #[instrument(skip(self, input, token), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
        token: &str,
    ) -> Result<Product, ApiError> {
        let product: Product = self
            .send_data(
                self.authed(Method::PUT, &format!("products/product/{id}/update"), token)
                    .json(input),
                "Failed to update product",
            )
            .await?;
        self.inner.cache.invalidate_all();
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is not an admin.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId, token: &str) -> Result<(), ApiError> {
        self.send_empty(
            self.authed(Method::DELETE, &format!("products/product/{id}/delete"), token),
            "Failed to delete product",
        )
        .await?;
        self.inner.cache.invalidate_all();
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
