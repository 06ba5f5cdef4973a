//! Server cart endpoints.
//!
//! The cart-item mutations echo local cart changes to the server; the sync
//! routine uses [`ApiClient::get_cart`] and [`ApiClient::sync_cart`] through
//! the [`CartBackend`] port.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

use emporium_core::{ProductId, UserId};

use super::types::{ServerCart, SyncCartItem, SyncCartRequest};
use super::{ApiClient, ApiError};
use crate::sync::CartBackend;

impl ApiClient {
    /// Fetch the user's server-side cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: UserId, token: &str) -> Result<ServerCart, ApiError> {
        self.send_data(
            self.authed(Method::GET, &format!("carts/user/{user_id}/cart"), token),
            "Failed to fetch cart",
        )
        .await
    }

    /// Merge local lines into the server cart and return the merged cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token, items), fields(user_id = %user_id, lines = items.len()))]
    pub async fn sync_cart(
        &self,
        user_id: UserId,
        items: &[SyncCartItem],
        token: &str,
    ) -> Result<ServerCart, ApiError> {
        let cart: ServerCart = self
            .send_data(
                self.authed(Method::POST, &format!("carts/user/{user_id}/syncCart"), token)
                    .json(&SyncCartRequest { items }),
                "Failed to sync cart",
            )
            .await?;
        debug!(cart_id = %cart.cart_id, lines = cart.items.len(), "Cart merged");
        Ok(cart)
    }

    /// Add a quantity of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        token: &str,
    ) -> Result<(), ApiError> {
        self.send_empty(
            self.authed(Method::POST, "cartItems/cartItem/add", token)
                .query(&[("productId", product_id.as_i64()), ("quantity", i64::from(quantity))]),
            "Failed to add item to cart",
        )
        .await
    }

    /// Set the quantity of a server cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        token: &str,
    ) -> Result<(), ApiError> {
        self.send_empty(
            self.authed(
                Method::PUT,
                &format!("cartItems/cart/update/item/{product_id}"),
                token,
            )
            .query(&[("quantity", quantity)]),
            "Failed to update cart item",
        )
        .await
    }

    /// Remove a product from the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_cart_item(&self, product_id: ProductId, token: &str) -> Result<(), ApiError> {
        self.send_empty(
            self.authed(
                Method::DELETE,
                &format!("cartItems/cart/delete/item/{product_id}"),
                token,
            ),
            "Failed to remove cart item",
        )
        .await
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn clear_server_cart(&self, token: &str) -> Result<(), ApiError> {
        self.send_empty(
            self.authed(Method::DELETE, "carts/user/clearCart", token),
            "Failed to clear cart",
        )
        .await
    }
}

#[async_trait]
impl CartBackend for ApiClient {
    async fn fetch_cart(&self, user_id: UserId, token: &str) -> Result<ServerCart, ApiError> {
        self.get_cart(user_id, token).await
    }

    async fn merge_cart(
        &self,
        user_id: UserId,
        items: &[SyncCartItem],
        token: &str,
    ) -> Result<ServerCart, ApiError> {
        self.sync_cart(user_id, items, token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::test_client;
    use super::*;
    use emporium_core::CartId;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_cart_body() -> serde_json::Value {
        json!({"data": {
            "cartId": 3,
            "totalAmount": 20.0,
            "items": [{
                "itemId": 1,
                "quantity": 2,
                "unitPrice": 10.0,
                "totalPrice": 20.0,
                "product": {"id": 5, "name": "Mug", "price": 10.0, "inventory": 8}
            }]
        }})
    }

    #[tokio::test]
    async fn test_sync_cart_posts_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/carts/user/7/syncCart"))
            .and(header("Authorization", "Bearer tok"))
            .and(body_json(json!({"items": [{"productId": 5, "quantity": 2}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(server_cart_body()))
            .expect(1)
            .mount(&server)
            .await;

        let items = [SyncCartItem {
            product_id: ProductId::new(5),
            quantity: 2,
        }];
        let cart = test_client(&server)
            .sync_cart(UserId::new(7), &items, "tok")
            .await
            .unwrap();
        assert_eq!(cart.cart_id, CartId::new(3));
        assert_eq!(cart.items.len(), 1);
    }

    #[tokio::test]
    async fn test_get_cart_error_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .get_cart(UserId::new(7), "tok")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to fetch cart");
    }

    #[tokio::test]
    async fn test_item_mutations_use_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cartItems/cartItem/add"))
            .and(query_param("productId", "5"))
            .and(query_param("quantity", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/cartItems/cart/update/item/5"))
            .and(query_param("quantity", "3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/cartItems/cart/delete/item/5"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/carts/user/clearCart"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let id = ProductId::new(5);
        client.add_cart_item(id, 1, "tok").await.unwrap();
        client.update_cart_item(id, 3, "tok").await.unwrap();
        client.remove_cart_item(id, "tok").await.unwrap();
        client.clear_server_cart("tok").await.unwrap();
    }
}
