//! Order endpoints: history, checkout, payment intents, admin management.

use reqwest::Method;
use tracing::{info, instrument};

use emporium_core::{OrderId, OrderStatus};

use super::types::{
    Order, Page, PaymentIntent, PaymentIntentRequest, PlaceGuestOrderRequest, PlaceOrderRequest,
};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Orders placed by the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn user_orders(&self, token: &str) -> Result<Vec<Order>, ApiError> {
        self.send_data(
            self.authed(Method::GET, "orders/user", token),
            "Failed to fetch orders",
        )
        .await
    }

    /// Place an order from the server cart using two address-book entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, request, token))]
    pub async fn place_order(
        &self,
        request: &PlaceOrderRequest,
        token: &str,
    ) -> Result<Order, ApiError> {
        let order: Order = self
            .send_data(
                self.authed(Method::POST, "orders/user/placeOrder", token)
                    .json(request),
                "Failed to place order",
            )
            .await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");
        Ok(order)
    }

    /// Place an order without an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn place_guest_order(
        &self,
        request: &PlaceGuestOrderRequest,
    ) -> Result<Order, ApiError> {
        let order: Order = self
            .send_data(
                self.request(Method::POST, "orders/guest/placeOrder")
                    .json(request),
                "Failed to place guest order",
            )
            .await?;
        info!(order_id = %order.id, total = %order.total_amount, "Guest order placed");
        Ok(order)
    }

    /// Obtain the payment client secret for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn create_payment_intent(&self, order_id: OrderId) -> Result<String, ApiError> {
        let intent: PaymentIntent = self
            .send_data(
                self.request(Method::POST, "orders/paymentIntent")
                    .json(&PaymentIntentRequest { order_id }),
                "Failed to create payment intent",
            )
            .await?;
        Ok(intent.client_secret)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Paginated order list, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is not an admin.
    #[instrument(skip(self, token))]
    pub async fn admin_orders(
        &self,
        status: Option<OrderStatus>,
        page: u32,
        size: u32,
        token: &str,
    ) -> Result<Page<Order>, ApiError> {
        let status = status.as_ref().map_or("", OrderStatus::as_str);
        self.send_data(
            self.authed(Method::GET, "orders/admin", token).query(&[
                ("status", status.to_string()),
                ("page", page.to_string()),
                ("size", size.to_string()),
            ]),
            "Failed to fetch admin orders",
        )
        .await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the caller is not an admin.
    #[instrument(skip(self, token), fields(order_id = %order_id, status = %status))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        token: &str,
    ) -> Result<Order, ApiError> {
        self.send_data(
            self.authed(Method::PUT, &format!("orders/admin/{order_id}/status"), token)
                .query(&[("status", status.as_str())]),
            "Failed to update order status",
        )
        .await
    }
}
