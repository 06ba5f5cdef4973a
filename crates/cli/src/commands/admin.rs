//! Admin order management commands.
//!
//! # Usage
//!
//! ```bash
//! # Pending orders, second page of 50
//! emporium admin orders --status pending --page 1 --size 50
//!
//! # Mark an order shipped
//! emporium admin status 1001 shipped
//! ```
//!
//! The backend rejects these for non-admin users.

use emporium_core::{OrderId, OrderStatus};
use emporium_storefront::Shop;

use crate::error::CliError;
use crate::output;

/// List orders across all users.
pub async fn orders(
    shop: &Shop,
    status: Option<OrderStatus>,
    page: u32,
    size: u32,
) -> Result<(), CliError> {
    let result = shop.admin_orders(status, page, size).await?;
    output::orders(&result.content);
    output::page_footer(result.number, result.total_pages);
    Ok(())
}

/// Move an order to a new status.
pub async fn set_status(shop: &Shop, order_id: OrderId, status: OrderStatus) -> Result<(), CliError> {
    tracing::info!(%order_id, %status, "Updating order status");
    let order = shop.update_order_status(order_id, status).await?;
    output::order(&order);
    Ok(())
}
