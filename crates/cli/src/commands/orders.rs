//! Checkout, payment and order history.

use emporium_core::{AddressId, OrderId};
use emporium_storefront::Shop;
use emporium_storefront::checkout::{GuestCheckout, PendingOrder};

use crate::AddressArgs;
use crate::commands::addresses::to_address;
use crate::error::CliError;
use crate::output;

pub async fn checkout_user(
    shop: &Shop,
    shipping: AddressId,
    billing: AddressId,
) -> Result<(), CliError> {
    let pending = shop.checkout_user(shipping, billing).await?;
    print_pending(&pending);
    Ok(())
}

pub async fn checkout_guest(shop: &Shop, email: String, address: AddressArgs) -> Result<(), CliError> {
    let form = GuestCheckout {
        email,
        shipping_address: to_address(address, false, false),
        billing_address: None,
    };
    let pending = shop.checkout_guest(form).await?;
    print_pending(&pending);
    Ok(())
}

pub fn pay(shop: &Shop, order_id: OrderId, client_secret: String) -> Result<(), CliError> {
    let order_id = shop.confirm_payment(PendingOrder::new(order_id, client_secret))?;
    output::message(&format!("Payment recorded for order {order_id}. Thank you!"));
    Ok(())
}

pub async fn list(shop: &Shop) -> Result<(), CliError> {
    output::orders(&shop.orders().await?);
    Ok(())
}

fn print_pending(pending: &PendingOrder) {
    output::message(&format!("Order {} placed, awaiting payment", pending.order_id));
    output::message(&format!("Payment client secret: {}", pending.client_secret));
    output::message(&format!(
        "After paying, run: emporium pay {} <client-secret>",
        pending.order_id
    ));
}
