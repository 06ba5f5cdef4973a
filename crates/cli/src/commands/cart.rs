//! Cart commands.

use tracing::{debug, warn};

use emporium_core::ProductId;
use emporium_storefront::Shop;
use emporium_storefront::sync::SyncOutcome;

use crate::error::CliError;
use crate::output;

/// Run a due sync, logging instead of failing.
pub async fn sync_quietly(shop: &Shop) {
    match shop.sync_cart().await {
        Ok(outcome) => debug!(?outcome, "Startup cart sync"),
        Err(e) => warn!(error = %e, "Cart sync failed, will retry on next run"),
    }
}

pub fn show(shop: &Shop) {
    output::cart(&shop.cart());
}

pub async fn add(shop: &Shop, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    let notice = shop.add_product_to_cart(product_id, quantity).await?;
    output::notice(&notice);
    Ok(())
}

pub async fn set(shop: &Shop, product_id: ProductId, quantity: u32) -> Result<(), CliError> {
    match shop.update_quantity(product_id, quantity).await? {
        Some(notice) => output::notice(&notice),
        None => output::message(&format!("Product {product_id} is not in your cart")),
    }
    Ok(())
}

pub async fn remove(shop: &Shop, product_id: ProductId) -> Result<(), CliError> {
    match shop.remove_from_cart(product_id).await? {
        Some(line) => output::message(&format!("Item {} removed", line.name)),
        None => output::message(&format!("Product {product_id} is not in your cart")),
    }
    Ok(())
}

pub async fn clear(shop: &Shop) -> Result<(), CliError> {
    shop.clear_cart().await?;
    output::message("Cart cleared");
    Ok(())
}

pub async fn sync(shop: &Shop) -> Result<(), CliError> {
    match shop.sync_cart().await? {
        SyncOutcome::Synced { lines, merged } => {
            let how = if merged { "merged with" } else { "loaded from" };
            output::message(&format!("Cart {how} the server ({lines} line(s))"));
        }
        SyncOutcome::NotDue => output::message("Cart is already in sync"),
        SyncOutcome::NotReady => output::message("Log in to sync your cart"),
        SyncOutcome::Discarded => output::message("Session changed during sync, nothing applied"),
    }
    output::cart(&shop.cart());
    Ok(())
}
