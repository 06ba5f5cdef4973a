//! Address book commands.

use emporium_core::AddressId;
use emporium_storefront::Shop;
use emporium_storefront::api::types::Address;

use crate::AddressArgs;
use crate::error::CliError;
use crate::output;

/// Build an address from command-line fields.
pub fn to_address(args: AddressArgs, default_shipping: bool, default_billing: bool) -> Address {
    Address {
        id: None,
        recipient_name: args.recipient,
        street: args.street,
        city: args.city,
        state: args.state,
        zipcode: args.zipcode,
        country: args.country,
        phone: args.phone,
        default_shipping,
        default_billing,
    }
}

pub async fn list(shop: &Shop) -> Result<(), CliError> {
    output::addresses(&shop.addresses().await?);
    Ok(())
}

pub async fn add(
    shop: &Shop,
    args: AddressArgs,
    default_shipping: bool,
    default_billing: bool,
) -> Result<(), CliError> {
    let saved = shop
        .add_address(&to_address(args, default_shipping, default_billing))
        .await?;
    output::addresses(std::slice::from_ref(&saved));
    Ok(())
}

pub async fn remove(shop: &Shop, id: AddressId) -> Result<(), CliError> {
    shop.delete_address(id).await?;
    output::message(&format!("Address {id} deleted"));
    Ok(())
}

pub async fn default_shipping(shop: &Shop, id: AddressId) -> Result<(), CliError> {
    let address = shop.set_default_shipping(id).await?;
    output::message(&format!("Default shipping address: {}", address.summary()));
    Ok(())
}

pub async fn default_billing(shop: &Shop, id: AddressId) -> Result<(), CliError> {
    let address = shop.set_default_billing(id).await?;
    output::message(&format!("Default billing address: {}", address.summary()));
    Ok(())
}
