//! Address book endpoints.

use reqwest::Method;
use tracing::instrument;

use emporium_core::AddressId;

use super::types::Address;
use super::{ApiClient, ApiError};

impl ApiClient {
    /// All addresses of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn addresses(&self, token: &str) -> Result<Vec<Address>, ApiError> {
        self.send_data(
            self.authed(Method::GET, "addresses", token),
            "Failed to fetch addresses",
        )
        .await
    }

    /// Add an address; returns it with its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, address, token))]
    pub async fn add_address(&self, address: &Address, token: &str) -> Result<Address, ApiError> {
        self.send_data(
            self.authed(Method::POST, "addresses/add", token).json(address),
            "Failed to add address",
        )
        .await
    }

    /// Replace an existing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, address, token), fields(address_id = %address_id))]
    pub async fn update_address(
        &self,
        address_id: AddressId,
        address: &Address,
        token: &str,
    ) -> Result<Address, ApiError> {
        self.send_data(
            self.authed(Method::PUT, &format!("addresses/{address_id}"), token)
                .json(address),
            "Failed to update address",
        )
        .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn delete_address(&self, address_id: AddressId, token: &str) -> Result<(), ApiError> {
        self.send_empty(
            self.authed(Method::DELETE, &format!("addresses/{address_id}"), token),
            "Failed to delete address",
        )
        .await
    }

    /// Mark an address as the default shipping address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn set_default_shipping(
        &self,
        address_id: AddressId,
        token: &str,
    ) -> Result<Address, ApiError> {
        self.send_data(
            self.authed(
                Method::PUT,
                &format!("addresses/defaultShipping/{address_id}"),
                token,
            ),
            "Failed to set default shipping address",
        )
        .await
    }

    /// Mark an address as the default billing address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(address_id = %address_id))]
    pub async fn set_default_billing(
        &self,
        address_id: AddressId,
        token: &str,
    ) -> Result<Address, ApiError> {
        self.send_data(
            self.authed(
                Method::PUT,
                &format!("addresses/defaultBilling/{address_id}"),
                token,
            ),
            "Failed to set default billing address",
        )
        .await
    }
}
