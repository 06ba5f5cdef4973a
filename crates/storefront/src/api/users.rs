//! User profile endpoints.

use reqwest::Method;
use tracing::instrument;

use emporium_core::UserId;

use super::types::{UserDto, UserUpdateRequest};
use super::{ApiClient, ApiError};

impl ApiClient {
    /// Update a user's first and last name.
    ///
    /// The backend does not require a bearer token for this endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        user_id: UserId,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserDto, ApiError> {
        let body = UserUpdateRequest {
            first_name,
            last_name,
        };
        self.send_data(
            self.request(Method::PUT, &format!("users/{user_id}/update"))
                .json(&body),
            "Failed to update user",
        )
        .await
    }

    /// Fetch a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: UserId, token: &str) -> Result<UserDto, ApiError> {
        self.send_data(
            self.authed(Method::GET, &format!("users/user/{user_id}/user"), token),
            "Failed to fetch user by ID",
        )
        .await
    }
}
