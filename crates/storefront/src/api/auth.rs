//! Authentication endpoints: login, refresh, logout, registration.

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument};

use super::types::{AuthResponse, LoginRequest, RefreshResponse, RegisterRequest, UserDto};
use super::{ApiClient, ApiError};
use crate::token::TokenRefresher;

impl ApiClient {
    /// Exchange credentials for an access token.
    ///
    /// The backend also sets the refresh-token cookie, which the client's
    /// cookie jar keeps for [`Self::refresh_access_token`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or another error
    /// if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let response: AuthResponse = self
            .send_json(
                self.request(Method::POST, "auth/login").json(&body),
                "Login failed",
            )
            .await?;
        info!(user_id = %response.user_id, "Logged in");
        Ok(response)
    }

    /// Mint a new access token from the refresh-token cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the cookie is missing or expired, or the request fails.
    #[instrument(skip(self))]
    pub async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let response: RefreshResponse = self
            .send_json(
                self.request(Method::POST, "auth/refresh-token"),
                "Failed to refresh access token",
            )
            .await?;
        Ok(response.access_token)
    }

    /// Invalidate the refresh-token cookie on the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send_empty(self.request(Method::POST, "auth/logout"), "Logout failed")
            .await
    }

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration (e.g. the
    /// email is taken) or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserDto, ApiError> {
        self.send_json(
            self.request(Method::POST, "users/add").json(request),
            "Registration failed",
        )
        .await
    }
}

#[async_trait]
impl TokenRefresher for ApiClient {
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        Self::refresh_access_token(self).await
    }
}
