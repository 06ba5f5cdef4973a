//! CLI error type.

use emporium_storefront::StoreError;
use emporium_storefront::api::ApiError;
use emporium_storefront::checkout::ValidationError;
use emporium_storefront::config::ConfigError;
use thiserror::Error;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A storefront operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Store(err.into())
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Store(err.into())
    }
}

impl CliError {
    /// The message to print for the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => self.to_string(),
            Self::Store(err) => err.user_message(),
        }
    }

    /// Log the error and send unexpected failures to Sentry.
    pub fn report(&self) {
        match self {
            Self::Config(e) => tracing::error!(error = %e, "Invalid configuration"),
            Self::Store(e) => e.report(),
        }
    }
}
