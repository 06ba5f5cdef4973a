//! Unified error handling with Sentry integration.
//!
//! [`StoreError`] is what every [`crate::shop::Shop`] operation returns. Its
//! [`StoreError::kind`] sorts failures into the four classes a front end
//! reacts to differently: forced re-login, retryable toast, inline form
//! error, or a business-rule rejection.

use thiserror::Error;
use tracing::{error, warn};

use crate::api::ApiError;
use crate::cart::CartRejection;
use crate::checkout::ValidationError;
use crate::storage::StorageError;
use crate::sync::SyncError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Persisting local state failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Cart mutation refused by a business rule.
    #[error(transparent)]
    Cart(#[from] CartRejection),

    /// Form input rejected before any network call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Cart synchronization failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The operation needs a logged-in user.
    #[error("Please log in to continue")]
    NotAuthenticated,
}

/// How the caller should react to a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable credentials: the user must log in again.
    Authentication,
    /// Network or backend failure; state is unchanged and the action may be retried.
    Transient,
    /// Input failed validation.
    Validation,
    /// Refused by a business rule such as the inventory cap.
    BusinessRule,
}

impl StoreError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated
            | Self::Api(ApiError::Unauthorized(_))
            | Self::Sync(SyncError::Refresh(_) | SyncError::MissingIdentity) => {
                ErrorKind::Authentication
            }
            Self::Api(_) | Self::Storage(_) | Self::Sync(_) => ErrorKind::Transient,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Cart(_) => ErrorKind::BusinessRule,
        }
    }

    /// The message to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) | Self::Sync(SyncError::Backend(err)) => {
                err.user_message()
            }
            _ => self.to_string(),
        }
    }

    /// Log the error and, for unexpected failures, send it to Sentry.
    pub fn report(&self) {
        match self.kind() {
            ErrorKind::Transient => {
                let event_id = sentry::capture_error(self);
                error!(error = %self, sentry_event_id = %event_id, "Store operation failed");
            }
            ErrorKind::Authentication => warn!(error = %self, "Authentication required"),
            ErrorKind::Validation | ErrorKind::BusinessRule => {}
        }
    }
}

/// A cart mutation failed either on a business rule or while persisting.
#[derive(Debug, Error)]
pub enum CartError {
    #[error(transparent)]
    Rejected(#[from] CartRejection),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<CartError> for StoreError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Rejected(rejection) => Self::Cart(rejection),
            CartError::Storage(storage) => Self::Storage(storage),
        }
    }
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
