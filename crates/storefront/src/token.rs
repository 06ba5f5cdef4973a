//! Token-guarded calls.
//!
//! Every authenticated backend call goes through [`with_valid_token`], the
//! single place that decides whether the access token has to be refreshed
//! first. A refresh is attempted at most once per call and never retried.

use std::future::Future;

use async_trait::async_trait;
use tracing::{debug, warn};

use emporium_core::UserId;

use crate::api::ApiError;
use crate::state::AppState;
use crate::storage::StorageError;

/// The session operations the token guard needs.
pub trait SessionOps {
    /// The current access token, if any.
    fn access_token(&self) -> Option<String>;

    /// Whether the access token must be refreshed before use.
    fn is_access_token_expired(&self) -> bool;

    /// ID of the locally known user, if any.
    fn user_id(&self) -> Option<UserId>;

    /// Install a refreshed token.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    fn set_token(&self, token: String) -> Result<(), StorageError>;

    /// Drop the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    fn logout(&self) -> Result<(), StorageError>;
}

/// Mints a new access token from the refresh credential.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange the refresh credential for a new access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh credential is missing, expired or the
    /// request fails.
    async fn refresh_access_token(&self) -> Result<String, ApiError>;
}

impl SessionOps for AppState {
    fn access_token(&self) -> Option<String> {
        Self::access_token(self)
    }

    fn is_access_token_expired(&self) -> bool {
        Self::is_access_token_expired(self)
    }

    fn user_id(&self) -> Option<UserId> {
        Self::user_id(self)
    }

    fn set_token(&self, token: String) -> Result<(), StorageError> {
        Self::set_token(self, token)
    }

    fn logout(&self) -> Result<(), StorageError> {
        Self::logout(self)
    }
}

/// Result of a successful call to the refresh endpoint.
#[derive(Debug)]
pub(crate) enum Refreshed {
    /// The new token was installed in the session.
    Token(String),
    /// The backend issued a token but no local identity exists to attach it to.
    NoIdentity,
}

/// Call the refresh endpoint once and install the new token.
///
/// Does not log out on [`Refreshed::NoIdentity`]; callers decide.
pub(crate) async fn refresh_once<S, R>(session: &S, refresher: &R) -> Result<Refreshed, RefreshError>
where
    S: SessionOps + ?Sized,
    R: TokenRefresher + ?Sized,
{
    let token = refresher.refresh_access_token().await?;
    if session.user_id().is_none() {
        return Ok(Refreshed::NoIdentity);
    }
    session.set_token(token.clone())?;
    Ok(Refreshed::Token(token))
}

/// Failure of [`refresh_once`].
#[derive(Debug, thiserror::Error)]
pub(crate) enum RefreshError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Run `call` with a valid access token.
///
/// - No token: returns `Ok(None)` without calling anything.
/// - Expired token: refreshes once, installs the new token and calls `call`
///   with it. If no local identity exists the session is logged out and
///   `Ok(None)` is returned without calling `call`.
/// - Valid token: calls `call` directly.
///
/// # Errors
///
/// Errors from the refresh endpoint and from `call` propagate unchanged, as do
/// failures to persist the session.
pub async fn with_valid_token<S, R, F, Fut, T, E>(
    session: &S,
    refresher: &R,
    call: F,
) -> Result<Option<T>, E>
where
    S: SessionOps + ?Sized,
    R: TokenRefresher + ?Sized,
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<ApiError> + From<StorageError>,
{
    let Some(token) = session.access_token() else {
        debug!("No access token, skipping authenticated call");
        return Ok(None);
    };

    let token = if session.is_access_token_expired() {
        debug!("Access token expired, refreshing");
        match refresh_once(session, refresher).await {
            Ok(Refreshed::Token(token)) => token,
            Ok(Refreshed::NoIdentity) => {
                warn!("No local identity after refresh, logging out");
                session.logout()?;
                return Ok(None);
            }
            Err(RefreshError::Api(e)) => return Err(e.into()),
            Err(RefreshError::Storage(e)) => return Err(e.into()),
        }
    } else {
        token
    };

    call(token).await.map(Some)
}
