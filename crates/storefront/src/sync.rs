//! Cart synchronization.
//!
//! Once per login episode, after local state has been restored, the local
//! cart is reconciled with the server cart:
//!
//! - a non-empty local cart is sent to the merge endpoint, which returns the
//!   authoritative merged cart;
//! - an empty local cart just pulls the server cart down.
//!
//! Either way the local lines are replaced wholesale by the server's lines
//! and the sync gate is closed. A failed merge leaves the gate open so the
//! next trigger retries; a failed token refresh logs the user out instead.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use emporium_core::UserId;

use crate::api::ApiError;
use crate::api::types::{ServerCart, SyncCartItem};
use crate::cart::CartLine;
use crate::state::AppState;
use crate::storage::StorageError;
use crate::token::{RefreshError, Refreshed, TokenRefresher, refresh_once};

/// Server cart operations the sync routine needs.
#[async_trait]
pub trait CartBackend: Send + Sync {
    /// Fetch the user's server cart.
    async fn fetch_cart(&self, user_id: UserId, token: &str) -> Result<ServerCart, ApiError>;

    /// Merge `items` into the user's server cart and return the result.
    async fn merge_cart(
        &self,
        user_id: UserId,
        items: &[SyncCartItem],
        token: &str,
    ) -> Result<ServerCart, ApiError>;
}

/// Observable state of the sync routine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Synced,
    Failed,
}

/// What a call to [`CartSynchronizer::run_if_due`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing to do: not hydrated, not authenticated, already synced, or a
    /// sync is already running.
    NotDue,
    /// Token or user ID missing; try again later.
    NotReady,
    /// The server cart was installed locally.
    Synced { lines: usize, merged: bool },
    /// The session changed while syncing; the result was dropped.
    Discarded,
}

/// Errors from the sync routine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The access token could not be refreshed; the user was logged out.
    #[error("Your session has expired, please log in again")]
    Refresh(#[source] ApiError),

    /// A token was refreshed but no user is known locally; the user was logged out.
    #[error("Your session is incomplete, please log in again")]
    MissingIdentity,

    /// Fetching or merging the server cart failed; the sync will be retried.
    #[error("Failed to synchronize cart: {0}")]
    Backend(#[source] ApiError),

    /// The synchronized cart could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Runs the one-shot cart reconciliation.
#[derive(Debug, Default)]
pub struct CartSynchronizer {
    state: Mutex<SyncState>,
}

impl CartSynchronizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of the routine.
    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the entry condition holds: hydrated, authenticated and the
    /// sync gate still open.
    #[must_use]
    pub fn is_due(app: &AppState) -> bool {
        app.is_hydrated() && app.is_authenticated() && !app.has_synced_once()
    }

    /// Run the sync if its entry condition holds.
    ///
    /// Safe to call on every state change: once the gate is closed it makes
    /// no network calls until the next login or logout, or until a cart
    /// change the server did not accept reopens it.
    ///
    /// # Errors
    ///
    /// - `SyncError::Refresh` / `SyncError::MissingIdentity`: the user was
    ///   logged out and the routine will not retry.
    /// - `SyncError::Backend`: the gate stays open and the next call retries.
    /// - `SyncError::Storage`: the local result could not be persisted.
    #[instrument(skip_all, fields(episode = app.episode()))]
    pub async fn run_if_due<B, R>(
        &self,
        app: &AppState,
        backend: &B,
        refresher: &R,
    ) -> Result<SyncOutcome, SyncError>
    where
        B: CartBackend + ?Sized,
        R: TokenRefresher + ?Sized,
    {
        if !Self::is_due(app) || !self.begin() {
            return Ok(SyncOutcome::NotDue);
        }

        let result = Self::sync(app, backend, refresher).await;
        let next = match &result {
            Ok(SyncOutcome::Synced { .. }) => SyncState::Synced,
            Ok(_) => SyncState::Idle,
            Err(_) => SyncState::Failed,
        };
        self.set_state(next);
        result
    }

    async fn sync<B, R>(
        app: &AppState,
        backend: &B,
        refresher: &R,
    ) -> Result<SyncOutcome, SyncError>
    where
        B: CartBackend + ?Sized,
        R: TokenRefresher + ?Sized,
    {
        let episode = app.episode();
        let (Some(token), Some(user_id)) = (app.access_token(), app.user_id()) else {
            debug!("Token or user ID missing, sync not ready");
            return Ok(SyncOutcome::NotReady);
        };

        let token = if app.is_access_token_expired() {
            match refresh_once(app, refresher).await {
                Ok(Refreshed::Token(token)) => token,
                Ok(Refreshed::NoIdentity) => {
                    force_logout(app, episode);
                    return Err(SyncError::MissingIdentity);
                }
                Err(RefreshError::Api(e)) => {
                    warn!(error = %e, "Token refresh failed during cart sync");
                    force_logout(app, episode);
                    return Err(SyncError::Refresh(e));
                }
                Err(RefreshError::Storage(e)) => return Err(SyncError::Storage(e)),
            }
        } else {
            token
        };

        let local = app.cart_lines();
        let merged = !local.is_empty();
        let response = if merged {
            let items: Vec<SyncCartItem> = local.iter().map(SyncCartItem::from).collect();
            backend.merge_cart(user_id, &items, &token).await
        } else {
            backend.fetch_cart(user_id, &token).await
        };
        let server = response.map_err(|e| {
            warn!(error = %e, "Cart sync request failed");
            SyncError::Backend(e)
        })?;

        let lines: Vec<CartLine> = server.items.into_iter().map(CartLine::from).collect();
        let count = lines.len();
        if !app.install_synced_cart(lines, episode)? {
            info!("Session changed during cart sync, discarding result");
            return Ok(SyncOutcome::Discarded);
        }

        info!(user_id = %user_id, lines = count, merged, "Cart synchronized");
        Ok(SyncOutcome::Synced {
            lines: count,
            merged,
        })
    }

    /// Move to `Syncing` unless already there.
    fn begin(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == SyncState::Syncing {
            return false;
        }
        *state = SyncState::Syncing;
        true
    }

    fn set_state(&self, next: SyncState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Log out after an unrecoverable refresh failure, unless the session has
/// already moved on.
fn force_logout(app: &AppState, episode: u64) {
    if app.episode() != episode {
        return;
    }
    if let Err(e) = app.logout() {
        warn!(error = %e, "Failed to persist logout after refresh failure");
    }
}
