//! Application state shared across the client.
//!
//! [`AppState`] owns the persisted [`Session`] and [`Cart`] together with the
//! storage port and clock they are mutated against. Every mutation writes the
//! affected blob back to storage before returning.
//!
//! # Episodes
//!
//! Each `login` and `logout` starts a new session *episode*. Long-running
//! operations (cart sync) remember the episode they started in and refuse to
//! install their result once it has moved on.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use emporium_core::{ProductId, UserId};

use crate::cart::{CART_SCHEMA_VERSION, Cart, CartLine, CartNotice, CartProduct};
use crate::clock::Clock;
use crate::error::{CartError, clear_sentry_user, set_sentry_user};
use crate::session::{SESSION_SCHEMA_VERSION, Session, UserIdentity};
use crate::storage::{KeyValueStore, StorageError, keys, load_versioned, save_versioned};

/// Shared client state.
///
/// This struct is cheaply cloneable via `Arc`; clones see the same session
/// and cart.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    access_token_ttl: TimeDelta,
    session: RwLock<Session>,
    cart: RwLock<Cart>,
    hydrated: AtomicBool,
    episode: AtomicU64,
}

impl AppState {
    /// Create state with an empty session and cart. Call [`Self::hydrate`]
    /// to restore what was persisted.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        access_token_ttl: Duration,
    ) -> Self {
        let access_token_ttl =
            TimeDelta::from_std(access_token_ttl).unwrap_or(TimeDelta::MAX);
        Self {
            inner: Arc::new(AppStateInner {
                store,
                clock,
                access_token_ttl,
                session: RwLock::new(Session::default()),
                cart: RwLock::new(Cart::default()),
                hydrated: AtomicBool::new(false),
                episode: AtomicU64::new(0),
            }),
        }
    }

    /// Restore the persisted session and cart, then mark the state hydrated.
    ///
    /// A persisted session that violates its invariant is replaced by an
    /// empty one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read; the state then
    /// stays un-hydrated.
    pub fn hydrate(&self) -> Result<(), StorageError> {
        let store = self.inner.store.as_ref();
        let mut session: Session =
            load_versioned(store, keys::AUTH, SESSION_SCHEMA_VERSION)?.unwrap_or_default();
        let cart: Cart = load_versioned(store, keys::CART, CART_SCHEMA_VERSION)?.unwrap_or_default();

        if !session.is_consistent() {
            warn!("Discarding inconsistent persisted session");
            session = Session::default();
        }

        debug!(
            authenticated = session.is_authenticated(),
            lines = cart.lines().len(),
            "State hydrated"
        );
        *self.write_session() = session;
        *self.write_cart() = cart;
        self.inner.hydrated.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Whether [`Self::hydrate`] has completed.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.inner.hydrated.load(Ordering::SeqCst)
    }

    /// The current session episode.
    #[must_use]
    pub fn episode(&self) -> u64 {
        self.inner.episode.load(Ordering::SeqCst)
    }

    /// The current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// A snapshot of the session.
    #[must_use]
    pub fn session(&self) -> Session {
        self.read_session().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_authenticated()
    }

    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.read_session().user().cloned()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.read_session().user_id()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read_session().access_token().map(str::to_string)
    }

    /// Whether the access token must be refreshed before use.
    #[must_use]
    pub fn is_access_token_expired(&self) -> bool {
        let now = self.now();
        self.read_session().is_access_token_expired(now)
    }

    /// Start an authenticated session and open the cart sync gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted; the in-memory
    /// state is updated regardless.
    pub fn login(&self, token: String, user: UserIdentity) -> Result<(), StorageError> {
        let now = self.now();
        set_sentry_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "Session started");

        let session = {
            let mut session = self.write_session();
            session.login(token, user, now, self.inner.access_token_ttl);
            session.clone()
        };
        let cart = {
            let mut cart = self.write_cart();
            cart.reset_sync();
            self.inner.episode.fetch_add(1, Ordering::SeqCst);
            cart.clone()
        };

        self.persist_session(&session)?;
        self.persist_cart(&cart)
    }

    /// End the session, empty the cart and reset the sync gate. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the new state cannot be persisted; the in-memory
    /// state is updated regardless.
    pub fn logout(&self) -> Result<(), StorageError> {
        clear_sentry_user();
        let session = {
            let mut session = self.write_session();
            if session.is_authenticated() {
                info!(user_id = ?session.user_id(), "Session ended");
            }
            session.logout();
            session.clone()
        };
        let cart = {
            let mut cart = self.write_cart();
            cart.clear();
            cart.reset_sync();
            self.inner.episode.fetch_add(1, Ordering::SeqCst);
            cart.clone()
        };

        self.persist_session(&session)?;
        self.persist_cart(&cart)
    }

    /// Install a refreshed access token. Identity is untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn set_token(&self, token: String) -> Result<(), StorageError> {
        let now = self.now();
        let session = {
            let mut session = self.write_session();
            session.set_token(token, now, self.inner.access_token_ttl);
            session.clone()
        };
        debug!(expires_at = ?session.access_token_expires_at(), "Access token refreshed");
        self.persist_session(&session)
    }

    /// Patch the user's names after a profile edit. Returns `false` when no
    /// user is logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be persisted.
    pub fn update_names(&self, first_name: &str, last_name: &str) -> Result<bool, StorageError> {
        let session = {
            let mut session = self.write_session();
            if !session.update_names(first_name, last_name) {
                return Ok(false);
            }
            session.clone()
        };
        self.persist_session(&session)?;
        Ok(true)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// A snapshot of the cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.read_cart().clone()
    }

    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.read_cart().lines().to_vec()
    }

    #[must_use]
    pub fn has_synced_once(&self) -> bool {
        self.read_cart().has_synced_once()
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Rejected` if the inventory cap would be exceeded
    /// (nothing changes), or `CartError::Storage` if persisting fails.
    pub fn add_to_cart(&self, product: &CartProduct) -> Result<CartNotice, CartError> {
        let (notice, cart) = {
            let mut cart = self.write_cart();
            let notice = cart.add(product)?;
            (notice, cart.clone())
        };
        self.persist_cart(&cart)?;
        Ok(notice)
    }

    /// Set a line's quantity; zero removes it. `Ok(None)` means no such line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Rejected` if the quantity exceeds the line's cap
    /// (nothing changes), or `CartError::Storage` if persisting fails.
    pub fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Option<CartNotice>, CartError> {
        let (notice, cart) = {
            let mut cart = self.write_cart();
            let Some(notice) = cart.update_quantity(product_id, quantity)? else {
                return Ok(None);
            };
            (notice, cart.clone())
        };
        self.persist_cart(&cart)?;
        Ok(Some(notice))
    }

    /// Drop a line, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn remove_from_cart(&self, product_id: ProductId) -> Result<Option<CartLine>, StorageError> {
        let (removed, cart) = {
            let mut cart = self.write_cart();
            let Some(removed) = cart.remove(product_id) else {
                return Ok(None);
            };
            (removed, cart.clone())
        };
        self.persist_cart(&cart)?;
        Ok(Some(removed))
    }

    /// Empty the cart. The sync gate is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn clear_cart(&self) -> Result<(), StorageError> {
        let cart = {
            let mut cart = self.write_cart();
            cart.clear();
            cart.clone()
        };
        self.persist_cart(&cart)
    }

    /// Replace the cart lines wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn set_cart(&self, lines: Vec<CartLine>) -> Result<(), StorageError> {
        let cart = {
            let mut cart = self.write_cart();
            cart.set_lines(lines);
            cart.clone()
        };
        self.persist_cart(&cart)
    }

    /// Close the sync gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn mark_synced(&self) -> Result<(), StorageError> {
        let cart = {
            let mut cart = self.write_cart();
            cart.mark_synced();
            cart.clone()
        };
        self.persist_cart(&cart)
    }

    /// Reopen the sync gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn reset_sync(&self) -> Result<(), StorageError> {
        let cart = {
            let mut cart = self.write_cart();
            cart.reset_sync();
            cart.clone()
        };
        self.persist_cart(&cart)
    }

    /// Replace the cart with a synchronized result and close the sync gate,
    /// but only if `episode` is still current.
    ///
    /// Returns `false` (and changes nothing) when the episode has moved on.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn install_synced_cart(
        &self,
        lines: Vec<CartLine>,
        episode: u64,
    ) -> Result<bool, StorageError> {
        let cart = {
            let mut cart = self.write_cart();
            if self.episode() != episode {
                return Ok(false);
            }
            cart.set_lines(lines);
            cart.mark_synced();
            cart.clone()
        };
        self.persist_cart(&cart)?;
        Ok(true)
    }

    /// Put back `lines` after a cart change the server did not accept, and
    /// reopen the sync gate so the next sync reconciles both carts. Only
    /// applies while `episode` is current.
    ///
    /// Returns `false` (and changes nothing) when the episode has moved on.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be persisted.
    pub fn rollback_cart(&self, lines: Vec<CartLine>, episode: u64) -> Result<bool, StorageError> {
        let cart = {
            let mut cart = self.write_cart();
            if self.episode() != episode {
                return Ok(false);
            }
            cart.set_lines(lines);
            cart.reset_sync();
            cart.clone()
        };
        self.persist_cart(&cart)?;
        Ok(true)
    }

    // =========================================================================
    // Refresh cookie
    // =========================================================================

    /// The persisted refresh-cookie header, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    pub fn load_cookies(&self) -> Result<Option<String>, StorageError> {
        self.inner.store.load(keys::COOKIES)
    }

    /// Persist the refresh-cookie header, or remove it when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    pub fn save_cookies(&self, header: Option<&str>) -> Result<(), StorageError> {
        match header {
            Some(header) => self.inner.store.save(keys::COOKIES, header),
            None => self.inner.store.remove(keys::COOKIES),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn persist_session(&self, session: &Session) -> Result<(), StorageError> {
        save_versioned(
            self.inner.store.as_ref(),
            keys::AUTH,
            SESSION_SCHEMA_VERSION,
            session,
        )
    }

    fn persist_cart(&self, cart: &Cart) -> Result<(), StorageError> {
        save_versioned(
            self.inner.store.as_ref(),
            keys::CART,
            CART_SCHEMA_VERSION,
            cart,
        )
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.inner
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.inner
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_cart(&self) -> RwLockReadGuard<'_, Cart> {
        self.inner.cart.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cart(&self) -> RwLockWriteGuard<'_, Cart> {
        self.inner.cart.write().unwrap_or_else(PoisonError::into_inner)
    }
}
