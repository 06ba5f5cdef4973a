//! The storefront facade.
//!
//! [`Shop`] ties the persisted state, the REST client and the cart
//! synchronizer together and is what front ends (the CLI, tests) drive.
//! Authenticated calls all go through the token guard; cart mutations are
//! checked locally first and only echoed to the server when they succeed;
//! an echo the server does not accept rolls the local change back.

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, instrument, warn};

use emporium_core::{AddressId, OrderId, OrderStatus, ProductId};

use crate::api::types::{Address, Order, Page, PlaceOrderRequest, Product, ProductInput, UserDto};
use crate::api::{ApiClient, ApiError};
use crate::cart::{Cart, CartLine, CartNotice, CartProduct};
use crate::checkout::{GuestCheckout, PendingOrder, Registration, validate_address};
use crate::clock::SystemClock;
use crate::config::ClientConfig;
use crate::error::StoreError;
use crate::session::UserIdentity;
use crate::state::AppState;
use crate::storage::FileStore;
use crate::sync::{CartSynchronizer, SyncOutcome, SyncState};
use crate::token::with_valid_token;

/// Storefront client facade.
pub struct Shop {
    state: AppState,
    api: ApiClient,
    sync: CartSynchronizer,
}

impl Shop {
    /// Build a shop from configuration, backed by files in `state_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or persisted state
    /// cannot be read.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StoreError> {
        let api = ApiClient::new(&config.api)?;
        let state = AppState::new(
            Arc::new(FileStore::new(config.state_dir.clone())),
            Arc::new(SystemClock),
            config.access_token_ttl,
        );
        Self::open(state, api)
    }

    /// Hydrate `state` and restore the refresh cookie into `api`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state cannot be read.
    pub fn open(state: AppState, api: ApiClient) -> Result<Self, StoreError> {
        state.hydrate()?;
        if let Some(cookies) = state.load_cookies()? {
            api.restore_cookies(&cookies);
        }
        Ok(Self {
            state,
            api,
            sync: CartSynchronizer::new(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Log in, then reconcile the local cart with the server cart.
    ///
    /// A failed cart sync does not fail the login; it is retried by the next
    /// call to [`Self::sync_cart`].
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the session cannot
    /// be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<UserIdentity, StoreError> {
        let auth = self.api.login(email, password).await?;
        let user = auth.identity();
        self.state.login(auth.access_token, user.clone())?;
        self.persist_cookies();

        if let Err(e) = self.sync_cart().await {
            warn!(error = %e, "Cart sync after login failed");
        }
        Ok(user)
    }

    /// Log out. The backend call is best effort; the local session, cart and
    /// refresh cookie are always dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleared state cannot be persisted.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), StoreError> {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "Backend logout failed, logging out locally");
        }
        self.state.logout()?;
        self.api.clear_cookies();
        self.state.save_cookies(None)?;
        Ok(())
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the form breaks a rule (no server
    /// call is made), or an error if the backend rejects the registration.
    #[instrument(skip(self, form))]
    pub async fn register(&self, form: Registration) -> Result<UserDto, StoreError> {
        let request = form.into_request()?;
        Ok(self.api.register(&request).await?)
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn whoami(&self) -> Option<UserIdentity> {
        self.state.user()
    }

    /// Change the logged-in user's names, remotely and in the local session.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if the update fails.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, first_name: &str, last_name: &str) -> Result<UserDto, StoreError> {
        let user_id = self.state.user_id().ok_or(StoreError::NotAuthenticated)?;
        let updated = self.api.update_user(user_id, first_name, last_name).await?;
        self.state
            .update_names(&updated.first_name, &updated.last_name)?;
        Ok(updated)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Run the cart sync if it is due.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails; see [`CartSynchronizer::run_if_due`].
    pub async fn sync_cart(&self) -> Result<SyncOutcome, StoreError> {
        let was_expired = self.state.is_access_token_expired();
        let outcome = self.sync.run_if_due(&self.state, &self.api, &self.api).await;
        if was_expired {
            if !self.state.is_authenticated() {
                self.api.clear_cookies();
            }
            self.persist_cookies();
        }
        Ok(outcome?)
    }

    /// A snapshot of the local cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.state.cart()
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Cart` if the inventory cap would be exceeded (no
    /// server call is made), or an error if the server echo fails, in which
    /// case the local change is rolled back.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: &CartProduct) -> Result<CartNotice, StoreError> {
        let before = self.echo_snapshot();
        let notice = self.state.add_to_cart(product)?;
        let quantity = product.requested_quantity();
        if let Some(before) = before {
            let api = &self.api;
            self.echo(before, |token| async move {
                api.add_cart_item(product.id, quantity, &token).await
            })
            .await?;
        }
        Ok(notice)
    }

    /// Look a product up and add `quantity` of it to the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the product cannot be fetched, or as
    /// [`Self::add_to_cart`].
    pub async fn add_product_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartNotice, StoreError> {
        let product = self.api.product(product_id).await?;
        self.add_to_cart(&product.to_cart_product().with_quantity(quantity))
            .await
    }

    /// Set a line's quantity; zero removes it. `Ok(None)` means no such line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Cart` if the quantity exceeds the line's cap (no
    /// server call is made), or an error if the server echo fails.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Option<CartNotice>, StoreError> {
        let before = self.echo_snapshot();
        let Some(notice) = self.state.update_quantity(product_id, quantity)? else {
            return Ok(None);
        };
        if let Some(before) = before {
            let api = &self.api;
            if quantity == 0 {
                self.echo(before, |token| async move {
                    api.remove_cart_item(product_id, &token).await
                })
                .await?;
            } else {
                self.echo(before, |token| async move {
                    api.update_cart_item(product_id, quantity, &token).await
                })
                .await?;
            }
        }
        Ok(Some(notice))
    }

    /// Remove a line. `Ok(None)` means no such line.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be persisted or the server echo fails.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<Option<CartLine>, StoreError> {
        let before = self.echo_snapshot();
        let Some(removed) = self.state.remove_from_cart(product_id)? else {
            return Ok(None);
        };
        if let Some(before) = before {
            let api = &self.api;
            self.echo(before, |token| async move {
                api.remove_cart_item(product_id, &token).await
            })
            .await?;
        }
        Ok(Some(removed))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be persisted or the server echo fails.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), StoreError> {
        let before = self.echo_snapshot();
        self.state.clear_cart()?;
        if let Some(before) = before {
            let api = &self.api;
            self.echo(before, |token| async move { api.clear_server_cart(&token).await })
                .await?;
        }
        Ok(())
    }

    /// Local cart changes are mirrored to the server once the server cart has
    /// been reconciled for this session; before that the pending sync carries them.
    ///
    /// Returns the cart and session episode to roll back to if the mirror fails.
    fn echo_snapshot(&self) -> Option<(Cart, u64)> {
        (self.state.is_authenticated() && self.state.has_synced_once())
            .then(|| (self.state.cart(), self.state.episode()))
    }

    /// Mirror a local cart change to the server.
    ///
    /// On failure the cart goes back to `before` and the sync gate reopens,
    /// so the next [`Self::sync_cart`] reconciles with whatever the server holds.
    async fn echo<T, F, Fut>(&self, before: (Cart, u64), call: F) -> Result<(), StoreError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Err(e) = self.authed(call).await else {
            return Ok(());
        };
        let (cart, episode) = before;
        match self.state.rollback_cart(cart.lines().to_vec(), episode) {
            Ok(true) => warn!(error = %e, "Cart change not accepted by server, rolled back"),
            Ok(false) => {}
            Err(storage) => warn!(error = %storage, "Failed to persist cart rollback"),
        }
        Err(e)
    }

    // =========================================================================
    // Checkout & orders
    // =========================================================================

    /// Place an order for the server cart and request a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if placing the order or creating the intent fails.
    #[instrument(skip(self))]
    pub async fn checkout_user(
        &self,
        shipping_address_id: AddressId,
        billing_address_id: AddressId,
    ) -> Result<PendingOrder, StoreError> {
        self.sync_cart().await?;
        let request = PlaceOrderRequest {
            shipping_address_id,
            billing_address_id,
        };
        let api = &self.api;
        let order = self
            .authed(|token| async move { api.place_order(&request, &token).await })
            .await?;
        let client_secret = self.api.create_payment_intent(order.id).await?;
        info!(order_id = %order.id, "Awaiting payment");
        Ok(PendingOrder::new(order.id, client_secret))
    }

    /// Place a guest order for the local cart and request a payment intent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the form is invalid (no network
    /// call is made), or an error if placing the order fails.
    #[instrument(skip_all)]
    pub async fn checkout_guest(&self, form: GuestCheckout) -> Result<PendingOrder, StoreError> {
        let request = form.into_request(&self.state.cart_lines())?;
        let order = self.api.place_guest_order(&request).await?;
        let client_secret = self.api.create_payment_intent(order.id).await?;
        info!(order_id = %order.id, "Awaiting guest payment");
        Ok(PendingOrder::new(order.id, client_secret))
    }

    /// Record a successful payment; empties the local cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the emptied cart cannot be persisted.
    pub fn confirm_payment(&self, pending: PendingOrder) -> Result<OrderId, StoreError> {
        pending.confirm_paid(self)
    }

    /// Orders of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if the request fails.
    pub async fn orders(&self) -> Result<Vec<Order>, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.user_orders(&token).await })
            .await
    }

    // =========================================================================
    // Addresses
    // =========================================================================

    /// The logged-in user's address book.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if the request fails.
    pub async fn addresses(&self) -> Result<Vec<Address>, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.addresses(&token).await })
            .await
    }

    /// Validate and add an address, applying its default flags.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an invalid address (no network
    /// call is made), or an error if a request fails.
    #[instrument(skip_all)]
    pub async fn add_address(&self, address: &Address) -> Result<Address, StoreError> {
        validate_address(address)?;
        let api = &self.api;
        let mut saved = self
            .authed(|token| async move { api.add_address(address, &token).await })
            .await?;
        if let Some(id) = saved.id {
            if address.default_shipping {
                saved = self.set_default_shipping(id).await?;
            }
            if address.default_billing {
                saved = self.set_default_billing(id).await?;
            }
        }
        Ok(saved)
    }

    /// Validate and replace an address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for an invalid address (no network
    /// call is made), or an error if the request fails.
    pub async fn update_address(&self, id: AddressId, address: &Address) -> Result<Address, StoreError> {
        validate_address(address)?;
        let api = &self.api;
        self.authed(|token| async move { api.update_address(id, address, &token).await })
            .await
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if the request fails.
    pub async fn delete_address(&self, id: AddressId) -> Result<(), StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.delete_address(id, &token).await })
            .await
    }

    /// Make an address the default shipping address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if the request fails.
    pub async fn set_default_shipping(&self, id: AddressId) -> Result<Address, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.set_default_shipping(id, &token).await })
            .await
    }

    /// Make an address the default billing address.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotAuthenticated` without a session, or an error
    /// if the request fails.
    pub async fn set_default_billing(&self, id: AddressId) -> Result<Address, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.set_default_billing(id, &token).await })
            .await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Paginated orders across all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not an admin.
    pub async fn admin_orders(
        &self,
        status: Option<OrderStatus>,
        page: u32,
        size: u32,
    ) -> Result<Page<Order>, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.admin_orders(status, page, size, &token).await })
            .await
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not an admin.
    pub async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.update_order_status(id, status, &token).await })
            .await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not an admin.
    pub async fn add_product(&self, input: &ProductInput) -> Result<Product, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.add_product(input, &token).await })
            .await
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not an admin.
    pub async fn update_product(&self, id: ProductId, input: &ProductInput) -> Result<Product, StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.update_product(id, input, &token).await })
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the user is not an admin.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let api = &self.api;
        self.authed(|token| async move { api.delete_product(id, &token).await })
            .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Run `call` through the token guard.
    ///
    /// No session maps to `StoreError::NotAuthenticated`. A refresh that
    /// fails ends the local session, since no valid credential is left.
    async fn authed<T, F, Fut>(&self, call: F) -> Result<T, StoreError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let was_expired = self.state.is_access_token_expired();
        let result = with_valid_token(&self.state, &self.api, |token| async move {
            call(token).await.map_err(StoreError::from)
        })
        .await;

        if was_expired && self.state.is_authenticated() {
            if result.is_err() && self.state.is_access_token_expired() {
                warn!("Access token could not be refreshed, logging out");
                if let Err(e) = self.state.logout() {
                    warn!(error = %e, "Failed to persist logout");
                }
                self.api.clear_cookies();
            }
            self.persist_cookies();
        }

        result?.ok_or(StoreError::NotAuthenticated)
    }

    fn persist_cookies(&self) {
        if let Err(e) = self.state.save_cookies(self.api.export_cookies().as_deref()) {
            warn!(error = %e, "Failed to persist refresh cookie");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::tests::test_client;
    use crate::clock::ManualClock;
    use crate::state::tests::product;
    use crate::storage::MemoryStore;
    use chrono::{TimeDelta, Utc};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn shop(server: &MockServer) -> (Shop, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            Duration::from_secs(295),
        );
        (Shop::open(state, test_client(server)).unwrap(), clock)
    }

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "refreshToken=r-1; Path=/; HttpOnly")
                    .set_body_json(json!({
                        "accessToken": "a-1",
                        "userId": 7,
                        "email": "ada@example.com",
                        "firstName": "Ada",
                        "lastName": "Lovelace"
                    })),
            )
            .mount(server)
            .await;
    }

    fn empty_cart() -> serde_json::Value {
        json!({"data": {"cartId": 1, "items": [], "totalAmount": 0}})
    }

    #[tokio::test]
    async fn test_login_syncs_and_persists_cookie() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .and(header("Authorization", "Bearer a-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart()))
            .expect(1)
            .mount(&server)
            .await;

        let (shop, _) = shop(&server);
        let user = shop
            .login("ada@example.com", &SecretString::from("pw"))
            .await
            .unwrap();

        assert_eq!(user.first_name, "Ada");
        assert!(shop.state().has_synced_once());
        assert_eq!(shop.sync_state(), SyncState::Synced);
        assert_eq!(
            shop.state().load_cookies().unwrap().as_deref(),
            Some("refreshToken=r-1")
        );
    }

    #[tokio::test]
    async fn test_rejected_add_never_reaches_server() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cartItems/cartItem/add"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (shop, _) = shop(&server);
        shop.login("ada@example.com", &SecretString::from("pw"))
            .await
            .unwrap();

        shop.add_to_cart(&product(1, 1)).await.unwrap();
        let err = shop.add_to_cart(&product(1, 1)).await.unwrap_err();

        assert!(matches!(err, StoreError::Cart(_)));
        assert_eq!(shop.cart().lines()[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_guest_cart_is_not_echoed() {
        let server = MockServer::start().await;
        let (shop, _) = shop(&server);

        let notice = shop.add_to_cart(&product(1, 3)).await.unwrap();

        assert_eq!(notice.to_string(), "Product Product 1 added to cart");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_forces_logout() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/orders/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(0)
            .mount(&server)
            .await;

        let (shop, clock) = shop(&server);
        shop.login("ada@example.com", &SecretString::from("pw"))
            .await
            .unwrap();
        clock.advance(TimeDelta::seconds(600));

        let err = shop.orders().await.unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Authentication);
        assert!(!shop.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_orders_require_login() {
        let server = MockServer::start().await;
        let (shop, _) = shop(&server);

        let err = shop.orders().await.unwrap_err();
        assert!(matches!(err, StoreError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_locally() {
        let server = MockServer::start().await;
        let (shop, _) = shop(&server);
        let address = Address {
            id: None,
            recipient_name: "Ada".to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "627".to_string(),
            country: "US".to_string(),
            phone: "5551234567".to_string(),
            default_shipping: false,
            default_billing: false,
        };

        let err = shop.add_address(&address).await.unwrap_err();

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_weak_password_is_rejected_locally() {
        let server = MockServer::start().await;
        let (shop, _) = shop(&server);
        let form = Registration {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            password: SecretString::from("password"),
            confirm_password: SecretString::from("password"),
        };

        let err = shop.register(form).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::Validation(crate::checkout::ValidationError::WeakPassword)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_drops_refresh_cookie() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (shop, _) = shop(&server);
        shop.login("ada@example.com", &SecretString::from("pw"))
            .await
            .unwrap();
        assert!(shop.api().export_cookies().is_some());

        shop.logout().await.unwrap();

        assert!(shop.api().export_cookies().is_none());
        assert!(shop.state().load_cookies().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_remove_echo_restores_line() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/cartItems/cartItem/add"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (shop, _) = shop(&server);
        shop.login("ada@example.com", &SecretString::from("pw"))
            .await
            .unwrap();
        shop.add_to_cart(&product(1, 5).with_quantity(2)).await.unwrap();

        let err = shop.remove_from_cart(ProductId::new(1)).await.unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::Transient);
        assert_eq!(shop.cart().lines().len(), 1);
        assert_eq!(shop.cart().lines()[0].quantity, 2);
        assert!(!shop.state().has_synced_once());
    }
}
