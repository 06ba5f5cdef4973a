//! Integration tests for the Emporium storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! Every test drives a [`Shop`] against a `wiremock` backend. State is
//! persisted to a temporary directory so restarts can be simulated by
//! opening a second shop on the same directory.
//!
//! # Test Categories
//!
//! - `cart_flows` - Local cart rules and persistence
//! - `auth_sync` - Login, token refresh and cart reconciliation

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use emporium_core::{Price, ProductId};
use emporium_storefront::Shop;
use emporium_storefront::api::ApiClient;
use emporium_storefront::cart::CartProduct;
use emporium_storefront::clock::ManualClock;
use emporium_storefront::config::ApiConfig;
use emporium_storefront::state::AppState;
use emporium_storefront::storage::FileStore;

/// Access token lifetime used by every test shop.
pub const TOKEN_TTL: Duration = Duration::from_secs(295);

/// A mocked backend plus the directory holding persisted client state.
pub struct TestContext {
    pub server: MockServer,
    pub clock: Arc<ManualClock>,
    dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            )),
            dir: TempDir::new().unwrap(),
        }
    }

    /// Open a shop on the persisted state. Calling this twice simulates a restart.
    pub fn shop(&self) -> Shop {
        let api = ApiClient::new(&ApiConfig::new(&self.server.uri()).unwrap()).unwrap();
        let state = AppState::new(
            Arc::new(FileStore::new(self.dir.path())),
            self.clock.clone(),
            TOKEN_TTL,
        );
        Shop::open(state, api).unwrap()
    }

    /// Requests the backend has seen whose path ends with `suffix`.
    pub async fn requests_to(&self, suffix: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().ends_with(suffix))
            .collect()
    }

    /// Accept `ada@example.com` and issue access token `a-1` plus a refresh cookie.
    pub async fn mount_login(&self) {
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
                        "lastName": "Lovelace",
                        "role": "USER"
                    })),
            )
            .mount(&self.server)
            .await;
    }

    /// Server cart returned by `GET carts/user/7/cart`.
    pub async fn mount_server_cart(&self, items: &[(i64, u32)]) {
        Mock::given(method("GET"))
            .and(path("/api/v1/carts/user/7/cart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(items)))
            .mount(&self.server)
            .await;
    }

    /// Merged cart returned by `POST carts/user/7/syncCart`.
    pub async fn mount_merge(&self, items: &[(i64, u32)]) {
        Mock::given(method("POST"))
            .and(path("/api/v1/carts/user/7/syncCart"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(items)))
            .mount(&self.server)
            .await;
    }

    /// Log in as user 7.
    pub async fn login(&self, shop: &Shop) {
        shop.login("ada@example.com", &SecretString::from("correct horse"))
            .await
            .unwrap();
    }
}

/// A cart product priced at $10.00.
pub fn product(id: i64, inventory: u32) -> CartProduct {
    CartProduct {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: String::new(),
        price: Price::from_cents(1000),
        inventory,
        image: None,
        category: None,
        quantity: None,
    }
}

/// JSON for a product with plenty of stock.
pub fn product_json(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "price": 10.0,
        "description": "",
        "inventory": 10,
        "images": []
    })
}

/// `{ data: ServerCart }` holding `(product_id, quantity)` lines.
pub fn cart_body(items: &[(i64, u32)]) -> Value {
    let lines: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(i, (id, quantity))| {
            json!({
                "itemId": i + 1,
                "quantity": quantity,
                "unitPrice": 10.0,
                "totalPrice": 10.0 * f64::from(*quantity),
                "product": product_json(*id)
            })
        })
        .collect();
    json!({"data": {"cartId": 1, "items": lines, "totalAmount": 0}})
}
