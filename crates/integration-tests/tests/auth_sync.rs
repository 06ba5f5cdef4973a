//! Login, token refresh and cart reconciliation against the mocked backend.

#![allow(clippy::unwrap_used)]

use chrono::TimeDelta;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use emporium_core::ProductId;
use emporium_integration_tests::{TestContext, product};
use emporium_storefront::ErrorKind;
use emporium_storefront::sync::{SyncOutcome, SyncState};

#[tokio::test]
async fn test_login_merges_local_cart() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/carts/user/7/syncCart"))
        .and(header("Authorization", "Bearer a-1"))
        .and(body_json(json!({"items": [{"productId": 1, "quantity": 1}]})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(emporium_integration_tests::cart_body(&[(1, 1)])),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    shop.add_to_cart(&product(1, 5)).await.unwrap();
    ctx.login(&shop).await;

    let cart = shop.cart();
    assert!(cart.has_synced_once());
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].product_id, ProductId::new(1));
    assert_eq!(shop.sync_state(), SyncState::Synced);
}

#[tokio::test]
async fn test_merge_installs_exactly_server_lines() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_merge(&[(2, 4), (3, 1)]).await;

    let shop = ctx.shop();
    shop.add_to_cart(&product(1, 5)).await.unwrap();
    shop.add_to_cart(&product(2, 5)).await.unwrap();
    ctx.login(&shop).await;

    let ids: Vec<_> = shop
        .cart()
        .lines()
        .iter()
        .map(|l| (l.product_id, l.quantity))
        .collect();
    assert_eq!(
        ids,
        vec![(ProductId::new(2), 4), (ProductId::new(3), 1)]
    );
}

#[tokio::test]
async fn test_empty_local_cart_adopts_server_cart() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[(5, 2)]).await;

    let shop = ctx.shop();
    ctx.login(&shop).await;

    assert_eq!(shop.cart().total_quantity(), 2);
    assert!(ctx.requests_to("/syncCart").await.is_empty());
}

#[tokio::test]
async fn test_sync_runs_once_per_session() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    let seen = ctx.server.received_requests().await.unwrap().len();

    for _ in 0..3 {
        assert_eq!(shop.sync_cart().await.unwrap(), SyncOutcome::NotDue);
    }

    assert_eq!(ctx.server.received_requests().await.unwrap().len(), seen);
}

#[tokio::test]
async fn test_gate_resets_on_login_and_logout() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    assert!(shop.state().has_synced_once());

    shop.logout().await.unwrap();
    assert!(!shop.state().has_synced_once());
    assert!(!shop.state().is_authenticated());
    assert!(shop.state().load_cookies().unwrap().is_none());
    assert!(shop.api().export_cookies().is_none());

    shop.state()
        .login("a-2".to_string(), shop_user())
        .unwrap();
    assert!(!shop.state().has_synced_once());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_before_call() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .and(header("Cookie", "refreshToken=r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a-2"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orders/user"))
        .and(header("Authorization", "Bearer a-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    ctx.clock.advance(TimeDelta::seconds(300));

    let orders = shop.orders().await.unwrap();

    assert!(orders.is_empty());
    assert_eq!(shop.state().access_token().as_deref(), Some("a-2"));
    assert!(!shop.state().is_access_token_expired());
}

#[tokio::test]
async fn test_refresh_failure_skips_call() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Refresh token expired"})),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orders/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    ctx.clock.advance(TimeDelta::seconds(300));

    let err = shop.orders().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!shop.state().is_authenticated());
}

#[tokio::test]
async fn test_backend_failure_after_refresh_keeps_session() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a-2"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/orders/user"))
        .and(header("Authorization", "Bearer a-2"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Database down"})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    ctx.clock.advance(TimeDelta::seconds(300));

    let err = shop.orders().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(shop.state().is_authenticated());
    assert_eq!(shop.state().access_token().as_deref(), Some("a-2"));
    assert!(shop.api().export_cookies().is_some());
}

#[tokio::test]
async fn test_session_survives_restart() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[(1, 1)]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh-token"))
        .and(header("Cookie", "refreshToken=r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": "a-2"})))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/addresses"))
        .and(header("Authorization", "Bearer a-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&ctx.server)
        .await;

    {
        let shop = ctx.shop();
        ctx.login(&shop).await;
    }
    ctx.clock.advance(TimeDelta::seconds(600));

    // the refresh cookie is restored from disk into the new client
    let shop = ctx.shop();
    assert_eq!(shop.whoami().map(|u| u.email).as_deref(), Some("ada@example.com"));
    assert_eq!(shop.cart().total_quantity(), 1);
    assert!(shop.addresses().await.unwrap().is_empty());
}

fn shop_user() -> emporium_storefront::session::UserIdentity {
    emporium_storefront::session::UserIdentity {
        id: emporium_core::UserId::new(7),
        email: "ada@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        role: emporium_core::UserRole::User,
    }
}
