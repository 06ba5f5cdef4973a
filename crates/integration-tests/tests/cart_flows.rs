//! Local cart rules: inventory cap, quantity updates, persistence.
//!
//! Most tests run without a session, so nothing is echoed to the backend.
//! The echo tests log in first and check what happens when the backend
//! does not accept a change.

#![allow(clippy::unwrap_used)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use emporium_core::ProductId;
use emporium_integration_tests::{TestContext, product};
use emporium_storefront::ErrorKind;
use emporium_storefront::cart::CartNotice;
use emporium_storefront::sync::SyncOutcome;

#[tokio::test]
async fn test_add_twice_within_cap() {
    let ctx = TestContext::new().await;
    let shop = ctx.shop();

    let first = shop.add_to_cart(&product(1, 2)).await.unwrap();
    let second = shop.add_to_cart(&product(1, 2)).await.unwrap();

    assert!(matches!(first, CartNotice::Added { .. }));
    assert!(matches!(second, CartNotice::QuantityUpdated { .. }));
    let cart = shop.cart();
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
}

#[tokio::test]
async fn test_add_over_cap_is_rejected() {
    let ctx = TestContext::new().await;
    let shop = ctx.shop();

    shop.add_to_cart(&product(1, 1)).await.unwrap();
    let err = shop.add_to_cart(&product(1, 1)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert_eq!(err.user_message(), "Not enough stock. Only 1 left in stock");
    assert_eq!(shop.cart().lines()[0].quantity, 1);
}

#[tokio::test]
async fn test_zero_quantity_removes_line() {
    let ctx = TestContext::new().await;
    let shop = ctx.shop();
    shop.add_to_cart(&product(1, 5)).await.unwrap();

    let notice = shop.update_quantity(ProductId::new(1), 0).await.unwrap();

    assert!(matches!(notice, Some(CartNotice::Removed { .. })));
    assert!(shop.cart().is_empty());
}

#[tokio::test]
async fn test_quantity_never_exceeds_cap() {
    let ctx = TestContext::new().await;
    let shop = ctx.shop();
    let caps = [(1, 3), (2, 1), (3, 4)];

    // add and update in an interleaved, deterministic order
    for round in 0..6_u32 {
        for (id, cap) in caps {
            let before = shop.cart();
            let result = if round % 2 == 0 {
                shop.add_to_cart(&product(id, cap).with_quantity(round + 1))
                    .await
                    .map(|_| ())
            } else {
                shop.update_quantity(ProductId::new(id), round + 1)
                    .await
                    .map(|_| ())
            };
            if let Err(err) = result {
                assert_eq!(err.kind(), ErrorKind::BusinessRule);
                assert_eq!(shop.cart(), before, "rejected mutation changed the cart");
            }
            for line in shop.cart().lines() {
                assert!(line.quantity <= line.inventory_cap);
                assert!(line.quantity > 0);
            }
        }
    }
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let ctx = TestContext::new().await;
    {
        let shop = ctx.shop();
        shop.add_to_cart(&product(1, 5).with_quantity(2)).await.unwrap();
        shop.add_to_cart(&product(2, 5)).await.unwrap();
    }

    let shop = ctx.shop();
    let cart = shop.cart();

    assert_eq!(cart.lines().len(), 2);
    assert_eq!(cart.lines()[0].product_id, ProductId::new(1));
    assert_eq!(cart.lines()[0].quantity, 2);
    assert_eq!(cart.total_quantity(), 3);
    assert!(!cart.has_synced_once());
}

#[tokio::test]
async fn test_failed_echo_rolls_back_and_resyncs() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;
    ctx.mount_merge(&[(1, 1)]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cartItems/cartItem/add"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    assert!(shop.state().has_synced_once());

    let err = shop.add_to_cart(&product(1, 5)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert!(shop.cart().is_empty());
    assert!(!shop.state().has_synced_once());

    // with the gate open the add stays local and the next sync carries it
    shop.add_to_cart(&product(1, 5)).await.unwrap();
    assert_eq!(shop.cart().total_quantity(), 1);

    let outcome = shop.sync_cart().await.unwrap();

    assert_eq!(outcome, SyncOutcome::Synced { lines: 1, merged: true });
    assert!(shop.state().has_synced_once());
    assert_eq!(ctx.requests_to("/syncCart").await.len(), 1);
}

#[tokio::test]
async fn test_failed_echo_is_reconciled_by_next_sync() {
    let ctx = TestContext::new().await;
    ctx.mount_login().await;
    ctx.mount_server_cart(&[]).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cartItems/cartItem/add"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let shop = ctx.shop();
    ctx.login(&shop).await;
    shop.add_to_cart(&product(1, 5)).await.unwrap_err();

    // the server cart gained the item anyway, e.g. from another client
    ctx.server.reset().await;
    ctx.mount_server_cart(&[(1, 1)]).await;

    let outcome = shop.sync_cart().await.unwrap();

    assert_eq!(outcome, SyncOutcome::Synced { lines: 1, merged: false });
    let cart = shop.cart();
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].product_id, ProductId::new(1));
}
