//! Emporium storefront client library.
//!
//! The client-side core of the Emporium web shop: persisted auth and cart
//! state, the token-guarded call wrapper, cart synchronization with the
//! backend, and the REST client. Front ends drive everything through
//! [`shop::Shop`].
//!
//! # Modules
//!
//! - [`api`] - REST client and wire types
//! - [`cart`] / [`session`] - Pure cart and session state
//! - [`state`] - Shared, persisted application state
//! - [`token`] - Refresh-once token guard
//! - [`sync`] - Login-time cart reconciliation
//! - [`checkout`] - Form validation and pending orders
//! - [`storage`] / [`clock`] - Persistence and time ports

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod error;
pub mod session;
pub mod shop;
pub mod state;
pub mod storage;
pub mod sync;
pub mod token;

pub use error::{ErrorKind, StoreError};
pub use shop::Shop;
