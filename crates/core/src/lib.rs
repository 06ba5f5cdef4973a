//! Emporium Core - Shared domain types.
//!
//! This crate provides the types shared by every Emporium component:
//! - `storefront` - Client library (auth state, cart state, sync, REST client)
//! - `cli` - Command-line storefront built on the client library
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no persistence.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
