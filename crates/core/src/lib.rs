//! Calder Core - Shared types library.
//!
//! This crate provides the common cart types used across Calder Chemical
//! components:
//! - `storefront` - Public-facing e-commerce site
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere. In particular, the cart merge and deduplication rules live
//! here so they can be tested without a running service.
//!
//! # Modules
//!
//! - [`types`] - Catalog ids, cart line items, and the cart algebra

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
