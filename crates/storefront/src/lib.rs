//! Calder Chemical storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused. The centerpiece is the cart
//! reconciliation service in [`cart`], which resolves one authoritative
//! cart from the browser-scoped (anonymous) and account-bound (remote)
//! copies and keeps every mounted view in sync afterwards.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
