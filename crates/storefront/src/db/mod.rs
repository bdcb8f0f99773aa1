//! Database operations for the storefront `PostgreSQL` instance.
//!
//! # Database: `calder_storefront`
//!
//! ## Tables
//!
//! - `sessions` - tower-sessions storage (also holds the anonymous cart)
//! - `account_cart` - one JSONB item list per authenticated user
//!
//! # Migrations
//!
//! Migrations live in `crates/storefront/migrations/` and run via
//! `sqlx migrate run`.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
