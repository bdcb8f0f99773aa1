//! Cart reconciliation service.
//!
//! Produces one authoritative cart from whatever state exists in the two cart
//! homes, exactly once per session start, and keeps every mounted view in
//! sync thereafter.
//!
//! # The two cart homes
//!
//! - **Anonymous**: the browser-scoped session, under a fixed key
//!   ([`local::LocalCartStore`]). All mutations go here while signed out.
//! - **Account**: a per-user row in Postgres ([`remote::RemoteCartStore`]).
//!   All mutations go here while signed in.
//!
//! Ownership is single and exclusive per session state - the two homes are
//! never written by both paths at once. At sign-in, [`service::CartService`]
//! merges the anonymous cart into the account cart (quantities summed per
//! catalog id, account data treated as the trusted base) and discards the
//! local copy.
//!
//! # Change propagation
//!
//! Every successful mutation broadcasts the new item list on a per-scope
//! channel ([`sync::SyncHub`]) so other mounted views of the same cart update
//! without re-reading storage. Views that did not originate a change to the
//! shared anonymous store fall back to re-reading it when signalled.

mod local;
mod remote;
mod service;
mod sync;

pub use local::{LocalCartStore, SessionCartStore};
pub use remote::{PgCartStore, RemoteCartStore};
pub use service::{AddAck, CartService};
pub use sync::{CartEvent, SyncHub};

use thiserror::Error;

/// Errors that can occur in cart storage and reconciliation.
#[derive(Debug, Error)]
pub enum CartError {
    /// The account cart store failed.
    #[error("cart storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The browser-scoped session store failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Encoding the cart for persistence failed.
    ///
    /// Decode failures never surface here - unparsable stored carts resolve
    /// to an empty cart instead.
    #[error("cart codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A read was attempted before initialization completed.
    #[error("cart not initialized")]
    NotInitialized,
}
