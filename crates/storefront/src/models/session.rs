//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use calder_core::UserId;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
/// Credential issuance lives in a separate service; this storefront only
/// reads the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
}

/// Who owns the cart for the current request.
///
/// Resolved once per view mount; every cart operation routes its persistence
/// through whichever home this names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// No signed-in user; the cart lives in the browser-scoped session.
    Anonymous,
    /// Signed-in user; the cart lives in the account store.
    Customer(UserId),
}

impl Identity {
    /// Resolve the current identity from the session.
    ///
    /// Session read failures resolve to anonymous rather than erroring - a
    /// cart must always be available, even when the session backend hiccups.
    pub async fn resolve(session: &Session) -> Self {
        session
            .get::<CurrentUser>(keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .map_or(Self::Anonymous, |user| Self::Customer(user.id))
    }
}

/// Session keys for storefront data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the anonymous cart item list.
    pub const ANONYMOUS_CART: &str = "calder_cart";

    /// Key marking that the one-time post-login cart merge already ran.
    pub const CART_MERGED: &str = "cart_merged";
}
