//! Browser-scoped cart storage.
//!
//! While a visitor is signed out their cart lives under a fixed key in a
//! store scoped to the browser. The trait deals in raw bytes on purpose: the
//! reconciliation service owns the decision that unparsable bytes resolve to
//! an empty cart rather than an error.

use async_trait::async_trait;
use tower_sessions::Session;

use crate::models::session::keys;

use super::CartError;

/// Storage for the anonymous cart, scoped to one browser.
#[async_trait]
pub trait LocalCartStore: Send + Sync {
    /// Read the stored cart bytes, if any.
    async fn read(&self) -> Result<Option<Vec<u8>>, CartError>;

    /// Replace the stored cart bytes.
    async fn write(&self, bytes: Vec<u8>) -> Result<(), CartError>;

    /// Remove the stored cart entirely.
    async fn delete(&self) -> Result<(), CartError>;
}

/// [`LocalCartStore`] backed by the tower-sessions session.
///
/// The session cookie gives the store its browser scope; every tab of the
/// same browser shares it. Values are stored as a JSON string under
/// [`keys::ANONYMOUS_CART`].
#[derive(Clone)]
pub struct SessionCartStore {
    session: Session,
}

impl SessionCartStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl LocalCartStore for SessionCartStore {
    async fn read(&self) -> Result<Option<Vec<u8>>, CartError> {
        let stored = self.session.get::<String>(keys::ANONYMOUS_CART).await?;
        Ok(stored.map(String::into_bytes))
    }

    async fn write(&self, bytes: Vec<u8>) -> Result<(), CartError> {
        // The bytes are JSON we produced; lossy conversion only matters for
        // corrupt input, which resolves to an empty cart on the next read.
        let text = String::from_utf8_lossy(&bytes).into_owned();
        self.session.insert(keys::ANONYMOUS_CART, text).await?;
        Ok(())
    }

    async fn delete(&self) -> Result<(), CartError> {
        self.session
            .remove::<String>(keys::ANONYMOUS_CART)
            .await?;
        Ok(())
    }
}
