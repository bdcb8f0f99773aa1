//! The cart reconciliation service.
//!
//! One `CartService` is mounted per view (per request, in HTTP terms). It
//! resolves the authoritative cart once at mount, applies mutations to the
//! in-memory list synchronously before the asynchronous persist fires (the
//! view never shows stale quantities while a write is in flight), and
//! publishes every persisted change to the scope's sync channel.

use rust_decimal::Decimal;
use serde::Serialize;

use calder_core::{Cart, CatalogId, LineItem};

use crate::models::session::Identity;

use super::local::LocalCartStore;
use super::remote::RemoteCartStore;
use super::sync::{CartEvent, SyncHub};
use super::CartError;

/// User-visible acknowledgment for a successful add.
#[derive(Debug, Clone, Serialize)]
pub struct AddAck {
    /// Transient message, e.g. "Added Citric Acid 25kg to cart".
    pub message: String,
}

/// Reconciles the anonymous and account carts into one authoritative cart
/// and owns all mutations for the life of the mount.
///
/// Generic over its two stores so tests can inject in-memory fakes.
pub struct CartService<L, R> {
    identity: Identity,
    local: L,
    remote: R,
    cart: Cart,
    ready: bool,
    dirty: bool,
    sync: Option<(SyncHub, String)>,
}

impl<L: LocalCartStore, R: RemoteCartStore> CartService<L, R> {
    #[must_use]
    pub const fn new(identity: Identity, local: L, remote: R) -> Self {
        Self {
            identity,
            local,
            remote,
            cart: Cart::new(),
            ready: false,
            dirty: false,
            sync: None,
        }
    }

    /// Attach a sync hub so persisted changes reach other mounted views.
    #[must_use]
    pub fn with_sync(mut self, hub: SyncHub, scope: impl Into<String>) -> Self {
        self.sync = Some((hub, scope.into()));
        self
    }

    /// Run the one-time reconciliation for this session start.
    ///
    /// - Anonymous: the local cart is read; absent or unparsable data
    ///   resolves to an empty cart. No remote calls are made.
    /// - Authenticated: the remote cart is the trusted base. A non-empty
    ///   local cart is folded in as an increment (quantities summed per id),
    ///   the combined result is deduplicated and persisted remotely, and the
    ///   local copy is discarded. A local-only cart is normalized and moved
    ///   to the remote store the same way.
    ///
    /// Reads are gated on this completing; until then the cart counts as
    /// not-yet-loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote store fails during the merge. Local
    /// parse failures never error - they resolve to an empty cart.
    pub async fn initialize(&mut self) -> Result<(), CartError> {
        match self.identity {
            Identity::Anonymous => {
                self.cart = Cart::from_items(self.read_local().await?);
            }
            Identity::Customer(user) => {
                let remote = self.remote.fetch(user).await?.unwrap_or_default();
                let local = self.read_local().await?;

                if !remote.is_empty() {
                    let merged = Cart::merge(remote, local);
                    self.remote.replace(user, merged.items()).await?;
                    self.local.delete().await?;
                    self.cart = merged;
                } else if !local.is_empty() {
                    let normalized = Cart::from_items(local).dedup();
                    self.remote.replace(user, normalized.items()).await?;
                    self.local.delete().await?;
                    self.cart = normalized;
                } else {
                    self.cart = Cart::new();
                }
            }
        }
        self.ready = true;
        Ok(())
    }

    /// Load the cart for a mount after the one-time merge already ran.
    ///
    /// Reads the authoritative store for the current identity without
    /// merging or clearing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote store fails.
    pub async fn load(&mut self) -> Result<(), CartError> {
        match self.identity {
            Identity::Anonymous => {
                self.cart = Cart::from_items(self.read_local().await?);
            }
            Identity::Customer(user) => {
                let items = self.remote.fetch(user).await?.unwrap_or_default();
                self.cart = Cart::from_items(items).dedup();
            }
        }
        self.ready = true;
        Ok(())
    }

    /// Whether initialization has completed.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    /// Whether the in-memory cart has changes the backing store rejected.
    ///
    /// Surfaced to the user as a "not saved" indicator; [`Self::flush`]
    /// retries.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The resolved item list.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInitialized`] before initialization completes.
    pub fn items(&self) -> Result<&[LineItem], CartError> {
        self.cart_ref().map(Cart::items)
    }

    /// Sum of `price * quantity` over the resolved cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInitialized`] before initialization completes.
    pub fn total(&self) -> Result<Decimal, CartError> {
        self.cart_ref().map(Cart::total)
    }

    /// Sum of quantities over the resolved cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInitialized`] before initialization completes.
    pub fn count(&self) -> Result<u64, CartError> {
        self.cart_ref().map(Cart::count)
    }

    /// Add `quantity` units of an item, summing into an existing line with
    /// the same id.
    ///
    /// # Errors
    ///
    /// Returns an error before initialization or if encoding for persistence
    /// fails. Store write failures do not error; they set the dirty flag.
    pub async fn add(&mut self, item: LineItem, quantity: u32) -> Result<AddAck, CartError> {
        self.ensure_ready()?;
        let name = item.name.clone();
        self.cart.add(item, quantity);
        self.persist().await?;
        Ok(AddAck {
            message: format!("Added {name} to cart"),
        })
    }

    /// Remove the line with the given id.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::add`].
    pub async fn remove(&mut self, id: &CatalogId) -> Result<(), CartError> {
        self.ensure_ready()?;
        self.cart.remove(id);
        self.persist().await
    }

    /// Replace a line's quantity; at or below zero removes the line.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::add`].
    pub async fn set_quantity(&mut self, id: &CatalogId, quantity: i64) -> Result<(), CartError> {
        self.ensure_ready()?;
        self.cart.set_quantity(id, quantity);
        self.persist().await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::add`].
    pub async fn clear(&mut self) -> Result<(), CartError> {
        self.ensure_ready()?;
        self.cart.clear();
        self.persist().await
    }

    /// Retry persisting after a failed write.
    ///
    /// Returns whether the cart is now clean. Only a mount that still holds
    /// the unsaved state can retry it; per-request HTTP mounts drop that
    /// state, so their callers re-send the mutation after a dirty view
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding for persistence fails.
    pub async fn flush(&mut self) -> Result<bool, CartError> {
        if self.dirty {
            self.persist().await?;
        }
        Ok(!self.dirty)
    }

    /// Subscribe to changes for this cart's scope.
    ///
    /// Returns `None` when no sync hub is attached.
    #[must_use]
    pub fn subscribe(&self) -> Option<tokio::sync::broadcast::Receiver<CartEvent>> {
        self.sync
            .as_ref()
            .map(|(hub, scope)| hub.subscribe(scope))
    }

    /// Reduce a sync event into the in-memory cart.
    ///
    /// `Replaced` adopts the broadcast list directly; `ForeignWrite` re-reads
    /// the shared local store, which only anonymous carts have.
    ///
    /// # Errors
    ///
    /// Returns an error if re-reading the local store fails.
    pub async fn apply_event(&mut self, event: CartEvent) -> Result<(), CartError> {
        match event {
            CartEvent::Replaced(items) => {
                self.cart = Cart::from_items(items);
            }
            CartEvent::ForeignWrite => {
                if self.identity == Identity::Anonymous {
                    self.cart = Cart::from_items(self.read_local().await?);
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    const fn ensure_ready(&self) -> Result<(), CartError> {
        if self.ready {
            Ok(())
        } else {
            Err(CartError::NotInitialized)
        }
    }

    fn cart_ref(&self) -> Result<&Cart, CartError> {
        self.ensure_ready()?;
        Ok(&self.cart)
    }

    /// Read and decode the local cart; absent or unparsable bytes resolve to
    /// an empty list.
    async fn read_local(&self) -> Result<Vec<LineItem>, CartError> {
        let bytes = self.local.read().await?;
        Ok(bytes
            .and_then(|b| serde_json::from_slice(&b).ok())
            .unwrap_or_default())
    }

    /// Write the full item list to whichever store is authoritative for the
    /// current identity, then broadcast the change.
    ///
    /// A store write failure keeps the in-memory state and sets the dirty
    /// flag instead of dropping the mutation.
    async fn persist(&mut self) -> Result<(), CartError> {
        let outcome = match self.identity {
            Identity::Customer(user) => self.remote.replace(user, self.cart.items()).await,
            Identity::Anonymous => {
                let bytes = serde_json::to_vec(self.cart.items())
                    .map_err(CartError::Codec)?;
                self.local.write(bytes).await
            }
        };

        match outcome {
            Ok(()) => {
                self.dirty = false;
                if let Some((hub, scope)) = &self.sync {
                    hub.publish(scope, CartEvent::Replaced(self.cart.items().to_vec()));
                }
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                tracing::warn!("cart persist failed, keeping in-memory state: {e}");
                Ok(())
            }
        }
    }
}
