//! Cart change propagation between mounted views.
//!
//! Modeled as one explicit message channel per cart scope, with two producers
//! and one consumer:
//!
//! - a view that successfully persists a mutation publishes
//!   [`CartEvent::Replaced`] carrying the full new item list,
//! - a view that observes the shared anonymous store changing under it (a
//!   foreign view wrote it) publishes [`CartEvent::ForeignWrite`], and the
//!   receiving view re-reads the store to adopt the new state.
//!
//! The consumer is the in-memory cart's reducer in
//! [`super::service::CartService`]. Making both paths flow through one
//! channel keeps their ordering visible instead of hiding it in two
//! independent setter calls.
//!
//! No lock guards concurrent writers of the same anonymous scope: if two
//! views mutate within the same tick, the last writer wins. Accepted for a
//! shopping cart.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use calder_core::LineItem;

use crate::models::session::Identity;

/// Buffered events per scope channel. A lagging view drops to the newest
/// full-list event, which is always sufficient to catch up.
const CHANNEL_CAPACITY: usize = 16;

/// A change to a cart, broadcast to every view mounted on the same scope.
#[derive(Debug, Clone)]
pub enum CartEvent {
    /// A view persisted this full new item list.
    Replaced(Vec<LineItem>),
    /// A foreign view wrote the shared local store; re-read it to catch up.
    ForeignWrite,
}

/// Hub of per-scope broadcast channels for cart changes.
///
/// Scopes are derived from identity: one channel per signed-in user, one per
/// anonymous session. Channels are created lazily on first use and live for
/// the life of the process.
#[derive(Clone, Default)]
pub struct SyncHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<CartEvent>>>>,
}

impl SyncHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The scope key for an identity.
    ///
    /// Anonymous scopes are keyed by session id so that only views sharing a
    /// browser observe each other.
    #[must_use]
    pub fn scope(identity: Identity, session_id: &str) -> String {
        match identity {
            Identity::Anonymous => format!("anon:{session_id}"),
            Identity::Customer(user) => format!("user:{user}"),
        }
    }

    /// The sender for a scope, creating the channel if needed.
    #[must_use]
    pub fn sender(&self, scope: &str) -> broadcast::Sender<CartEvent> {
        let mut channels = self.channels.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        channels
            .entry(scope.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Subscribe to changes for a scope.
    #[must_use]
    pub fn subscribe(&self, scope: &str) -> broadcast::Receiver<CartEvent> {
        self.sender(scope).subscribe()
    }

    /// Publish an event to a scope.
    ///
    /// Events published to a scope with no current subscribers are dropped;
    /// a view that mounts later reads storage instead.
    pub fn publish(&self, scope: &str, event: CartEvent) {
        let _ = self.sender(scope).send(event);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use calder_core::{CatalogId, UserId};
    use rust_decimal::Decimal;

    use super::*;

    fn item(id: &str) -> LineItem {
        LineItem {
            id: CatalogId::new(id),
            name: "Item".to_owned(),
            price: Decimal::ONE,
            image: None,
            slug: String::new(),
            quantity: 1,
        }
    }

    #[test]
    fn test_scope_keys() {
        assert_eq!(SyncHub::scope(Identity::Anonymous, "abc"), "anon:abc");
        assert_eq!(
            SyncHub::scope(Identity::Customer(UserId::new(7)), "abc"),
            "user:7"
        );
    }

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers() {
        let hub = SyncHub::new();
        let mut rx_a = hub.subscribe("user:1");
        let mut rx_b = hub.subscribe("user:1");

        hub.publish("user:1", CartEvent::Replaced(vec![item("7")]));

        for rx in [&mut rx_a, &mut rx_b] {
            match rx.recv().await.unwrap() {
                CartEvent::Replaced(items) => assert_eq!(items.len(), 1),
                CartEvent::ForeignWrite => panic!("expected Replaced"),
            }
        }
    }

    #[tokio::test]
    async fn test_scopes_are_isolated() {
        let hub = SyncHub::new();
        let mut other = hub.subscribe("user:2");

        hub.publish("user:1", CartEvent::ForeignWrite);

        assert!(matches!(
            other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let hub = SyncHub::new();
        hub.publish("anon:xyz", CartEvent::ForeignWrite);
    }
}
