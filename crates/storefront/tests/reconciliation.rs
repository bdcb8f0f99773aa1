//! End-to-end reconciliation scenarios over the public cart API.
//!
//! These tests drive `CartService` through the same store traits the real
//! session and Postgres implementations use, with in-memory stand-ins, so
//! the full anonymous-browse / sign-in / multi-view flow runs without a
//! database.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use calder_core::{CatalogId, LineItem, UserId};
use calder_storefront::cart::{
    CartError, CartEvent, CartService, LocalCartStore, RemoteCartStore, SyncHub,
};
use calder_storefront::models::session::Identity;

/// Shared in-memory stand-in for the browser-scoped store. Cloning shares
/// the underlying cell, like two views of the same browser.
#[derive(Clone, Default)]
struct SharedLocal {
    data: Arc<Mutex<Option<Vec<u8>>>>,
}

#[async_trait]
impl LocalCartStore for SharedLocal {
    async fn read(&self) -> Result<Option<Vec<u8>>, CartError> {
        Ok(self.data.lock().unwrap().clone())
    }

    async fn write(&self, bytes: Vec<u8>) -> Result<(), CartError> {
        *self.data.lock().unwrap() = Some(bytes);
        Ok(())
    }

    async fn delete(&self) -> Result<(), CartError> {
        *self.data.lock().unwrap() = None;
        Ok(())
    }
}

/// Shared in-memory stand-in for the account cart store.
#[derive(Clone, Default)]
struct SharedRemote {
    data: Arc<Mutex<Option<Vec<LineItem>>>>,
}

#[async_trait]
impl RemoteCartStore for SharedRemote {
    async fn fetch(&self, _user: UserId) -> Result<Option<Vec<LineItem>>, CartError> {
        Ok(self.data.lock().unwrap().clone())
    }

    async fn replace(&self, _user: UserId, items: &[LineItem]) -> Result<(), CartError> {
        *self.data.lock().unwrap() = Some(items.to_vec());
        Ok(())
    }
}

fn item(id: &str, price: i64, quantity: u32) -> LineItem {
    LineItem {
        id: CatalogId::new(id),
        name: format!("Reagent {id}"),
        price: Decimal::from(price),
        image: None,
        slug: format!("reagent-{id}"),
        quantity,
    }
}

#[tokio::test]
async fn anonymous_browse_then_sign_in_moves_cart_to_account() {
    let local = SharedLocal::default();
    let remote = SharedRemote::default();

    // Browse anonymously and fill the cart.
    let mut anon = CartService::new(Identity::Anonymous, local.clone(), remote.clone());
    anon.initialize().await.unwrap();
    anon.add(item("7", 20, 1), 1).await.unwrap();
    anon.add(item("9", 5, 1), 3).await.unwrap();
    assert_eq!(anon.total().unwrap(), Decimal::from(35));

    // Sign in: a new mount with the customer identity runs the merge.
    let mut signed_in = CartService::new(
        Identity::Customer(UserId::new(42)),
        local.clone(),
        remote.clone(),
    );
    signed_in.initialize().await.unwrap();

    let account_items = remote.data.lock().unwrap().clone().unwrap();
    assert_eq!(account_items.len(), 2);
    assert!(local.data.lock().unwrap().is_none(), "local copy discarded");
    assert_eq!(signed_in.count().unwrap(), 4);
    assert_eq!(signed_in.total().unwrap(), Decimal::from(35));
}

#[tokio::test]
async fn sign_in_merges_into_existing_account_cart() {
    let local = SharedLocal::default();
    let remote = SharedRemote::default();

    // Another device already put items in the account cart.
    *remote.data.lock().unwrap() = Some(vec![item("7", 20, 1), item("9", 5, 1)]);

    // This browser added the same reagent anonymously.
    let mut anon = CartService::new(Identity::Anonymous, local.clone(), remote.clone());
    anon.initialize().await.unwrap();
    anon.add(item("7", 20, 1), 2).await.unwrap();

    let mut signed_in =
        CartService::new(Identity::Customer(UserId::new(42)), local, remote.clone());
    signed_in.initialize().await.unwrap();

    let account_items = remote.data.lock().unwrap().clone().unwrap();
    assert_eq!(account_items.len(), 2, "distinct ids preserved");
    assert_eq!(account_items[0].id.as_str(), "7");
    assert_eq!(account_items[0].quantity, 3, "quantities summed, not duplicated");
    assert_eq!(account_items[1].quantity, 1);
}

#[tokio::test]
async fn second_view_catches_up_through_the_sync_channel() {
    let hub = SyncHub::new();
    let local = SharedLocal::default();
    let remote = SharedRemote::default();
    let scope = SyncHub::scope(Identity::Anonymous, "session-1");

    let mut view_a = CartService::new(Identity::Anonymous, local.clone(), remote.clone())
        .with_sync(hub.clone(), scope.clone());
    let mut view_b = CartService::new(Identity::Anonymous, local.clone(), remote.clone())
        .with_sync(hub.clone(), scope.clone());
    view_a.initialize().await.unwrap();
    view_b.initialize().await.unwrap();

    let mut events = view_b.subscribe().unwrap();
    view_a.add(item("7", 20, 1), 2).await.unwrap();

    // The in-process broadcast carries the full new list.
    let event = events.recv().await.unwrap();
    view_b.apply_event(event).await.unwrap();
    assert_eq!(view_b.count().unwrap(), 2);

    // A view without the broadcast still converges by re-reading storage.
    let mut view_c = CartService::new(Identity::Anonymous, local, remote)
        .with_sync(hub, scope);
    view_c.initialize().await.unwrap();
    assert_eq!(view_c.count().unwrap(), 2);
}

#[tokio::test]
async fn foreign_write_path_rereads_shared_storage() {
    let local = SharedLocal::default();
    let remote = SharedRemote::default();

    let mut view_a = CartService::new(Identity::Anonymous, local.clone(), remote.clone());
    let mut view_b = CartService::new(Identity::Anonymous, local, remote);
    view_a.initialize().await.unwrap();
    view_b.initialize().await.unwrap();

    view_a.add(item("7", 20, 1), 1).await.unwrap();

    // View B did not originate the change and receives only the storage
    // signal; it adopts the new state by re-reading.
    view_b.apply_event(CartEvent::ForeignWrite).await.unwrap();
    assert_eq!(view_b.count().unwrap(), 1);
    assert_eq!(
        view_b.items().unwrap()[0].id,
        CatalogId::new("7")
    );
}

#[tokio::test]
async fn sample_variants_stay_separate_lines() {
    let local = SharedLocal::default();
    let mut service = CartService::new(Identity::Anonymous, local, SharedRemote::default());
    service.initialize().await.unwrap();

    let full = item("7", 20, 1);
    let mut sample = item("7", 2, 1);
    sample.id = sample.id.sample_variant();

    service.add(full, 1).await.unwrap();
    service.add(sample, 1).await.unwrap();

    assert_eq!(service.items().unwrap().len(), 2);
    assert_eq!(service.total().unwrap(), Decimal::from(22));
}
