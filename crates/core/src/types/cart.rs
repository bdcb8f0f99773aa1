//! Cart algebra: deduplication, merging, and derived totals.
//!
//! A [`Cart`] is a list of [`LineItem`]s unique by catalog id. All mutation
//! rules that the storefront relies on live here as pure functions:
//!
//! - adding an item with an id already in the cart sums quantities,
//! - setting a quantity at or below zero removes the line,
//! - merging an anonymous cart into an account cart treats the account cart
//!   as the trusted base and the anonymous cart as an increment.
//!
//! Keeping this free of I/O means every invariant can be unit tested without
//! a session layer or a database.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::CatalogId;
use super::item::LineItem;

/// An unordered set of line items, unique by catalog id.
///
/// The uniqueness invariant is maintained by the mutation methods; input that
/// may violate it (anything read from a persistence boundary) goes through
/// [`Cart::dedup`] first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Wrap a raw item list without normalizing it.
    ///
    /// The list may contain duplicate ids if it came from storage; call
    /// [`Cart::dedup`] before relying on the uniqueness invariant.
    #[must_use]
    pub fn from_items(items: Vec<LineItem>) -> Self {
        Self { items }
    }

    /// The current item list.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consume the cart and return its item list.
    #[must_use]
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collapse lines sharing a catalog id into one, summing quantities.
    ///
    /// First occurrence wins for the display fields; order of first
    /// occurrence is preserved. Idempotent: running it twice yields the same
    /// cart as running it once.
    #[must_use]
    pub fn dedup(self) -> Self {
        let mut deduped: Vec<LineItem> = Vec::with_capacity(self.items.len());
        for item in self.items {
            match deduped.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => deduped.push(item),
            }
        }
        Self { items: deduped }
    }

    /// Merge an anonymous cart into an account cart.
    ///
    /// The account (`remote`) items form the trusted base: they may reflect
    /// actions from other devices and must not be lost. Each `local` item is
    /// folded in as an increment - summed into an existing line with the same
    /// id, or appended as a new line. A final [`Cart::dedup`] pass guards
    /// against duplicates already present in the remote data.
    #[must_use]
    pub fn merge(remote: Vec<LineItem>, local: Vec<LineItem>) -> Self {
        let mut merged = remote;
        for item in local {
            match merged.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => merged.push(item),
            }
        }
        Self { items: merged }.dedup()
    }

    /// Add `quantity` units of an item.
    ///
    /// If a line with the same id exists its quantity is incremented and the
    /// existing display fields are kept; otherwise the item is appended as a
    /// new line with the given quantity. Adding zero units is a no-op: a
    /// resolved cart never holds a non-positive quantity.
    pub fn add(&mut self, item: LineItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity);
            }
            None => {
                self.items.push(LineItem { quantity, ..item });
            }
        }
    }

    /// Remove the line with the given id, if present.
    pub fn remove(&mut self, id: &CatalogId) {
        self.items.retain(|item| &item.id != id);
    }

    /// Replace the quantity of the line with the given id.
    ///
    /// A quantity at or below zero removes the line entirely. Setting a
    /// quantity for an id not in the cart is a no-op.
    pub fn set_quantity(&mut self, id: &CatalogId, quantity: i64) {
        match u32::try_from(quantity) {
            Ok(0) | Err(_) => self.remove(id),
            Ok(quantity) => {
                if let Some(item) = self.items.iter_mut().find(|item| &item.id == id) {
                    item.quantity = quantity;
                }
            }
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price * quantity` over all lines.
    ///
    /// Recomputed from the item list on every call, never stored.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::subtotal).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}
