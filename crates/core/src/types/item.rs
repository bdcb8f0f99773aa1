//! Cart line items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::CatalogId;

/// One product entry in a cart.
///
/// Display fields (`name`, `price`, `image`, `slug`) are denormalized copies
/// captured when the item was added, so rendering a cart never refetches the
/// catalog. `quantity` is kept positive by the cart operations; a quantity at
/// or below zero collapses the line to a removal before it ever lands here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog item id this line refers to.
    pub id: CatalogId,
    /// Display name captured at add time.
    pub name: String,
    /// Unit price captured at add time.
    pub price: Decimal,
    /// Product image URL, if one exists.
    #[serde(default)]
    pub image: Option<String>,
    /// URL slug of the product page.
    #[serde(default)]
    pub slug: String,
    /// Number of units. Always positive in a resolved cart.
    pub quantity: u32,
}

impl LineItem {
    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}
