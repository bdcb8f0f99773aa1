//! Account-bound cart storage.
//!
//! The remote store keeps one item list per authenticated user. Stored rows
//! are normalized into [`LineItem`] at this boundary: historic writers
//! persisted lines either flat or nested under a `product` reference, and
//! catalog ids as either strings or raw numbers. Internal logic never sees
//! any of that - only the single line-item shape comes out of a read.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::types::Json;

use calder_core::{CatalogId, LineItem, UserId};

use super::CartError;

/// Storage for the account cart, keyed by user id.
///
/// `None` and an empty list are equivalent: "no remote cart".
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    /// Fetch the user's cart, already normalized to [`LineItem`]s.
    async fn fetch(&self, user: UserId) -> Result<Option<Vec<LineItem>>, CartError>;

    /// Replace the user's cart with the given item list.
    async fn replace(&self, user: UserId, items: &[LineItem]) -> Result<(), CartError>;
}

/// [`RemoteCartStore`] backed by the `account_cart` table (JSONB item list).
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteCartStore for PgCartStore {
    async fn fetch(&self, user: UserId) -> Result<Option<Vec<LineItem>>, CartError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT items FROM account_cart WHERE user_id = $1")
                .bind(user.as_i32())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(items,)| normalize_stored_items(&items)))
    }

    async fn replace(&self, user: UserId, items: &[LineItem]) -> Result<(), CartError> {
        sqlx::query(
            "INSERT INTO account_cart (user_id, items, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (user_id)
             DO UPDATE SET items = EXCLUDED.items, updated_at = now()",
        )
        .bind(user.as_i32())
        .bind(Json(items))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Stored-row normalization
// =============================================================================

/// A catalog id as found in storage: string form or raw number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCatalogId {
    Text(String),
    Numeric(i64),
}

impl From<RawCatalogId> for CatalogId {
    fn from(raw: RawCatalogId) -> Self {
        match raw {
            RawCatalogId::Text(s) => Self::new(s),
            RawCatalogId::Numeric(n) => Self::from_numeric(n),
        }
    }
}

/// Product fields as nested by older writers.
#[derive(Debug, Deserialize)]
struct StoredProduct {
    id: RawCatalogId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Decimal,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    slug: String,
}

/// One stored cart line, in either of the two historic shapes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredLine {
    Nested {
        product: StoredProduct,
        quantity: u32,
    },
    Flat {
        id: RawCatalogId,
        #[serde(default)]
        name: String,
        #[serde(default)]
        price: Decimal,
        #[serde(default)]
        image: Option<String>,
        #[serde(default)]
        slug: String,
        quantity: u32,
    },
}

impl From<StoredLine> for LineItem {
    fn from(line: StoredLine) -> Self {
        match line {
            StoredLine::Nested { product, quantity } => Self {
                id: product.id.into(),
                name: product.name,
                price: product.price,
                image: product.image,
                slug: product.slug,
                quantity,
            },
            StoredLine::Flat {
                id,
                name,
                price,
                image,
                slug,
                quantity,
            } => Self {
                id: id.into(),
                name,
                price,
                image,
                slug,
                quantity,
            },
        }
    }
}

/// Normalize a stored JSONB item list to [`LineItem`]s.
///
/// Lines that fail to parse are skipped rather than failing the whole cart;
/// a malformed row must never make the cart unusable.
fn normalize_stored_items(items: &serde_json::Value) -> Vec<LineItem> {
    let Some(lines) = items.as_array() else {
        return Vec::new();
    };

    lines
        .iter()
        .filter_map(|line| {
            serde_json::from_value::<StoredLine>(line.clone())
                .inspect_err(|e| tracing::warn!("skipping malformed cart line: {e}"))
                .ok()
        })
        .map(LineItem::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalize_flat_line() {
        let items = json!([
            {"id": "7", "name": "Citric Acid 25kg", "price": "20", "quantity": 2}
        ]);
        let lines = normalize_stored_items(&items);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id.as_str(), "7");
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn test_normalize_numeric_id() {
        let items = json!([
            {"id": 7, "name": "Citric Acid 25kg", "price": "20", "quantity": 1}
        ]);
        let lines = normalize_stored_items(&items);
        assert_eq!(lines[0].id.as_str(), "7");
    }

    #[test]
    fn test_normalize_nested_product() {
        let items = json!([
            {
                "product": {"id": 42, "name": "Sodium Hydroxide 10kg", "price": "35.50", "slug": "sodium-hydroxide-10kg"},
                "quantity": 3
            }
        ]);
        let lines = normalize_stored_items(&items);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].id.as_str(), "42");
        assert_eq!(lines[0].name, "Sodium Hydroxide 10kg");
        assert_eq!(lines[0].quantity, 3);
    }

    #[test]
    fn test_normalize_mixed_shapes() {
        let items = json!([
            {"id": "7", "name": "A", "price": "1", "quantity": 1},
            {"product": {"id": "9-sample", "name": "B", "price": "0.50"}, "quantity": 1}
        ]);
        let lines = normalize_stored_items(&items);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].id.is_sample());
    }

    #[test]
    fn test_normalize_skips_malformed_lines() {
        let items = json!([
            {"id": "7", "name": "A", "price": "1", "quantity": 1},
            {"unrelated": true},
            "not even an object"
        ]);
        let lines = normalize_stored_items(&items);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_normalize_non_array_is_empty() {
        assert!(normalize_stored_items(&json!({"items": []})).is_empty());
        assert!(normalize_stored_items(&json!(null)).is_empty());
    }
}
