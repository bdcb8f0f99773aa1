//! Cart route handlers.
//!
//! Each request mounts a fresh reconciliation service for the caller's
//! identity. The one-time post-login merge is tracked with a session marker
//! so it runs exactly once per session start; later mounts load the
//! authoritative store directly.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use calder_core::{CatalogId, LineItem};

use crate::cart::{CartError, CartService, PgCartStore, SessionCartStore, SyncHub};
use crate::error::Result;
use crate::models::session::{Identity, keys};
use crate::state::AppState;

/// The mounted service type used by every handler.
type MountedCart = CartService<SessionCartStore, PgCartStore>;

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub total: Decimal,
    pub count: u64,
    /// True when the latest mutation could not be persisted yet.
    ///
    /// The unsaved state lives only for the request that produced it, so
    /// recovery over HTTP is client-driven: surface a "not saved" indicator
    /// and re-send the mutation. A later request reflects whichever write
    /// last reached the store.
    pub dirty: bool,
}

impl CartView {
    fn from_service(service: &MountedCart) -> Result<Self> {
        Ok(Self {
            items: service.items()?.to_vec(),
            total: service.total()?,
            count: service.count()?,
            dirty: service.is_dirty(),
        })
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    pub quantity: Option<u32>,
}

/// Update-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub id: String,
    pub quantity: i64,
}

/// Remove-line request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub id: String,
}

/// Acknowledgment returned by a successful add.
#[derive(Debug, Serialize)]
pub struct AddedResponse {
    pub message: String,
    pub count: u64,
}

/// Count badge data.
#[derive(Debug, Serialize)]
pub struct CountView {
    pub count: u64,
}

/// Mount the reconciliation service for this request.
///
/// Anonymous mounts always initialize (a local read only). Authenticated
/// mounts run the merge once per session, marked by [`keys::CART_MERGED`];
/// afterwards they load the account cart directly.
async fn mount(state: &AppState, session: &Session) -> Result<MountedCart> {
    let identity = Identity::resolve(session).await;
    let scope = SyncHub::scope(
        identity,
        &session.id().map(|id| id.to_string()).unwrap_or_default(),
    );

    let local = SessionCartStore::new(session.clone());
    let remote = PgCartStore::new(state.pool().clone());
    let mut service =
        CartService::new(identity, local, remote).with_sync(state.hub().clone(), scope);

    match identity {
        Identity::Anonymous => service.initialize().await?,
        Identity::Customer(_) => {
            let merged = session
                .get::<bool>(keys::CART_MERGED)
                .await
                .ok()
                .flatten()
                .unwrap_or(false);
            if merged {
                service.load().await?;
            } else {
                service.initialize().await?;
                session
                    .insert(keys::CART_MERGED, true)
                    .await
                    .map_err(CartError::from)?;
            }
        }
    }

    Ok(service)
}

/// Resolved cart with derived totals.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let service = mount(&state, &session).await?;
    Ok(Json(CartView::from_service(&service)?))
}

/// Add an item to the cart.
///
/// Returns the user-visible acknowledgment and the new item count.
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<AddedResponse>> {
    let quantity = form.quantity.unwrap_or(1);
    let item = LineItem {
        id: CatalogId::new(form.id),
        name: form.name,
        price: form.price,
        image: form.image,
        slug: form.slug.unwrap_or_default(),
        quantity,
    };

    let mut service = mount(&state, &session).await?;
    let ack = service.add(item, quantity).await?;
    let count = service.count()?;

    Ok(Json(AddedResponse {
        message: ack.message,
        count,
    }))
}

/// Replace a line's quantity. A quantity at or below zero removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<UpdateCartForm>,
) -> Result<Json<CartView>> {
    let mut service = mount(&state, &session).await?;
    service
        .set_quantity(&CatalogId::new(form.id), form.quantity)
        .await?;
    Ok(Json(CartView::from_service(&service)?))
}

/// Remove a line from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RemoveFromCartForm>,
) -> Result<Json<CartView>> {
    let mut service = mount(&state, &session).await?;
    service.remove(&CatalogId::new(form.id)).await?;
    Ok(Json(CartView::from_service(&service)?))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let mut service = mount(&state, &session).await?;
    service.clear().await?;
    Ok(Json(CartView::from_service(&service)?))
}

/// Cart count badge.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<Json<CountView>> {
    let service = mount(&state, &session).await?;
    Ok(Json(CountView {
        count: service.count()?,
    }))
}
