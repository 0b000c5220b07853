//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{CartId, CartItemId, ProductId};
use domain::{CartLine, CartSnapshot};
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub cart_id: CartId,
    pub status: String,
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl From<CartSnapshot> for CartResponse {
    fn from(snapshot: CartSnapshot) -> Self {
        Self {
            cart_id: snapshot.id,
            status: snapshot.status.to_string(),
            total_cents: snapshot.total.cents(),
            items: snapshot.items.into_iter().map(CartItemResponse::from).collect(),
        }
    }
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        let line_total_cents = line.line_total().cents();
        Self {
            item_id: line.id,
            product_id: line.product_id,
            product_name: line.product_name,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents,
        }
    }
}

// -- Handlers --

/// GET /cart/get — the current user's active cart, created on demand.
#[tracing::instrument(skip(state))]
pub async fn get_cart<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<CartResponse>, ApiError> {
    let snapshot = state.cart_service.get_or_create_active_cart(user_id).await?;
    Ok(Json(snapshot.into()))
}

/// POST /cart/add-item — add a product to the cart, merging duplicates.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let snapshot = state
        .cart_service
        .add_item(user_id, req.product_id, req.quantity)
        .await?;
    Ok(Json(snapshot.into()))
}

/// PATCH /cart/update-item/{item_id} — replace a line's quantity; 0 removes it.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
    Path(item_id): Path<CartItemId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let snapshot = state
        .cart_service
        .set_quantity(user_id, item_id, req.quantity)
        .await?;
    Ok(Json(snapshot.into()))
}

/// DELETE /cart/delete-item/{item_id} — remove a line from the cart.
#[tracing::instrument(skip(state))]
pub async fn delete_item<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.cart_service.remove_item(user_id, item_id).await?;
    Ok(Json(StatusResponse {
        status: "item removed".to_string(),
    }))
}

/// DELETE /cart/delete-cart — discard the active cart and its lines.
#[tracing::instrument(skip(state))]
pub async fn delete_cart<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<StatusResponse>, ApiError> {
    state.cart_service.delete_cart(user_id).await?;
    Ok(Json(StatusResponse {
        status: "cart deleted".to_string(),
    }))
}
