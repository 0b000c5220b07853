//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{AddressId, OrderId, OrderItemId, ProductId};
use domain::{OrderLine, OrderSnapshot};
use serde::{Deserialize, Serialize};
use store::StorefrontStore;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::routes::AppState;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct PlaceOrderParams {
    pub address_id: AddressId,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub order_id: OrderId,
    pub status: String,
    pub address_id: AddressId,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub item_id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<OrderSnapshot> for OrderResponse {
    fn from(snapshot: OrderSnapshot) -> Self {
        Self {
            order_id: snapshot.id,
            status: snapshot.status.to_string(),
            address_id: snapshot.address_id,
            total_cents: snapshot.total.cents(),
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            items: snapshot.items.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

impl From<OrderLine> for OrderItemResponse {
    fn from(line: OrderLine) -> Self {
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

/// POST /orders/place?address_id= — check out the active cart.
#[tracing::instrument(skip(state))]
pub async fn place<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PlaceOrderParams>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let snapshot = state.checkout.place_order(user_id, params.address_id).await?;
    metrics::counter!("orders_placed_total").increment(1);
    Ok((StatusCode::CREATED, Json(snapshot.into())))
}

/// GET /orders/my-orders — the current user's orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn my_orders<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.order_service.list_orders(user_id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{order_id} — one order, owner only.
#[tracing::instrument(skip(state))]
pub async fn get<S: StorefrontStore>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user_id): CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderResponse>, ApiError> {
    let snapshot = state.order_service.get_order(user_id, order_id).await?;
    Ok(Json(snapshot.into()))
}
