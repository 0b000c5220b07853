//! HTTP API server with observability for the storefront backend.
//!
//! Provides REST endpoints for cart management and checkout, with
//! structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use checkout::{CheckoutOrchestrator, InMemoryAddressDirectory};
use domain::{CartService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::StorefrontStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: StorefrontStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/cart/get", get(routes::cart::get_cart::<S>))
        .route("/cart/add-item", post(routes::cart::add_item::<S>))
        .route(
            "/cart/update-item/{item_id}",
            patch(routes::cart::update_item::<S>),
        )
        .route(
            "/cart/delete-item/{item_id}",
            delete(routes::cart::delete_item::<S>),
        )
        .route("/cart/delete-cart", delete(routes::cart::delete_cart::<S>))
        .route("/orders/place", post(routes::orders::place::<S>))
        .route("/orders/my-orders", get(routes::orders::my_orders::<S>))
        .route("/orders/{order_id}", get(routes::orders::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state around the given store.
pub fn create_default_state<S: StorefrontStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    let addresses = InMemoryAddressDirectory::new();

    Arc::new(AppState {
        cart_service: CartService::new(store.clone()),
        order_service: OrderService::new(store.clone()),
        checkout: CheckoutOrchestrator::new(store.clone(), addresses.clone()),
        addresses,
        store,
    })
}
