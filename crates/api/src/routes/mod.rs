//! HTTP route handlers.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;

use checkout::{CheckoutOrchestrator, InMemoryAddressDirectory};
use domain::{CartService, OrderService};
use store::StorefrontStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: StorefrontStore> {
    pub cart_service: CartService<S>,
    pub order_service: OrderService<S>,
    pub checkout: CheckoutOrchestrator<S, InMemoryAddressDirectory>,
    pub addresses: InMemoryAddressDirectory,
    pub store: S,
}
