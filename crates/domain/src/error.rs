//! Domain error types.

use common::{CartItemId, OrderId, ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced product does not exist or is deleted.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The referenced line does not belong to the cart or is deleted.
    #[error("cart item {0} not found")]
    ItemNotFound(CartItemId),

    /// The user has no active cart to operate on.
    #[error("no active cart for user {0}")]
    NoActiveCart(UserId),

    /// Quantity must be at least 1 (0 means remove, via `set_quantity`).
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity { quantity: u32 },

    /// Storage failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur during order read operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No such order, or it has been deleted.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The order exists but is owned by another user. Deliberately distinct
    /// from `NotFound` so the API layer can answer 403 rather than 404.
    #[error("order {0} belongs to another user")]
    AccessDenied(OrderId),

    /// Storage failure.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
