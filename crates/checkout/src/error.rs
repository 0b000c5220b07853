//! Checkout error types.

use common::{AddressId, CartId, ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The shipping address does not exist.
    #[error("address {0} not found")]
    AddressNotFound(AddressId),

    /// The shipping address belongs to another user.
    #[error("address {0} belongs to another user")]
    AddressNotOwned(AddressId),

    /// The user has no active cart to check out.
    #[error("no active cart for user {0}")]
    NoActiveCart(UserId),

    /// The cart has no live lines.
    #[error("cart {0} is empty")]
    CartEmpty(CartId),

    /// A cart line references a product that no longer exists.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Stock ran out between cart building and commit. The cart is left
    /// intact so the buyer can adjust it.
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// Storage failure (after retries, for transient ones).
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
