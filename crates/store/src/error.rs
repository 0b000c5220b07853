//! Storage error types.

use common::{CartId, ProductId, UserId};
use thiserror::Error;

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A checkout commit asked for more stock than is available.
    ///
    /// The commit that produced this error mutated nothing.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// A product row exists without its inventory row. Products are always
    /// created together with their inventory, so this indicates corruption.
    #[error("no inventory record for product {0}")]
    InventoryMissing(ProductId),

    /// The (user, ACTIVE) uniqueness constraint rejected a cart insert.
    #[error("user {0} already has an active cart")]
    DuplicateActiveCart(UserId),

    /// The (cart, product) live-line uniqueness constraint rejected a
    /// cart item insert.
    #[error("cart {cart_id} already has a live line for product {product_id}")]
    DuplicateCartItem {
        cart_id: CartId,
        product_id: ProductId,
    },

    /// A checkout commit found its cart no longer ACTIVE and live.
    ///
    /// A cart transitions to CHECKED_OUT exactly once; the losing side of
    /// a double-submit race gets this error and nothing is mutated.
    #[error("cart {0} is not active")]
    CartNotActive(CartId),

    /// A row could not be decoded into its record type.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns true for failures worth retrying with backoff.
    ///
    /// Serialization and deadlock aborts (SQLSTATE 40001 / 40P01), pool
    /// timeouts, and I/O failures are transient. Business failures such as
    /// insufficient stock are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            StoreError::Database(sqlx::Error::Database(db)) => {
                matches!(db.code().as_deref(), Some("40001" | "40P01"))
            }
            _ => false,
        }
    }
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_is_not_transient() {
        let err = StoreError::InsufficientStock {
            product_id: ProductId::new(),
            requested: 5,
            available: 2,
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn pool_timeout_is_transient() {
        let err = StoreError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
    }

    #[test]
    fn corrupt_row_is_not_transient() {
        let err = StoreError::Corrupt("bad status".to_string());
        assert!(!err.is_transient());
    }
}
