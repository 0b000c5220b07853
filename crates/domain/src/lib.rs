//! Domain layer for the storefront backend.
//!
//! This crate provides the business operations over the store:
//! - Money value object (integer cents)
//! - CartService for cart reads and mutations
//! - OrderService for owner-scoped order reads
//!
//! Checkout itself lives in the `checkout` crate; nothing here touches
//! inventory.

pub mod cart;
pub mod error;
pub mod money;
pub mod orders;

pub use cart::{CartLine, CartService, CartSnapshot};
pub use error::{CartError, OrderError};
pub use money::Money;
pub use orders::{OrderLine, OrderService, OrderSnapshot};
