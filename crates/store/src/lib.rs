//! Durable storage for the storefront: products, inventory, carts, and
//! orders, with an atomic checkout commit as the single unit of write
//! contention handling.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use common::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use records::{
    CartItemRecord, CartRecord, CartStatus, CheckoutCommit, CheckoutLine, InventoryRecord,
    Lifecycle, OrderItemRecord, OrderRecord, OrderStatus, ProductRecord,
};
pub use store::StorefrontStore;
