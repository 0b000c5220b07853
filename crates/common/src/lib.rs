pub mod types;

pub use types::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
