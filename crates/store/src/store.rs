use async_trait::async_trait;
use common::{CartId, CartItemId, OrderId, ProductId, UserId};

use crate::Result;
use crate::records::{
    CartItemRecord, CartRecord, CheckoutCommit, InventoryRecord, OrderItemRecord, OrderRecord,
    ProductRecord,
};

/// Core trait for storefront storage implementations.
///
/// All reads filter soft-deleted rows by default. Implementations must be
/// thread-safe (Send + Sync) and must make `commit_checkout` atomic: the
/// stock check-and-decrement, the order insert, and the cart retirement
/// either all take effect or none do.
#[async_trait]
pub trait StorefrontStore: Send + Sync {
    // -- Catalog --

    /// Inserts a product together with its inventory record.
    ///
    /// The inventory row is created in the same operation so a product is
    /// never left without one.
    async fn insert_product(&self, product: ProductRecord, initial_stock: i32) -> Result<()>;

    /// Looks up a non-deleted product.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>>;

    /// Looks up the non-deleted inventory record for a product.
    async fn get_inventory(&self, product_id: ProductId) -> Result<Option<InventoryRecord>>;

    /// Sets the available stock for a product.
    async fn set_stock(&self, product_id: ProductId, quantity: i32) -> Result<()>;

    // -- Carts --

    /// Finds the user's non-deleted ACTIVE cart, if any.
    async fn find_active_cart(&self, user_id: UserId) -> Result<Option<CartRecord>>;

    /// Inserts a new cart.
    ///
    /// Fails with `DuplicateActiveCart` if the user already has a
    /// non-deleted ACTIVE cart.
    async fn insert_cart(&self, cart: CartRecord) -> Result<()>;

    /// Lists the non-deleted lines of a cart in insertion order.
    async fn list_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>>;

    /// Finds the non-deleted line for a product within a cart.
    async fn find_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>>;

    /// Finds a non-deleted line by id, scoped to a cart.
    async fn find_cart_item_by_id(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>>;

    /// Inserts a new cart line.
    ///
    /// Fails with `DuplicateCartItem` if the cart already has a
    /// non-deleted line for the product.
    async fn insert_cart_item(&self, item: CartItemRecord) -> Result<()>;

    /// Replaces the quantity of a cart line.
    async fn update_cart_item_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<()>;

    /// Adds a delta to the quantity of a cart line, atomically.
    async fn increment_cart_item_quantity(&self, item_id: CartItemId, delta: i32) -> Result<()>;

    /// Soft-deletes a cart line.
    async fn soft_delete_cart_item(&self, item_id: CartItemId) -> Result<()>;

    /// Soft-deletes a cart and all of its lines. Inventory is untouched.
    async fn soft_delete_cart(&self, cart_id: CartId) -> Result<()>;

    // -- Orders --

    /// Looks up a non-deleted order.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;

    /// Lists a user's non-deleted orders, oldest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;

    /// Lists the non-deleted lines of an order.
    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>>;

    // -- Checkout --

    /// Applies a checkout as one atomic unit of work.
    ///
    /// Retires the cart first, guarded on it still being ACTIVE and live
    /// (status CHECKED_OUT, cart and lines soft-deleted); a cart that was
    /// already retired fails the whole commit with `CartNotActive`, so at
    /// most one of two racing commits for the same cart can succeed. Then
    /// locks the touched inventory rows in ascending product-id order,
    /// verifies `available >= requested` for every line, applies all
    /// decrements, and inserts the order with its items. Fails with
    /// `InsufficientStock` on the first short line, mutating nothing.
    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<()>;
}
