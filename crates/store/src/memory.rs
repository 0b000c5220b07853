use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    records::{
        CartItemRecord, CartRecord, CartStatus, CheckoutCommit, InventoryRecord, Lifecycle,
        OrderItemRecord, OrderRecord, ProductRecord,
    },
    store::StorefrontStore,
};

#[derive(Default)]
struct Tables {
    products: HashMap<ProductId, ProductRecord>,
    inventory: HashMap<ProductId, InventoryRecord>,
    carts: HashMap<CartId, CartRecord>,
    cart_items: HashMap<CartItemId, CartItemRecord>,
    orders: HashMap<OrderId, OrderRecord>,
    order_items: HashMap<OrderItemId, OrderItemRecord>,
}

/// In-memory store implementation for tests and demos.
///
/// All tables live behind a single lock, so every operation observes and
/// produces a consistent state and `commit_checkout` is trivially atomic.
/// Provides the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of non-deleted orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables
            .read()
            .await
            .orders
            .values()
            .filter(|o| o.lifecycle.is_active())
            .count()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }
}

#[async_trait]
impl StorefrontStore for InMemoryStore {
    async fn insert_product(&self, product: ProductRecord, initial_stock: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        let inventory = InventoryRecord::new(product.id, initial_stock);
        tables.inventory.insert(product.id, inventory);
        tables.products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .get(&product_id)
            .filter(|p| p.lifecycle.is_active())
            .cloned())
    }

    async fn get_inventory(&self, product_id: ProductId) -> Result<Option<InventoryRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .inventory
            .get(&product_id)
            .filter(|i| i.lifecycle.is_active())
            .cloned())
    }

    async fn set_stock(&self, product_id: ProductId, quantity: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        let record = tables
            .inventory
            .get_mut(&product_id)
            .ok_or(StoreError::InventoryMissing(product_id))?;
        record.quantity = quantity;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn find_active_cart(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .carts
            .values()
            .find(|c| {
                c.user_id == user_id
                    && c.status == CartStatus::Active
                    && c.lifecycle.is_active()
            })
            .cloned())
    }

    async fn insert_cart(&self, cart: CartRecord) -> Result<()> {
        let mut tables = self.tables.write().await;

        // Simulate the (user_id) WHERE status = 'ACTIVE' partial unique index.
        let conflict = tables.carts.values().any(|c| {
            c.user_id == cart.user_id
                && c.status == CartStatus::Active
                && c.lifecycle.is_active()
        });
        if conflict && cart.status == CartStatus::Active {
            return Err(StoreError::DuplicateActiveCart(cart.user_id));
        }

        tables.carts.insert(cart.id, cart);
        Ok(())
    }

    async fn list_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .cart_items
            .values()
            .filter(|i| i.cart_id == cart_id && i.lifecycle.is_active())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn find_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_items
            .values()
            .find(|i| {
                i.cart_id == cart_id && i.product_id == product_id && i.lifecycle.is_active()
            })
            .cloned())
    }

    async fn find_cart_item_by_id(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cart_items
            .get(&item_id)
            .filter(|i| i.cart_id == cart_id && i.lifecycle.is_active())
            .cloned())
    }

    async fn insert_cart_item(&self, item: CartItemRecord) -> Result<()> {
        let mut tables = self.tables.write().await;

        // Simulate the (cart_id, product_id) WHERE NOT deleted partial
        // unique index.
        let conflict = tables.cart_items.values().any(|i| {
            i.cart_id == item.cart_id
                && i.product_id == item.product_id
                && i.lifecycle.is_active()
        });
        if conflict && item.lifecycle.is_active() {
            return Err(StoreError::DuplicateCartItem {
                cart_id: item.cart_id,
                product_id: item.product_id,
            });
        }

        tables.cart_items.insert(item.id, item);
        Ok(())
    }

    async fn update_cart_item_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(item) = tables.cart_items.get_mut(&item_id) {
            item.quantity = quantity;
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_cart_item_quantity(&self, item_id: CartItemId, delta: i32) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(item) = tables.cart_items.get_mut(&item_id) {
            item.quantity += delta;
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_cart_item(&self, item_id: CartItemId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(item) = tables.cart_items.get_mut(&item_id) {
            item.lifecycle = Lifecycle::Deleted;
            item.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete_cart(&self, cart_id: CartId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(cart) = tables.carts.get_mut(&cart_id) {
            cart.lifecycle = Lifecycle::Deleted;
            cart.updated_at = Utc::now();
        }
        for item in tables.cart_items.values_mut() {
            if item.cart_id == cart_id && item.lifecycle.is_active() {
                item.lifecycle = Lifecycle::Deleted;
                item.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .get(&order_id)
            .filter(|o| o.lifecycle.is_active())
            .cloned())
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id && o.lifecycle.is_active())
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let tables = self.tables.read().await;
        let mut items: Vec<_> = tables
            .order_items
            .values()
            .filter(|i| i.order_id == order_id && i.lifecycle.is_active())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<()> {
        let mut tables = self.tables.write().await;

        // A cart is checked out at most once; the loser of a double-submit
        // race fails here before anything is mutated.
        let cart_live = tables.carts.get(&commit.cart_id).is_some_and(|c| {
            c.status == CartStatus::Active && c.lifecycle.is_active()
        });
        if !cart_live {
            return Err(StoreError::CartNotActive(commit.cart_id));
        }

        let mut lines = commit.lines.clone();
        lines.sort_by_key(|l| l.product_id);

        // Check every line before mutating anything.
        for line in &lines {
            let record = tables
                .inventory
                .get(&line.product_id)
                .filter(|i| i.lifecycle.is_active())
                .ok_or(StoreError::InventoryMissing(line.product_id))?;
            if record.quantity < line.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: record.quantity,
                });
            }
        }

        let now = Utc::now();
        for line in &lines {
            let record = tables
                .inventory
                .get_mut(&line.product_id)
                .ok_or(StoreError::InventoryMissing(line.product_id))?;
            record.quantity -= line.quantity;
            record.updated_at = now;
        }

        tables.orders.insert(commit.order.id, commit.order);
        for item in commit.items {
            tables.order_items.insert(item.id, item);
        }

        if let Some(cart) = tables.carts.get_mut(&commit.cart_id) {
            cart.status = CartStatus::CheckedOut;
            cart.lifecycle = Lifecycle::Deleted;
            cart.updated_at = now;
        }
        for item in tables.cart_items.values_mut() {
            if item.cart_id == commit.cart_id && item.lifecycle.is_active() {
                item.lifecycle = Lifecycle::Deleted;
                item.updated_at = now;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AddressId;

    async fn seed_product(store: &InMemoryStore, price_cents: i64, stock: i32) -> ProductId {
        let product = ProductRecord::new("Widget", price_cents);
        let id = product.id;
        store.insert_product(product, stock).await.unwrap();
        id
    }

    fn commit_for(
        cart_id: CartId,
        user_id: UserId,
        lines: Vec<(ProductId, i32, i64)>,
    ) -> CheckoutCommit {
        let total: i64 = lines.iter().map(|(_, q, p)| *q as i64 * p).sum();
        let order = OrderRecord::new(user_id, AddressId::new(), total);
        let items = lines
            .iter()
            .map(|(pid, qty, price)| OrderItemRecord::new(order.id, *pid, *qty, *price))
            .collect();
        CheckoutCommit {
            cart_id,
            lines: lines
                .into_iter()
                .map(|(product_id, quantity, _)| crate::records::CheckoutLine {
                    product_id,
                    quantity,
                })
                .collect(),
            order,
            items,
        }
    }

    #[tokio::test]
    async fn product_is_created_with_inventory() {
        let store = InMemoryStore::new();
        let id = seed_product(&store, 1000, 5).await;

        let inventory = store.get_inventory(id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity, 5);
    }

    #[tokio::test]
    async fn set_stock_on_missing_inventory_fails() {
        let store = InMemoryStore::new();
        let result = store.set_stock(ProductId::new(), 5).await;
        assert!(matches!(result, Err(StoreError::InventoryMissing(_))));
    }

    #[tokio::test]
    async fn second_active_cart_for_user_is_rejected() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();

        store.insert_cart(CartRecord::new(user_id)).await.unwrap();
        let result = store.insert_cart(CartRecord::new(user_id)).await;
        assert!(matches!(result, Err(StoreError::DuplicateActiveCart(u)) if u == user_id));
    }

    #[tokio::test]
    async fn second_live_line_for_same_product_is_rejected() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, 1000, 5).await;
        let cart = CartRecord::new(UserId::new());
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();

        let first = CartItemRecord::new(cart_id, product_id, 1, 1000);
        let first_id = first.id;
        store.insert_cart_item(first).await.unwrap();

        let result = store
            .insert_cart_item(CartItemRecord::new(cart_id, product_id, 2, 1000))
            .await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicateCartItem { cart_id: c, product_id: p })
                if c == cart_id && p == product_id
        ));

        // A soft-deleted line no longer blocks a fresh insert.
        store.soft_delete_cart_item(first_id).await.unwrap();
        store
            .insert_cart_item(CartItemRecord::new(cart_id, product_id, 2, 1000))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn increment_adds_to_existing_quantity() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, 1000, 5).await;
        let cart = CartRecord::new(UserId::new());
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();

        let item = CartItemRecord::new(cart_id, product_id, 2, 1000);
        let item_id = item.id;
        store.insert_cart_item(item).await.unwrap();

        store.increment_cart_item_quantity(item_id, 3).await.unwrap();

        let found = store
            .find_cart_item_by_id(cart_id, item_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.quantity, 5);
    }

    #[tokio::test]
    async fn soft_delete_cart_cascades_to_items() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, 1000, 5).await;
        let cart = CartRecord::new(UserId::new());
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();
        store
            .insert_cart_item(CartItemRecord::new(cart_id, product_id, 2, 1000))
            .await
            .unwrap();

        store.soft_delete_cart(cart_id).await.unwrap();

        assert!(store.list_cart_items(cart_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_decrements_inventory_and_retires_cart() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let product_id = seed_product(&store, 1000, 5).await;
        let cart = CartRecord::new(user_id);
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();
        store
            .insert_cart_item(CartItemRecord::new(cart_id, product_id, 2, 1000))
            .await
            .unwrap();

        let commit = commit_for(cart_id, user_id, vec![(product_id, 2, 1000)]);
        let order_id = commit.order.id;
        store.commit_checkout(commit).await.unwrap();

        let inventory = store.get_inventory(product_id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity, 3);

        assert!(store.find_active_cart(user_id).await.unwrap().is_none());
        assert!(store.list_cart_items(cart_id).await.unwrap().is_empty());

        let order = store.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.total_cents, 2000);
        assert_eq!(store.list_order_items(order_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_commit_for_same_cart_is_rejected() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let product_id = seed_product(&store, 1000, 10).await;
        let cart = CartRecord::new(user_id);
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();

        // Two submits that both built their commit before either applied.
        let first = commit_for(cart_id, user_id, vec![(product_id, 3, 1000)]);
        let second = commit_for(cart_id, user_id, vec![(product_id, 3, 1000)]);

        store.commit_checkout(first).await.unwrap();
        let result = store.commit_checkout(second).await;
        assert!(matches!(
            result,
            Err(StoreError::CartNotActive(c)) if c == cart_id
        ));

        // Exactly one order, exactly one decrement.
        assert_eq!(store.order_count().await, 1);
        let remaining = store.get_inventory(product_id).await.unwrap().unwrap().quantity;
        assert_eq!(remaining, 7);
    }

    #[tokio::test]
    async fn short_line_aborts_whole_commit() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let plentiful = seed_product(&store, 1000, 10).await;
        let scarce = seed_product(&store, 500, 1).await;
        let cart = CartRecord::new(user_id);
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();

        let commit = commit_for(
            cart_id,
            user_id,
            vec![(plentiful, 2, 1000), (scarce, 3, 500)],
        );
        let order_id = commit.order.id;
        let result = store.commit_checkout(commit).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { product_id, .. }) if product_id == scarce
        ));

        // Nothing moved: no decrement on the plentiful product, no order row,
        // cart still active.
        assert_eq!(
            store.get_inventory(plentiful).await.unwrap().unwrap().quantity,
            10
        );
        assert_eq!(store.get_inventory(scarce).await.unwrap().unwrap().quantity, 1);
        assert!(store.get_order(order_id).await.unwrap().is_none());
        assert!(store.find_active_cart(user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_commits_never_oversell() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, 1000, 10).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let user_id = UserId::new();
                let cart = CartRecord::new(user_id);
                let cart_id = cart.id;
                store.insert_cart(cart).await.unwrap();
                let commit = commit_for(cart_id, user_id, vec![(product_id, 3, 1000)]);
                store.commit_checkout(commit).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => succeeded += 1,
                Err(StoreError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // 10 units, 3 per checkout: exactly 3 can succeed.
        assert_eq!(succeeded, 3);
        let remaining = store.get_inventory(product_id).await.unwrap().unwrap().quantity;
        assert_eq!(remaining, 10 - succeeded * 3);
    }
}
