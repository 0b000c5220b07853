//! Order read model.
//!
//! Orders are created only by the checkout pipeline; this service exposes
//! owner-scoped reads over what checkout persisted.

use chrono::{DateTime, Utc};
use common::{AddressId, OrderId, OrderItemId, ProductId, UserId};
use serde::Serialize;
use store::{OrderStatus, StorefrontStore};

use crate::error::OrderError;
use crate::money::Money;

/// One product line in an order snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Price the buyer was charged, captured at checkout.
    pub unit_price: Money,
}

impl OrderLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A read-only view of an order and its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSnapshot {
    pub id: OrderId,
    pub status: OrderStatus,
    pub address_id: AddressId,
    pub total: Money,
    pub items: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Service for order read operations.
pub struct OrderService<S: StorefrontStore> {
    store: S,
}

impl<S: StorefrontStore> OrderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the user's orders, oldest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<OrderSnapshot>, OrderError> {
        let records = self.store.list_orders_for_user(user_id).await?;

        let mut snapshots = Vec::with_capacity(records.len());
        for record in records {
            snapshots.push(self.snapshot(&record).await?);
        }
        Ok(snapshots)
    }

    /// Fetches one order, enforcing ownership.
    ///
    /// A missing order is `NotFound`; an order owned by someone else is
    /// `AccessDenied`, never silently hidden.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderSnapshot, OrderError> {
        let record = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;

        if record.user_id != user_id {
            tracing::warn!(%order_id, %user_id, owner = %record.user_id, "order access denied");
            return Err(OrderError::AccessDenied(order_id));
        }

        self.snapshot(&record).await
    }

    async fn snapshot(&self, record: &store::OrderRecord) -> Result<OrderSnapshot, OrderError> {
        let item_records = self.store.list_order_items(record.id).await?;

        let mut items = Vec::with_capacity(item_records.len());
        for item in item_records {
            let product_name = match self.store.get_product(item.product_id).await? {
                Some(product) => product.name,
                None => "(unavailable)".to_string(),
            };
            items.push(OrderLine {
                id: item.id,
                product_id: item.product_id,
                product_name,
                quantity: item.quantity as u32,
                unit_price: Money::from_cents(item.unit_price_cents),
            });
        }

        Ok(OrderSnapshot {
            id: record.id,
            status: record.status,
            address_id: record.address_id,
            total: Money::from_cents(record.total_cents),
            items,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{
        CartRecord, CheckoutCommit, CheckoutLine, InMemoryStore, OrderItemRecord, OrderRecord,
        ProductRecord,
    };

    async fn seed_order(store: &InMemoryStore, user_id: UserId) -> OrderId {
        let product = ProductRecord::new("Widget", 1000);
        let product_id = product.id;
        store.insert_product(product, 10).await.unwrap();

        let cart = CartRecord::new(user_id);
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();

        let order = OrderRecord::new(user_id, AddressId::new(), 2000);
        let order_id = order.id;
        let items = vec![OrderItemRecord::new(order_id, product_id, 2, 1000)];
        store
            .commit_checkout(CheckoutCommit {
                cart_id,
                lines: vec![CheckoutLine {
                    product_id,
                    quantity: 2,
                }],
                order,
                items,
            })
            .await
            .unwrap();

        order_id
    }

    #[tokio::test]
    async fn get_order_returns_lines_and_total() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let order_id = seed_order(&store, user_id).await;
        let service = OrderService::new(store);

        let order = service.get_order(user_id, order_id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.cents(), 2000);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(order.items[0].line_total().cents(), 2000);
    }

    #[tokio::test]
    async fn get_order_enforces_ownership() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let order_id = seed_order(&store, owner).await;
        let service = OrderService::new(store);

        let result = service.get_order(UserId::new(), order_id).await;
        assert!(matches!(result, Err(OrderError::AccessDenied(id)) if id == order_id));
    }

    #[tokio::test]
    async fn get_missing_order_is_not_found() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store);

        let result = service.get_order(UserId::new(), OrderId::new()).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_orders_is_scoped_to_the_user() {
        let store = InMemoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let alice_order = seed_order(&store, alice).await;
        seed_order(&store, bob).await;
        let service = OrderService::new(store);

        let orders = service.list_orders(alice).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, alice_order);
    }

    #[tokio::test]
    async fn list_orders_for_new_user_is_empty() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store);

        let orders = service.list_orders(UserId::new()).await.unwrap();
        assert!(orders.is_empty());
    }
}
