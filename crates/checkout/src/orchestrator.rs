//! Checkout orchestrator.
//!
//! Drives the cart-to-order pipeline: validate the address and cart, price
//! the order from the live catalog, then hand the store one atomic commit
//! that reserves stock, writes the order, and retires the cart.

use common::{AddressId, UserId};
use domain::{Money, OrderLine, OrderSnapshot};
use store::{
    CheckoutCommit, CheckoutLine, OrderItemRecord, OrderRecord, StoreError, StorefrontStore,
};

use crate::address::AddressDirectory;
use crate::error::CheckoutError;
use crate::retry::{RetryPolicy, retry_transient};

/// Orchestrates order placement.
///
/// The orchestrator never decides stock sufficiency itself; the store's
/// commit performs the authoritative check under row locks. Its job is to
/// assemble a complete, priced commit and apply it with bounded retry on
/// transient failures.
pub struct CheckoutOrchestrator<S, A>
where
    S: StorefrontStore,
    A: AddressDirectory,
{
    store: S,
    addresses: A,
    retry: RetryPolicy,
}

impl<S, A> CheckoutOrchestrator<S, A>
where
    S: StorefrontStore,
    A: AddressDirectory,
{
    /// Creates a new orchestrator with the default retry policy.
    pub fn new(store: S, addresses: A) -> Self {
        Self {
            store,
            addresses,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy for the commit step.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Places an order from the user's active cart, shipping to the given
    /// address.
    ///
    /// On success the cart is consumed and the new order is returned.
    /// On any failure, including `InsufficientStock`, inventory, order
    /// rows, and the cart are exactly as before.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<OrderSnapshot, CheckoutError> {
        metrics::counter!("checkout_total").increment(1);
        let started = std::time::Instant::now();

        let address = self
            .addresses
            .get_address(address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound(address_id))?;
        if address.user_id != user_id {
            return Err(CheckoutError::AddressNotOwned(address_id));
        }

        let cart = self
            .store
            .find_active_cart(user_id)
            .await?
            .ok_or(CheckoutError::NoActiveCart(user_id))?;

        let mut cart_items = self.store.list_cart_items(cart.id).await?;
        if cart_items.is_empty() {
            return Err(CheckoutError::CartEmpty(cart.id));
        }
        // Canonical line order, matching the store's lock order.
        cart_items.sort_by_key(|i| i.product_id);

        // Price from the live catalog; the cart's price snapshots are for
        // display only.
        let order = OrderRecord::new(user_id, address_id, 0);
        let order_id = order.id;
        let mut lines = Vec::with_capacity(cart_items.len());
        let mut items = Vec::with_capacity(cart_items.len());
        let mut order_lines = Vec::with_capacity(cart_items.len());
        let mut total_cents: i64 = 0;
        for cart_item in &cart_items {
            let product = self
                .store
                .get_product(cart_item.product_id)
                .await?
                .ok_or(CheckoutError::ProductNotFound(cart_item.product_id))?;
            lines.push(CheckoutLine {
                product_id: cart_item.product_id,
                quantity: cart_item.quantity,
            });
            let item = OrderItemRecord::new(
                order_id,
                cart_item.product_id,
                cart_item.quantity,
                product.price_cents,
            );
            order_lines.push(OrderLine {
                id: item.id,
                product_id: cart_item.product_id,
                product_name: product.name,
                quantity: cart_item.quantity as u32,
                unit_price: Money::from_cents(product.price_cents),
            });
            items.push(item);
            total_cents += cart_item.quantity as i64 * product.price_cents;
        }

        let mut order = order;
        order.total_cents = total_cents;
        let snapshot = OrderSnapshot {
            id: order_id,
            status: order.status,
            address_id,
            total: Money::from_cents(total_cents),
            items: order_lines,
            created_at: order.created_at,
            updated_at: order.updated_at,
        };

        let commit = CheckoutCommit {
            cart_id: cart.id,
            lines,
            order,
            items,
        };

        let result = retry_transient(&self.retry, || {
            let commit = commit.clone();
            let store = &self.store;
            async move { store.commit_checkout(commit).await }
        })
        .await;

        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                tracing::info!(%order_id, cart_id = %cart.id, total_cents, "order placed");
                Ok(snapshot)
            }
            Err(StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            }) => {
                metrics::counter!("checkout_failures_total").increment(1);
                tracing::info!(%product_id, requested, available, "checkout rejected, insufficient stock");
                Err(CheckoutError::InsufficientStock {
                    product_id,
                    requested,
                    available,
                })
            }
            Err(other) => {
                metrics::counter!("checkout_failures_total").increment(1);
                Err(other.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ProductId;
    use store::{CartItemRecord, CartRecord, InMemoryStore, ProductRecord};

    use crate::address::{Address, InMemoryAddressDirectory};

    struct Fixture {
        store: InMemoryStore,
        orchestrator: CheckoutOrchestrator<InMemoryStore, InMemoryAddressDirectory>,
        user_id: UserId,
        address_id: AddressId,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let directory = InMemoryAddressDirectory::new();
        let user_id = UserId::new();
        let address_id =
            directory.add(Address::new(user_id, "1 Main St", "Springfield", "12345", "US"));
        let orchestrator = CheckoutOrchestrator::new(store.clone(), directory);
        Fixture {
            store,
            orchestrator,
            user_id,
            address_id,
        }
    }

    async fn seed_product(store: &InMemoryStore, price_cents: i64, stock: i32) -> ProductId {
        let product = ProductRecord::new("Widget", price_cents);
        let id = product.id;
        store.insert_product(product, stock).await.unwrap();
        id
    }

    async fn fill_cart(store: &InMemoryStore, user_id: UserId, lines: &[(ProductId, i32, i64)]) {
        let cart = CartRecord::new(user_id);
        let cart_id = cart.id;
        store.insert_cart(cart).await.unwrap();
        for (product_id, quantity, price_cents) in lines {
            store
                .insert_cart_item(CartItemRecord::new(
                    cart_id,
                    *product_id,
                    *quantity,
                    *price_cents,
                ))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn place_order_consumes_cart_and_reserves_stock() {
        let f = fixture();
        let product_id = seed_product(&f.store, 1000, 5).await;
        fill_cart(&f.store, f.user_id, &[(product_id, 2, 1000)]).await;

        let order = f
            .orchestrator
            .place_order(f.user_id, f.address_id)
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 2000);
        assert_eq!(order.address_id, f.address_id);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);

        let inventory = f.store.get_inventory(product_id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity, 3);
        assert!(f.store.find_active_cart(f.user_id).await.unwrap().is_none());

        let persisted = f.store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(persisted.total_cents, 2000);
    }

    #[tokio::test]
    async fn order_is_priced_from_live_catalog_not_cart_snapshot() {
        let f = fixture();
        let product_id = seed_product(&f.store, 1500, 5).await;
        // Cart snapshot says 1000, catalog says 1500.
        fill_cart(&f.store, f.user_id, &[(product_id, 2, 1000)]).await;

        let order = f
            .orchestrator
            .place_order(f.user_id, f.address_id)
            .await
            .unwrap();

        assert_eq!(order.total.cents(), 3000);
        assert_eq!(order.items[0].unit_price.cents(), 1500);
        let items = f.store.list_order_items(order.id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 1500);
    }

    #[tokio::test]
    async fn no_active_cart_is_rejected() {
        let f = fixture();
        let result = f.orchestrator.place_order(f.user_id, f.address_id).await;
        assert!(matches!(result, Err(CheckoutError::NoActiveCart(_))));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let f = fixture();
        fill_cart(&f.store, f.user_id, &[]).await;

        let result = f.orchestrator.place_order(f.user_id, f.address_id).await;
        assert!(matches!(result, Err(CheckoutError::CartEmpty(_))));
    }

    #[tokio::test]
    async fn unknown_address_is_rejected() {
        let f = fixture();
        let product_id = seed_product(&f.store, 1000, 5).await;
        fill_cart(&f.store, f.user_id, &[(product_id, 1, 1000)]).await;

        let result = f.orchestrator.place_order(f.user_id, AddressId::new()).await;
        assert!(matches!(result, Err(CheckoutError::AddressNotFound(_))));
    }

    #[tokio::test]
    async fn foreign_address_is_rejected() {
        let f = fixture();
        let product_id = seed_product(&f.store, 1000, 5).await;
        fill_cart(&f.store, f.user_id, &[(product_id, 1, 1000)]).await;

        let other = UserId::new();
        let directory = InMemoryAddressDirectory::new();
        let foreign = directory.add(Address::new(other, "2 Oak Ave", "Shelbyville", "67890", "US"));
        let orchestrator = CheckoutOrchestrator::new(f.store.clone(), directory);

        let result = orchestrator.place_order(f.user_id, foreign).await;
        assert!(matches!(result, Err(CheckoutError::AddressNotOwned(_))));
    }

    #[tokio::test]
    async fn insufficient_stock_keeps_cart_intact() {
        let f = fixture();
        let product_id = seed_product(&f.store, 1000, 1).await;
        fill_cart(&f.store, f.user_id, &[(product_id, 3, 1000)]).await;

        let result = f.orchestrator.place_order(f.user_id, f.address_id).await;
        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock {
                requested: 3,
                available: 1,
                ..
            })
        ));

        // Cart survives so the buyer can adjust quantities.
        let cart = f.store.find_active_cart(f.user_id).await.unwrap().unwrap();
        let items = f.store.list_cart_items(cart.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            f.store.get_inventory(product_id).await.unwrap().unwrap().quantity,
            1
        );
        assert_eq!(f.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn vanished_product_is_rejected() {
        let f = fixture();
        fill_cart(&f.store, f.user_id, &[(ProductId::new(), 1, 1000)]).await;

        let result = f.orchestrator.place_order(f.user_id, f.address_id).await;
        assert!(matches!(result, Err(CheckoutError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn concurrent_placements_never_oversell() {
        let store = InMemoryStore::new();
        let directory = InMemoryAddressDirectory::new();
        let product_id = seed_product(&store, 1000, 10).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let directory = directory.clone();
            let pid = product_id;
            handles.push(tokio::spawn(async move {
                let user_id = UserId::new();
                let address_id =
                    directory.add(Address::new(user_id, "1 Main St", "Springfield", "12345", "US"));
                fill_cart(&store, user_id, &[(pid, 3, 1000)]).await;
                let orchestrator = CheckoutOrchestrator::new(store, directory);
                orchestrator.place_order(user_id, address_id).await
            }));
        }

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(CheckoutError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(succeeded, 3);
        assert_eq!(store.order_count().await, 3);
        let remaining = store.get_inventory(product_id).await.unwrap().unwrap().quantity;
        assert_eq!(remaining, 10 - succeeded * 3);
    }
}
