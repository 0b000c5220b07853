//! Cart aggregate operations.

use common::{CartId, CartItemId, ProductId, UserId};
use serde::Serialize;
use store::{CartItemRecord, CartRecord, CartStatus, StoreError, StorefrontStore};

use crate::error::CartError;
use crate::money::Money;

/// One product line in a cart snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Product price when the line was first added.
    pub unit_price: Money,
}

impl CartLine {
    /// Returns the total for this line (quantity * unit price).
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A read-only view of a cart and its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSnapshot {
    pub id: CartId,
    pub status: CartStatus,
    pub items: Vec<CartLine>,
    pub total: Money,
}

/// Service for cart operations.
///
/// Carts never touch inventory; stock is only consumed at checkout.
pub struct CartService<S: StorefrontStore> {
    store: S,
}

impl<S: StorefrontStore> CartService<S> {
    /// Creates a new cart service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's active cart, creating an empty one if none
    /// exists or the previous one was deleted or checked out.
    ///
    /// Idempotent: repeated calls without intervening mutation return the
    /// same cart.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create_active_cart(
        &self,
        user_id: UserId,
    ) -> Result<CartSnapshot, CartError> {
        let cart = self.active_cart_or_create(user_id).await?;
        self.snapshot(&cart).await
    }

    /// Adds a quantity of a product to the user's active cart.
    ///
    /// If the cart already holds a live line for the product, the
    /// quantities are merged into that line; the price snapshot taken at
    /// first addition is kept.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let cart = self.active_cart_or_create(user_id).await?;

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        match self.store.find_cart_item(cart.id, product_id).await? {
            Some(existing) => {
                self.store
                    .increment_cart_item_quantity(existing.id, quantity as i32)
                    .await?;
            }
            None => {
                let item =
                    CartItemRecord::new(cart.id, product_id, quantity as i32, product.price_cents);
                match self.store.insert_cart_item(item).await {
                    Ok(()) => {}
                    // Lost an insert race; merge into the winner's line.
                    Err(StoreError::DuplicateCartItem { .. }) => {
                        match self.store.find_cart_item(cart.id, product_id).await? {
                            Some(winner) => {
                                self.store
                                    .increment_cart_item_quantity(winner.id, quantity as i32)
                                    .await?;
                            }
                            // The winning line was removed meanwhile.
                            None => {
                                let item = CartItemRecord::new(
                                    cart.id,
                                    product_id,
                                    quantity as i32,
                                    product.price_cents,
                                );
                                self.store.insert_cart_item(item).await?;
                            }
                        }
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        tracing::info!(%product_id, quantity, cart_id = %cart.id, "added product to cart");
        self.snapshot(&cart).await
    }

    /// Replaces the quantity of a cart line; quantity 0 removes the line.
    #[tracing::instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<CartSnapshot, CartError> {
        let cart = self.require_active_cart(user_id).await?;

        let item = self
            .store
            .find_cart_item_by_id(cart.id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound(item_id))?;

        if quantity == 0 {
            self.store.soft_delete_cart_item(item.id).await?;
            tracing::info!(%item_id, cart_id = %cart.id, "removed cart item via zero quantity");
        } else {
            self.store
                .update_cart_item_quantity(item.id, quantity as i32)
                .await?;
            tracing::info!(%item_id, quantity, cart_id = %cart.id, "updated cart item quantity");
        }

        self.snapshot(&cart).await
    }

    /// Soft-deletes a line from the user's active cart.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartSnapshot, CartError> {
        let cart = self.require_active_cart(user_id).await?;

        let item = self
            .store
            .find_cart_item_by_id(cart.id, item_id)
            .await?
            .ok_or(CartError::ItemNotFound(item_id))?;

        self.store.soft_delete_cart_item(item.id).await?;
        tracing::info!(%item_id, cart_id = %cart.id, "removed cart item");
        self.snapshot(&cart).await
    }

    /// Soft-deletes the user's active cart and all its lines.
    ///
    /// Inventory is untouched; nothing has been reserved yet. The next
    /// cart access creates a fresh active cart.
    #[tracing::instrument(skip(self))]
    pub async fn delete_cart(&self, user_id: UserId) -> Result<(), CartError> {
        let cart = self.require_active_cart(user_id).await?;
        self.store.soft_delete_cart(cart.id).await?;
        tracing::info!(cart_id = %cart.id, "deleted cart");
        Ok(())
    }

    /// Builds the read-only view of a cart.
    pub async fn snapshot(&self, cart: &CartRecord) -> Result<CartSnapshot, CartError> {
        let records = self.store.list_cart_items(cart.id).await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let product_name = match self.store.get_product(record.product_id).await? {
                Some(product) => product.name,
                None => "(unavailable)".to_string(),
            };
            items.push(CartLine {
                id: record.id,
                product_id: record.product_id,
                product_name,
                quantity: record.quantity as u32,
                unit_price: Money::from_cents(record.price_at_addition_cents),
            });
        }

        let total = items.iter().map(CartLine::line_total).sum();
        Ok(CartSnapshot {
            id: cart.id,
            status: cart.status,
            items,
            total,
        })
    }

    /// Finds the user's active cart record, failing if there is none.
    pub async fn require_active_cart(&self, user_id: UserId) -> Result<CartRecord, CartError> {
        self.store
            .find_active_cart(user_id)
            .await?
            .ok_or(CartError::NoActiveCart(user_id))
    }

    async fn active_cart_or_create(&self, user_id: UserId) -> Result<CartRecord, CartError> {
        if let Some(cart) = self.store.find_active_cart(user_id).await? {
            return Ok(cart);
        }

        let cart = CartRecord::new(user_id);
        match self.store.insert_cart(cart.clone()).await {
            Ok(()) => {
                tracing::info!(cart_id = %cart.id, "created new active cart");
                Ok(cart)
            }
            // Lost a create race; the winner's cart is the active one.
            Err(StoreError::DuplicateActiveCart(_)) => self.require_active_cart(user_id).await,
            Err(e) => Err(e.into()),
        }
    }
}
