//! Row-level records persisted by the store.
//!
//! Records are constructed as complete values via `new` and treated as
//! immutable snapshots of a row; mutation happens through dedicated store
//! operations, never by patching a half-built record.

use chrono::{DateTime, Utc};
use common::{AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// Soft-delete lifecycle attached to every record.
///
/// A single value replaces the ad hoc `deleted` boolean per table; all
/// queries filter on it by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted,
}

impl Lifecycle {
    /// Maps the `deleted` column back to a lifecycle value.
    pub fn from_deleted(deleted: bool) -> Self {
        if deleted {
            Lifecycle::Deleted
        } else {
            Lifecycle::Active
        }
    }

    /// Returns the value of the `deleted` column for this lifecycle.
    pub fn as_deleted(&self) -> bool {
        matches!(self, Lifecycle::Deleted)
    }

    /// Returns true if the record is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Lifecycle::Deleted)
    }

    /// Returns true if the record is live.
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}

/// Status of a shopping cart.
///
/// `Active` transitions to `CheckedOut` exactly once, at the moment a
/// checkout commits. No transition leads back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartStatus {
    Active,
    CheckedOut,
    Cancelled,
}

impl CartStatus {
    /// Database representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Active => "ACTIVE",
            CartStatus::CheckedOut => "CHECKED_OUT",
            CartStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(CartStatus::Active),
            "CHECKED_OUT" => Some(CartStatus::CheckedOut),
            "CANCELLED" => Some(CartStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a placed order.
///
/// Orders are created `Pending`; the terminal states exist for later
/// fulfillment flows and are not driven by the checkout core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Database representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "COMPLETED" => Some(OrderStatus::Completed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    /// Unit price in cents.
    pub price_cents: i64,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Creates a new live product record.
    pub fn new(name: impl Into<String>, price_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            price_cents,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-product stock counter; the unit of write contention for checkout.
///
/// Exactly one inventory record exists per product, created together with
/// the product row. The quantity never goes below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub quantity: i32,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Creates a new live inventory record.
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        let now = Utc::now();
        Self {
            product_id,
            quantity,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A user's shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartRecord {
    pub id: CartId,
    pub user_id: UserId,
    pub status: CartStatus,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartRecord {
    /// Creates a new empty active cart for a user.
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            user_id,
            status: CartStatus::Active,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Product price in cents when the line was first added.
    pub price_at_addition_cents: i64,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItemRecord {
    /// Creates a new live cart line.
    pub fn new(
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        price_at_addition_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CartItemId::new(),
            cart_id,
            product_id,
            quantity,
            price_at_addition_cents,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A placed order; immutable in its item set once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub address_id: AddressId,
    pub status: OrderStatus,
    /// Computed as the sum of line totals at checkout time.
    pub total_cents: i64,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Creates a new pending order.
    pub fn new(user_id: UserId, address_id: AddressId, total_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            address_id,
            status: OrderStatus::Pending,
            total_cents,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One product line in an order.
///
/// The unit price is snapshotted at order-creation time so historical
/// orders are insulated from later catalog price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItemRecord {
    /// Creates a new live order line.
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        quantity: i32,
        unit_price_cents: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: OrderItemId::new(),
            order_id,
            product_id,
            quantity,
            unit_price_cents,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One inventory decrement within a checkout commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// The complete unit of work for a checkout.
///
/// Either every part commits (inventory decrements, order and item rows,
/// cart retirement) or none does. Implementations lock the touched
/// inventory rows in ascending product-id order before checking stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutCommit {
    pub cart_id: CartId,
    pub lines: Vec<CheckoutLine>,
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
}
