use async_trait::async_trait;
use common::{
    AddressId, CartId, CartItemId, OrderId, OrderItemId, ProductId, UserId,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    records::{
        CartItemRecord, CartRecord, CartStatus, CheckoutCommit, InventoryRecord, Lifecycle,
        OrderItemRecord, OrderRecord, OrderStatus, ProductRecord,
    },
    store::StorefrontStore,
};

/// PostgreSQL-backed store implementation.
///
/// The checkout commit runs inside a single transaction and takes row-level
/// locks (`SELECT ... FOR UPDATE`) on the touched inventory rows in
/// ascending product-id order, so concurrent checkouts on the same product
/// serialize and multi-product checkouts cannot deadlock each other.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<ProductRecord> {
        Ok(ProductRecord {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            price_cents: row.try_get("price_cents")?,
            lifecycle: Lifecycle::from_deleted(row.try_get("deleted")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_inventory(row: PgRow) -> Result<InventoryRecord> {
        Ok(InventoryRecord {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get("quantity")?,
            lifecycle: Lifecycle::from_deleted(row.try_get("deleted")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart(row: PgRow) -> Result<CartRecord> {
        let status: String = row.try_get("status")?;
        Ok(CartRecord {
            id: CartId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            status: CartStatus::parse(&status)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown cart status {status:?}")))?,
            lifecycle: Lifecycle::from_deleted(row.try_get("deleted")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_cart_item(row: PgRow) -> Result<CartItemRecord> {
        Ok(CartItemRecord {
            id: CartItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            cart_id: CartId::from_uuid(row.try_get::<Uuid, _>("cart_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get("quantity")?,
            price_at_addition_cents: row.try_get("price_at_addition_cents")?,
            lifecycle: Lifecycle::from_deleted(row.try_get("deleted")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order(row: PgRow) -> Result<OrderRecord> {
        let status: String = row.try_get("status")?;
        Ok(OrderRecord {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            address_id: AddressId::from_uuid(row.try_get::<Uuid, _>("address_id")?),
            status: OrderStatus::parse(&status)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown order status {status:?}")))?,
            total_cents: row.try_get("total_cents")?,
            lifecycle: Lifecycle::from_deleted(row.try_get("deleted")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_item(row: PgRow) -> Result<OrderItemRecord> {
        Ok(OrderItemRecord {
            id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get("quantity")?,
            unit_price_cents: row.try_get("unit_price_cents")?,
            lifecycle: Lifecycle::from_deleted(row.try_get("deleted")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl StorefrontStore for PostgresStore {
    async fn insert_product(&self, product: ProductRecord, initial_stock: i32) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.lifecycle.as_deleted())
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, quantity, deleted, created_at, updated_at)
            VALUES ($1, $2, FALSE, $3, $3)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(initial_stock)
        .bind(product.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(
            "SELECT id, name, price_cents, deleted, created_at, updated_at
             FROM products WHERE id = $1 AND NOT deleted",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn get_inventory(&self, product_id: ProductId) -> Result<Option<InventoryRecord>> {
        let row = sqlx::query(
            "SELECT product_id, quantity, deleted, created_at, updated_at
             FROM inventory WHERE product_id = $1 AND NOT deleted",
        )
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_inventory).transpose()
    }

    async fn set_stock(&self, product_id: ProductId, quantity: i32) -> Result<()> {
        let result = sqlx::query(
            "UPDATE inventory SET quantity = $2, updated_at = NOW()
             WHERE product_id = $1 AND NOT deleted",
        )
        .bind(product_id.as_uuid())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InventoryMissing(product_id));
        }
        Ok(())
    }

    async fn find_active_cart(&self, user_id: UserId) -> Result<Option<CartRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, status, deleted, created_at, updated_at
             FROM carts WHERE user_id = $1 AND status = 'ACTIVE' AND NOT deleted",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart).transpose()
    }

    async fn insert_cart(&self, cart: CartRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, status, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(cart.id.as_uuid())
        .bind(cart.user_id.as_uuid())
        .bind(cart.status.as_str())
        .bind(cart.lifecycle.as_deleted())
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("ux_carts_active_user")
            {
                return StoreError::DuplicateActiveCart(cart.user_id);
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn list_cart_items(&self, cart_id: CartId) -> Result<Vec<CartItemRecord>> {
        let rows = sqlx::query(
            "SELECT id, cart_id, product_id, quantity, price_at_addition_cents,
                    deleted, created_at, updated_at
             FROM cart_items WHERE cart_id = $1 AND NOT deleted
             ORDER BY created_at ASC, id ASC",
        )
        .bind(cart_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_cart_item).collect()
    }

    async fn find_cart_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            "SELECT id, cart_id, product_id, quantity, price_at_addition_cents,
                    deleted, created_at, updated_at
             FROM cart_items WHERE cart_id = $1 AND product_id = $2 AND NOT deleted",
        )
        .bind(cart_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn find_cart_item_by_id(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>> {
        let row = sqlx::query(
            "SELECT id, cart_id, product_id, quantity, price_at_addition_cents,
                    deleted, created_at, updated_at
             FROM cart_items WHERE id = $1 AND cart_id = $2 AND NOT deleted",
        )
        .bind(item_id.as_uuid())
        .bind(cart_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_cart_item).transpose()
    }

    async fn insert_cart_item(&self, item: CartItemRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items
                (id, cart_id, product_id, quantity, price_at_addition_cents,
                 deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.cart_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.quantity)
        .bind(item.price_at_addition_cents)
        .bind(item.lifecycle.as_deleted())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("ux_cart_items_live_product")
            {
                return StoreError::DuplicateCartItem {
                    cart_id: item.cart_id,
                    product_id: item.product_id,
                };
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn update_cart_item_quantity(&self, item_id: CartItemId, quantity: i32) -> Result<()> {
        sqlx::query(
            "UPDATE cart_items SET quantity = $2, updated_at = NOW()
             WHERE id = $1 AND NOT deleted",
        )
        .bind(item_id.as_uuid())
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn increment_cart_item_quantity(&self, item_id: CartItemId, delta: i32) -> Result<()> {
        sqlx::query(
            "UPDATE cart_items SET quantity = quantity + $2, updated_at = NOW()
             WHERE id = $1 AND NOT deleted",
        )
        .bind(item_id.as_uuid())
        .bind(delta)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn soft_delete_cart_item(&self, item_id: CartItemId) -> Result<()> {
        sqlx::query(
            "UPDATE cart_items SET deleted = TRUE, updated_at = NOW()
             WHERE id = $1 AND NOT deleted",
        )
        .bind(item_id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn soft_delete_cart(&self, cart_id: CartId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE carts SET deleted = TRUE, updated_at = NOW()
             WHERE id = $1 AND NOT deleted",
        )
        .bind(cart_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE cart_items SET deleted = TRUE, updated_at = NOW()
             WHERE cart_id = $1 AND NOT deleted",
        )
        .bind(cart_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, address_id, status, total_cents,
                    deleted, created_at, updated_at
             FROM orders WHERE id = $1 AND NOT deleted",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, address_id, status, total_cents,
                    deleted, created_at, updated_at
             FROM orders WHERE user_id = $1 AND NOT deleted
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn list_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        let rows = sqlx::query(
            "SELECT id, order_id, product_id, quantity, unit_price_cents,
                    deleted, created_at, updated_at
             FROM order_items WHERE order_id = $1 AND NOT deleted
             ORDER BY created_at ASC, id ASC",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order_item).collect()
    }

    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<()> {
        // Canonical lock order: ascending product id, always.
        let mut lines = commit.lines.clone();
        lines.sort_by_key(|l| l.product_id);

        let mut tx = self.pool.begin().await?;

        // Retire the cart first, guarded on it still being ACTIVE and
        // live. This locks the cart row, so of two racing commits for the
        // same cart one blocks here and then matches zero rows.
        let retired = sqlx::query(
            "UPDATE carts SET status = 'CHECKED_OUT', deleted = TRUE, updated_at = NOW()
             WHERE id = $1 AND status = 'ACTIVE' AND NOT deleted",
        )
        .bind(commit.cart_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        if retired.rows_affected() != 1 {
            // Dropping the transaction rolls back the retirement attempt.
            return Err(StoreError::CartNotActive(commit.cart_id));
        }

        for line in &lines {
            let available: Option<i32> = sqlx::query_scalar(
                "SELECT quantity FROM inventory
                 WHERE product_id = $1 AND NOT deleted
                 FOR UPDATE",
            )
            .bind(line.product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            let available = available.ok_or(StoreError::InventoryMissing(line.product_id))?;
            if available < line.quantity {
                // Dropping the transaction rolls back earlier decrements.
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }

            sqlx::query(
                "UPDATE inventory SET quantity = quantity - $2, updated_at = NOW()
                 WHERE product_id = $1",
            )
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, user_id, address_id, status, total_cents, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(commit.order.id.as_uuid())
        .bind(commit.order.user_id.as_uuid())
        .bind(commit.order.address_id.as_uuid())
        .bind(commit.order.status.as_str())
        .bind(commit.order.total_cents)
        .bind(commit.order.lifecycle.as_deleted())
        .bind(commit.order.created_at)
        .bind(commit.order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &commit.items {
            sqlx::query(
                r#"
                INSERT INTO order_items
                    (id, order_id, product_id, quantity, unit_price_cents,
                     deleted, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.lifecycle.as_deleted())
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE cart_items SET deleted = TRUE, updated_at = NOW()
             WHERE cart_id = $1 AND NOT deleted",
        )
        .bind(commit.cart_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(
            cart_id = %commit.cart_id,
            order_id = %commit.order.id,
            line_count = lines.len(),
            "checkout committed"
        );
        Ok(())
    }
}
