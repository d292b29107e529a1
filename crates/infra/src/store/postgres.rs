//! Postgres-backed stores.
//!
//! Runtime-checked queries throughout (no offline query cache required).
//! The stock decrement is a single conditional `UPDATE ... RETURNING`, so
//! the read-check-write is one atomic statement and two concurrent
//! checkouts can never drive stock below zero. Order header and lines are
//! written inside one transaction.

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use async_trait::async_trait;

use pokemart_cart::CartLine;
use pokemart_catalog::{Product, ProductId, ProductMetadata};
use pokemart_core::UserId;
use pokemart_orders::{Order, OrderId, OrderLine, OrderStatus};

use super::traits::{CartStore, InventoryStore, OrderLedger, StoreError};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

/// Connect a pool and make sure the schema exists.
pub async fn connect(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id             TEXT PRIMARY KEY,
            name           TEXT NOT NULL,
            price          NUMERIC NOT NULL,
            stock_quantity BIGINT NOT NULL CHECK (stock_quantity >= 0),
            image_url      TEXT,
            description    TEXT,
            categories     TEXT[] NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id         UUID PRIMARY KEY,
            user_id    TEXT NOT NULL,
            status     TEXT NOT NULL,
            total      NUMERIC NOT NULL,
            created_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS order_lines (
            order_id   UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
            product_id TEXT NOT NULL,
            quantity   BIGINT NOT NULL,
            unit_price NUMERIC NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cart_lines (
            user_id    TEXT NOT NULL,
            product_id TEXT NOT NULL,
            quantity   BIGINT NOT NULL,
            name       TEXT NOT NULL,
            unit_price NUMERIC NOT NULL,
            image_url  TEXT,
            PRIMARY KEY (user_id, product_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

const PRODUCT_COLUMNS: &str = "id, name, price, stock_quantity, image_url, description, categories";

fn row_to_product(row: &sqlx::postgres::PgRow) -> Result<Product, StoreError> {
    let id: String = row.try_get("id")?;
    let name: String = row.try_get("name")?;
    let price: Decimal = row.try_get("price")?;
    let stock_quantity: i64 = row.try_get("stock_quantity")?;
    let metadata = ProductMetadata {
        image_url: row.try_get("image_url")?,
        description: row.try_get("description")?,
        categories: row.try_get("categories")?,
    };
    let id = ProductId::new(id)?;
    Ok(Product::new(id, name, price, stock_quantity, metadata)?)
}

pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, stock_quantity, image_url, description, categories)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                price = EXCLUDED.price,
                stock_quantity = EXCLUDED.stock_quantity,
                image_url = EXCLUDED.image_url,
                description = EXCLUDED.description,
                categories = EXCLUDED.categories
            "#,
        )
        .bind(product.id().as_str())
        .bind(product.name())
        .bind(product.price())
        .bind(product.stock_quantity())
        .bind(product.metadata().image_url.as_deref())
        .bind(product.metadata().description.as_deref())
        .bind(&product.metadata().categories)
        .execute(&self.pool)
        .await?;
        Ok(product)
    }

    async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<Product, StoreError> {
        if amount <= 0 {
            return Err(StoreError::Domain(
                pokemart_core::DomainError::InvalidQuantity { requested: amount },
            ));
        }

        // Conditional update: succeeds only when enough stock remains, so
        // concurrent decrements serialize on the row and cannot oversell.
        let row = sqlx::query(&format!(
            "UPDATE products SET stock_quantity = stock_quantity - $2 \
             WHERE id = $1 AND stock_quantity >= $2 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_product(&row),
            None => {
                // Distinguish "missing product" from "not enough stock".
                // This read runs after the failed UPDATE, outside any
                // transaction, so the reported `available` is advisory: a
                // concurrent write may have moved it since the miss. The
                // oversell guard itself does not depend on it.
                let current = self.get_product(id).await?;
                match current {
                    None => Err(StoreError::NotFound),
                    Some(p) => Err(StoreError::InsufficientStock {
                        product_id: id.clone(),
                        available: p.stock_quantity(),
                        requested: amount,
                    }),
                }
            }
        }
    }

    async fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<Product, StoreError> {
        if quantity < 0 {
            return Err(StoreError::Domain(pokemart_core::DomainError::validation(
                "stock_quantity cannot be negative",
            )));
        }

        let row = sqlx::query(&format!(
            "UPDATE products SET stock_quantity = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_product(&row),
            None => Err(StoreError::NotFound),
        }
    }
}

pub struct PostgresOrderLedger {
    pool: PgPool,
}

impl PostgresOrderLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, id: OrderId) -> Result<Vec<OrderLine>, StoreError> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, unit_price FROM order_lines WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let product_id: String = row.try_get("product_id")?;
                Ok(OrderLine {
                    product_id: ProductId::new(product_id)?,
                    quantity: row.try_get("quantity")?,
                    unit_price: row.try_get("unit_price")?,
                })
            })
            .collect()
    }
}

fn row_to_order(row: &sqlx::postgres::PgRow, lines: Vec<OrderLine>) -> Result<Order, StoreError> {
    let id: uuid::Uuid = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let status: String = row.try_get("status")?;
    Ok(Order::from_parts(
        OrderId::from_uuid(id),
        UserId::new(user_id)?,
        status.parse::<OrderStatus>()?,
        row.try_get("total")?,
        row.try_get("created_at")?,
        lines,
    ))
}

#[async_trait]
impl OrderLedger for PostgresOrderLedger {
    async fn create_order(
        &self,
        user_id: UserId,
        lines: Vec<OrderLine>,
    ) -> Result<Order, StoreError> {
        let order = Order::new(user_id, lines)?;

        // Header and lines commit or roll back together.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, user_id, status, total, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_str())
        .bind(order.status().as_str())
        .bind(order.total())
        .bind(order.created_at())
        .execute(&mut *tx)
        .await?;

        for line in order.lines() {
            sqlx::query(
                "INSERT INTO order_lines (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)",
            )
            .bind(order.id().as_uuid())
            .bind(line.product_id.as_str())
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query(
            "SELECT id, user_id, status, total, created_at FROM orders WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.load_lines(id).await?;
                Ok(Some(row_to_order(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, status, total, created_at FROM orders ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: uuid::Uuid = row.try_get("id")?;
            let lines = self.load_lines(OrderId::from_uuid(id)).await?;
            orders.push(row_to_order(row, lines)?);
        }
        Ok(orders)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        let row = sqlx::query(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING id, user_id, status, total, created_at",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let lines = self.load_lines(id).await?;
                row_to_order(&row, lines)
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_order(&self, id: OrderId) -> Result<Order, StoreError> {
        // Snapshot first; lines are cascade-deleted with the header.
        let snapshot = self.get_order(id).await?.ok_or(StoreError::NotFound)?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(snapshot)
    }
}

pub struct PostgresCartStore {
    pool: PgPool,
}

impl PostgresCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for PostgresCartStore {
    async fn lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        let rows = sqlx::query(
            "SELECT product_id, quantity, name, unit_price, image_url \
             FROM cart_lines WHERE user_id = $1 ORDER BY product_id",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let product_id: String = row.try_get("product_id")?;
                Ok(CartLine::new(
                    ProductId::new(product_id)?,
                    row.try_get::<i64, _>("quantity")?,
                    row.try_get::<String, _>("name")?,
                    row.try_get("unit_price")?,
                    row.try_get("image_url")?,
                )?)
            })
            .collect()
    }

    async fn put_line(&self, user_id: &UserId, line: CartLine) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (user_id, product_id, quantity, name, unit_price, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, product_id) DO UPDATE SET
                quantity = EXCLUDED.quantity,
                name = EXCLUDED.name,
                unit_price = EXCLUDED.unit_price,
                image_url = EXCLUDED.image_url
            "#,
        )
        .bind(user_id.as_str())
        .bind(line.product_id.as_str())
        .bind(line.quantity)
        .bind(&line.name)
        .bind(line.unit_price)
        .bind(line.image_url.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
