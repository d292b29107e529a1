use async_trait::async_trait;
use thiserror::Error;

use pokemart_cart::CartLine;
use pokemart_catalog::{Product, ProductId};
use pokemart_core::{DomainError, UserId};
use pokemart_orders::{Order, OrderId, OrderLine, OrderStatus};

/// Storage-level error.
///
/// Deterministic domain failures pass through as `Domain`; stock shortfalls
/// get their own variant carrying the product id so callers can report
/// available vs requested. `Persistence` is the distinct class for an
/// unreachable or rejecting backend — fatal to the in-flight operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Map a domain error raised for a specific product, attaching the id
    /// to stock shortfalls.
    pub(crate) fn for_product(product_id: &ProductId, err: DomainError) -> Self {
        match err {
            DomainError::InsufficientStock {
                available,
                requested,
            } => Self::InsufficientStock {
                product_id: product_id.clone(),
                available,
                requested,
            },
            DomainError::NotFound => Self::NotFound,
            other => Self::Domain(other),
        }
    }
}

/// Single source of truth for product availability and quantity.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Read current stock and price; no side effects.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;

    /// Catalog listing (storefront read surface).
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Admin path: create or replace a product wholesale. Availability is
    /// derived from the written stock on the next read.
    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError>;

    /// Atomically remove `amount` units of stock.
    ///
    /// Preconditions: `amount > 0` and current stock `>= amount`. The
    /// read-check-write must be one atomic step with respect to concurrent
    /// decrements of the same product (one lock section, or one conditional
    /// SQL statement). Returns the updated product.
    async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<Product, StoreError>;

    /// Admin path: set an absolute stock quantity through the same
    /// invariant-preserving update path.
    async fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<Product, StoreError>;
}

/// Durable, append-mostly record of purchases.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Persist a new order and its lines as one unit. An order header
    /// without lines (or vice versa) must never be observable.
    async fn create_order(
        &self,
        user_id: UserId,
        lines: Vec<OrderLine>,
    ) -> Result<Order, StoreError>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Admin back-office listing, oldest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Unconditional status overwrite. Returns the updated order.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError>;

    /// Remove the order and its lines; returns the pre-deletion snapshot.
    async fn delete_order(&self, id: OrderId) -> Result<Order, StoreError>;
}

/// Pending selections per user. Thin collaborator: checkout only clears it
/// after an order is durably recorded.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError>;

    /// Add or replace the line for this product (repeated adds update the
    /// requested quantity and refresh the display snapshot).
    async fn put_line(&self, user_id: &UserId, line: CartLine) -> Result<(), StoreError>;

    async fn clear(&self, user_id: &UserId) -> Result<(), StoreError>;
}
