use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use pokemart_cart::CartLine;
use pokemart_catalog::{Product, ProductId};
use pokemart_core::UserId;
use pokemart_orders::{Order, OrderId, OrderLine, OrderStatus};

use super::traits::{CartStore, InventoryStore, OrderLedger, StoreError};

fn poisoned() -> StoreError {
    StoreError::Persistence("lock poisoned".to_string())
}

/// In-memory inventory store.
///
/// Intended for tests/dev. The read-check-write of `decrement_stock` runs
/// entirely inside one write-lock section, which makes it atomic with
/// respect to concurrent decrements of the same product.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        Ok(products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let products = self.products.read().map_err(|_| poisoned())?;
        let mut all: Vec<Product> = products.values().cloned().collect();
        all.sort_by(|a, b| a.id().as_str().cmp(b.id().as_str()));
        Ok(all)
    }

    async fn upsert_product(&self, product: Product) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        products.insert(product.id().clone(), product.clone());
        Ok(product)
    }

    async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        let product = products.get_mut(id).ok_or(StoreError::NotFound)?;
        product
            .decrement_stock(amount)
            .map_err(|e| StoreError::for_product(id, e))?;
        Ok(product.clone())
    }

    async fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<Product, StoreError> {
        let mut products = self.products.write().map_err(|_| poisoned())?;
        let product = products.get_mut(id).ok_or(StoreError::NotFound)?;
        product
            .set_stock(quantity)
            .map_err(|e| StoreError::for_product(id, e))?;
        Ok(product.clone())
    }
}

/// In-memory order ledger. Header and lines live in one map entry, so they
/// are written (and deleted) as one unit by construction.
#[derive(Debug, Default)]
pub struct InMemoryOrderLedger {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn create_order(
        &self,
        user_id: UserId,
        lines: Vec<OrderLine>,
    ) -> Result<Order, StoreError> {
        let order = Order::new(user_id, lines)?;
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        orders.insert(order.id(), order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        Ok(orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(Order::created_at);
        Ok(all)
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        let order = orders.get_mut(&id).ok_or(StoreError::NotFound)?;
        order.set_status(status);
        Ok(order.clone())
    }

    async fn delete_order(&self, id: OrderId) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        orders.remove(&id).ok_or(StoreError::NotFound)
    }
}

/// In-memory cart store, keyed by user.
#[derive(Debug, Default)]
pub struct InMemoryCartStore {
    carts: RwLock<HashMap<UserId, Vec<CartLine>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn lines(&self, user_id: &UserId) -> Result<Vec<CartLine>, StoreError> {
        let carts = self.carts.read().map_err(|_| poisoned())?;
        Ok(carts.get(user_id).cloned().unwrap_or_default())
    }

    async fn put_line(&self, user_id: &UserId, line: CartLine) -> Result<(), StoreError> {
        let mut carts = self.carts.write().map_err(|_| poisoned())?;
        let lines = carts.entry(user_id.clone()).or_default();
        match lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => *existing = line,
            None => lines.push(line),
        }
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut carts = self.carts.write().map_err(|_| poisoned())?;
        carts.remove(user_id);
        Ok(())
    }
}
