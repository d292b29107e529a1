//! Checkout orchestration pipeline.
//!
//! A checkout attempt moves through:
//!
//! ```text
//! Validating -> Reserving -> Recording -> ClearingCart -> Completed
//! ```
//!
//! with an abort path out of Validating (no mutation performed) and a
//! surfaced partial-progress failure out of Reserving (the race case).
//!
//! - **Validating** is a read-only pass over *all* lines before any
//!   mutation, so a multi-item cart never reserves stock for early lines
//!   only to discover a shortfall on a later one. Product snapshots (price,
//!   name, stock) are captured here; client-supplied cart data is never
//!   trusted for pricing.
//! - **Reserving** decrements stock per line in caller order. Validation
//!   confirmed sufficiency under a single logical snapshot, so this is
//!   expected to succeed; a concurrent decrement elsewhere can still
//!   invalidate the snapshot, in which case the store's atomic re-check
//!   fails and the lines already decremented are surfaced to the caller
//!   (no rollback in this minimal contract).
//! - **Recording** writes the order with unit prices from the fetched
//!   snapshots; header and lines are one atomic unit (store contract).
//! - **ClearingCart** failure is logged but does not revert the order:
//!   checkout is committed once the order is recorded.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pokemart_catalog::{Product, ProductId};
use pokemart_core::UserId;
use pokemart_orders::{OrderId, OrderLine};

use crate::store::{CartStore, InventoryStore, OrderLedger, StoreError};

/// One requested line of a checkout call: product and quantity, nothing
/// else. Prices always come from the inventory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Stock movement applied for one line of a completed (or partially
/// reserved) checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_id: ProductId,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub quantity_purchased: i64,
}

/// Successful checkout result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub total: Decimal,
    pub stock_updates: Vec<StockUpdate>,
}

/// Checkout failure taxonomy.
///
/// `ProductNotFound` / `InvalidQuantity` / `InsufficientStock` abort during
/// Validating with no mutation performed — expected, user-facing conditions.
/// `ReservationFailed` is the Reserving-phase race: it carries the lines
/// already decremented so the caller can report and resolve them.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("invalid quantity {requested} for {product_id}")]
    InvalidQuantity { product_id: ProductId, requested: i64 },

    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    #[error("reservation failed for {product_id}: requested {requested}, available {available}")]
    ReservationFailed {
        product_id: ProductId,
        available: i64,
        requested: i64,
        /// Lines already decremented in this attempt, in caller order.
        reserved: Vec<StockUpdate>,
    },

    #[error("checkout requires at least one cart line")]
    EmptyCart,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates a checkout attempt across the inventory store, the order
/// ledger, and the cart store.
pub struct CheckoutService {
    inventory: Arc<dyn InventoryStore>,
    ledger: Arc<dyn OrderLedger>,
    cart: Arc<dyn CartStore>,
}

impl CheckoutService {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        ledger: Arc<dyn OrderLedger>,
        cart: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            inventory,
            ledger,
            cart,
        }
    }

    /// Convert cart lines into a committed order, decrementing stock.
    ///
    /// Lines are processed in the order supplied by the caller; no
    /// reordering. Duplicate product ids are treated as independent lines:
    /// validation sees them against the same snapshot, and the store's
    /// atomic re-check during Reserving catches an oversubscribed pair.
    pub async fn checkout(
        &self,
        user_id: &UserId,
        lines: &[CheckoutLine],
    ) -> Result<CheckoutReceipt, CheckoutError> {
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Validating: read-only, all lines before any mutation.
        let snapshots = self.validate(lines).await?;

        // Reserving: per validated line, in validation order.
        let updates = self.reserve(&snapshots).await?;

        // Recording: unit prices from the fetched snapshots.
        let order_lines = snapshots
            .iter()
            .map(|(line, product)| OrderLine {
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                unit_price: product.price(),
            })
            .collect();
        let order = self
            .ledger
            .create_order(user_id.clone(), order_lines)
            .await?;

        // ClearingCart: committed once the order is recorded; a failure
        // here is logged and surfaced to nobody.
        if let Err(e) = self.cart.clear(user_id).await {
            tracing::warn!(
                user_id = %user_id,
                order_id = %order.id(),
                error = %e,
                "cart clear failed after committed checkout"
            );
        }

        tracing::info!(
            user_id = %user_id,
            order_id = %order.id(),
            total = %order.total(),
            lines = lines.len(),
            "checkout committed"
        );

        Ok(CheckoutReceipt {
            order_id: order.id(),
            total: order.total(),
            stock_updates: updates,
        })
    }

    async fn validate<'a>(
        &self,
        lines: &'a [CheckoutLine],
    ) -> Result<Vec<(&'a CheckoutLine, Product)>, CheckoutError> {
        let mut snapshots = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity <= 0 {
                return Err(CheckoutError::InvalidQuantity {
                    product_id: line.product_id.clone(),
                    requested: line.quantity,
                });
            }

            let product = self
                .inventory
                .get_product(&line.product_id)
                .await?
                .ok_or_else(|| CheckoutError::ProductNotFound(line.product_id.clone()))?;

            if product.stock_quantity() < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available: product.stock_quantity(),
                    requested: line.quantity,
                });
            }

            snapshots.push((line, product));
        }
        Ok(snapshots)
    }

    async fn reserve(
        &self,
        snapshots: &[(&CheckoutLine, Product)],
    ) -> Result<Vec<StockUpdate>, CheckoutError> {
        let mut updates = Vec::with_capacity(snapshots.len());
        for (line, _) in snapshots {
            match self
                .inventory
                .decrement_stock(&line.product_id, line.quantity)
                .await
            {
                Ok(updated) => updates.push(StockUpdate {
                    product_id: line.product_id.clone(),
                    previous_stock: updated.stock_quantity() + line.quantity,
                    new_stock: updated.stock_quantity(),
                    quantity_purchased: line.quantity,
                }),
                Err(StoreError::InsufficientStock {
                    product_id,
                    available,
                    requested,
                }) => {
                    // Race: a concurrent decrement invalidated the snapshot
                    // between Validating and this line.
                    return Err(CheckoutError::ReservationFailed {
                        product_id,
                        available,
                        requested,
                        reserved: updates,
                    });
                }
                Err(other) => return Err(CheckoutError::Store(other)),
            }
        }
        Ok(updates)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use pokemart_cart::CartLine;
    use pokemart_catalog::ProductMetadata;

    use crate::store::{InMemoryCartStore, InMemoryInventoryStore, InMemoryOrderLedger};

    use super::*;

    fn product(id: &str, stock: i64, cents: i64) -> Product {
        Product::new(
            ProductId::new(id).unwrap(),
            id.to_string(),
            Decimal::new(cents, 2),
            stock,
            ProductMetadata::default(),
        )
        .unwrap()
    }

    fn line(id: &str, quantity: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(id).unwrap(),
            quantity,
        }
    }

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    struct Fixture {
        inventory: Arc<InMemoryInventoryStore>,
        ledger: Arc<InMemoryOrderLedger>,
        cart: Arc<InMemoryCartStore>,
        service: CheckoutService,
    }

    fn fixture() -> Fixture {
        let inventory = Arc::new(InMemoryInventoryStore::new());
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let cart = Arc::new(InMemoryCartStore::new());
        let service = CheckoutService::new(inventory.clone(), ledger.clone(), cart.clone());
        Fixture {
            inventory,
            ledger,
            cart,
            service,
        }
    }

    async fn stock_of(fx: &Fixture, id: &str) -> i64 {
        fx.inventory
            .get_product(&ProductId::new(id).unwrap())
            .await
            .unwrap()
            .unwrap()
            .stock_quantity()
    }

    #[tokio::test]
    async fn successful_checkout_decrements_stock_and_records_order() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("pikachu", 5, 1000))
            .await
            .unwrap();

        let receipt = fx
            .service
            .checkout(&user(), &[line("pikachu", 2)])
            .await
            .unwrap();

        assert_eq!(receipt.total, Decimal::new(2000, 2));
        assert_eq!(receipt.stock_updates.len(), 1);
        assert_eq!(receipt.stock_updates[0].previous_stock, 5);
        assert_eq!(receipt.stock_updates[0].new_stock, 3);
        assert_eq!(receipt.stock_updates[0].quantity_purchased, 2);
        assert_eq!(stock_of(&fx, "pikachu").await, 3);

        let order = fx.ledger.get_order(receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.total(), Decimal::new(2000, 2));
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].unit_price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn insufficient_stock_aborts_with_no_mutation() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("mewtwo", 1, 99900))
            .await
            .unwrap();

        let err = fx
            .service
            .checkout(&user(), &[line("mewtwo", 2)])
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id.as_str(), "mewtwo");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
        assert_eq!(stock_of(&fx, "mewtwo").await, 1);
        assert!(fx.ledger.list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_is_all_or_nothing_across_lines() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("pikachu", 5, 1000))
            .await
            .unwrap();
        fx.inventory
            .upsert_product(product("eevee", 1, 550))
            .await
            .unwrap();

        // First line is satisfiable, second is short: nothing may move.
        let err = fx
            .service
            .checkout(&user(), &[line("pikachu", 5), line("eevee", 2)])
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        assert_eq!(stock_of(&fx, "pikachu").await, 5);
        assert_eq!(stock_of(&fx, "eevee").await, 1);
    }

    #[tokio::test]
    async fn missing_product_aborts_before_any_decrement() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("pikachu", 5, 1000))
            .await
            .unwrap();

        let err = fx
            .service
            .checkout(&user(), &[line("pikachu", 1), line("missingno", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ProductNotFound(ref id) if id.as_str() == "missingno"));
        assert_eq!(stock_of(&fx, "pikachu").await, 5);
    }

    #[tokio::test]
    async fn zero_and_negative_quantities_are_validation_errors() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("pikachu", 5, 1000))
            .await
            .unwrap();

        for bad in [0, -1] {
            let err = fx
                .service
                .checkout(&user(), &[line("pikachu", bad)])
                .await
                .unwrap_err();
            assert!(matches!(err, CheckoutError::InvalidQuantity { requested, .. } if requested == bad));
        }
        assert_eq!(stock_of(&fx, "pikachu").await, 5);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let fx = fixture();
        assert!(matches!(
            fx.service.checkout(&user(), &[]).await.unwrap_err(),
            CheckoutError::EmptyCart
        ));
    }

    #[tokio::test]
    async fn total_ignores_client_side_prices() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("eevee", 10, 550))
            .await
            .unwrap();

        // Seed the cart with a stale snapshot price; checkout must use the
        // live catalog price, not the snapshot.
        let stale = CartLine::new(
            ProductId::new("eevee").unwrap(),
            2,
            "Eevee",
            Decimal::new(1, 2),
            None,
        )
        .unwrap();
        fx.cart.put_line(&user(), stale).await.unwrap();

        let receipt = fx
            .service
            .checkout(&user(), &[line("eevee", 2)])
            .await
            .unwrap();
        assert_eq!(receipt.total, Decimal::new(1100, 2));
    }

    #[tokio::test]
    async fn cart_is_cleared_only_after_order_is_recorded() {
        let fx = fixture();
        let u = user();
        let p = product("pikachu", 5, 1000);
        fx.inventory.upsert_product(p.clone()).await.unwrap();
        fx.cart
            .put_line(&u, CartLine::for_product(&p, 2).unwrap())
            .await
            .unwrap();

        fx.service.checkout(&u, &[line("pikachu", 2)]).await.unwrap();
        assert!(fx.cart.lines(&u).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn selling_out_flips_availability() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("snorlax", 3, 24900))
            .await
            .unwrap();

        fx.service.checkout(&user(), &[line("snorlax", 3)]).await.unwrap();

        let p = fx
            .inventory
            .get_product(&ProductId::new("snorlax").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.stock_quantity(), 0);
        assert!(!p.available());
    }

    #[tokio::test]
    async fn duplicate_lines_surface_the_reserving_race() {
        let fx = fixture();
        fx.inventory
            .upsert_product(product("pikachu", 3, 1000))
            .await
            .unwrap();

        // Both lines validate against the same snapshot (2 <= 3), but the
        // second decrement finds only 1 unit left.
        let err = fx
            .service
            .checkout(&user(), &[line("pikachu", 2), line("pikachu", 2)])
            .await
            .unwrap_err();

        match err {
            CheckoutError::ReservationFailed {
                product_id,
                available,
                requested,
                reserved,
            } => {
                assert_eq!(product_id.as_str(), "pikachu");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
                assert_eq!(reserved.len(), 1);
                assert_eq!(reserved[0].previous_stock, 3);
                assert_eq!(reserved[0].new_stock, 1);
            }
            other => panic!("expected ReservationFailed, got {other:?}"),
        }

        // Minimal contract: the first decrement is not rolled back.
        assert_eq!(stock_of(&fx, "pikachu").await, 1);
        assert!(fx.ledger.list_orders().await.unwrap().is_empty());
    }

    /// Inventory wrapper whose writes fail as if the backend were down.
    struct UnreachableInventory {
        inner: Arc<InMemoryInventoryStore>,
    }

    #[async_trait]
    impl InventoryStore for UnreachableInventory {
        async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
            self.inner.get_product(id).await
        }

        async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
            self.inner.list_products().await
        }

        async fn upsert_product(&self, p: Product) -> Result<Product, StoreError> {
            self.inner.upsert_product(p).await
        }

        async fn decrement_stock(&self, _id: &ProductId, _amount: i64) -> Result<Product, StoreError> {
            Err(StoreError::Persistence("connection reset".to_string()))
        }

        async fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<Product, StoreError> {
            self.inner.set_stock(id, quantity).await
        }
    }

    #[tokio::test]
    async fn backend_failure_is_fatal_and_records_nothing() {
        let inner = Arc::new(InMemoryInventoryStore::new());
        inner.upsert_product(product("pikachu", 5, 1000)).await.unwrap();

        let inventory = Arc::new(UnreachableInventory { inner: inner.clone() });
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let cart = Arc::new(InMemoryCartStore::new());
        let service = CheckoutService::new(inventory, ledger.clone(), cart);

        let err = service
            .checkout(&user(), &[line("pikachu", 2)])
            .await
            .unwrap_err();

        // A backend failure is its own class, not insufficient stock.
        assert!(matches!(
            err,
            CheckoutError::Store(StoreError::Persistence(_))
        ));
        assert!(ledger.list_orders().await.unwrap().is_empty());
        assert_eq!(stock_of_store(&inner, "pikachu").await, 5);
    }

    async fn stock_of_store(store: &InMemoryInventoryStore, id: &str) -> i64 {
        store
            .get_product(&ProductId::new(id).unwrap())
            .await
            .unwrap()
            .unwrap()
            .stock_quantity()
    }

    /// Inventory wrapper that injects a concurrent decrement between
    /// Validating and Reserving for one product, simulating the race.
    struct RacingInventory {
        inner: Arc<InMemoryInventoryStore>,
        victim: ProductId,
        steal: i64,
    }

    #[async_trait]
    impl InventoryStore for RacingInventory {
        async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
            self.inner.get_product(id).await
        }

        async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
            self.inner.list_products().await
        }

        async fn upsert_product(&self, p: Product) -> Result<Product, StoreError> {
            self.inner.upsert_product(p).await
        }

        async fn decrement_stock(&self, id: &ProductId, amount: i64) -> Result<Product, StoreError> {
            if *id == self.victim {
                // Another checkout wins the race just before this line.
                let _ = self.inner.decrement_stock(id, self.steal).await;
            }
            self.inner.decrement_stock(id, amount).await
        }

        async fn set_stock(&self, id: &ProductId, quantity: i64) -> Result<Product, StoreError> {
            self.inner.set_stock(id, quantity).await
        }
    }

    #[tokio::test]
    async fn lost_race_reports_lines_reserved_so_far() {
        let inner = Arc::new(InMemoryInventoryStore::new());
        inner.upsert_product(product("pikachu", 5, 1000)).await.unwrap();
        inner.upsert_product(product("eevee", 2, 550)).await.unwrap();

        let inventory = Arc::new(RacingInventory {
            inner: inner.clone(),
            victim: ProductId::new("eevee").unwrap(),
            steal: 1,
        });
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let cart = Arc::new(InMemoryCartStore::new());
        let service = CheckoutService::new(inventory, ledger.clone(), cart);

        let err = service
            .checkout(&user(), &[line("pikachu", 1), line("eevee", 2)])
            .await
            .unwrap_err();

        match err {
            CheckoutError::ReservationFailed {
                product_id,
                available,
                requested,
                reserved,
            } => {
                assert_eq!(product_id.as_str(), "eevee");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
                // pikachu was already reserved and is surfaced, not rolled back.
                assert_eq!(reserved.len(), 1);
                assert_eq!(reserved[0].product_id.as_str(), "pikachu");
                assert_eq!(reserved[0].new_stock, 4);
            }
            other => panic!("expected ReservationFailed, got {other:?}"),
        }

        assert!(ledger.list_orders().await.unwrap().is_empty());
    }
}
