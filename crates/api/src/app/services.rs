//! Store backends and checkout service wiring.
//!
//! Default backend is in-memory (dev/tests). Setting
//! `USE_PERSISTENT_STORES=true` together with `DATABASE_URL` swaps in the
//! Postgres stores; all handlers are written against the store traits, so
//! the choice is invisible above this module.

use std::sync::Arc;

use pokemart_infra::store::{
    InMemoryCartStore, InMemoryInventoryStore, InMemoryOrderLedger, PostgresCartStore,
    PostgresInventoryStore, PostgresOrderLedger, postgres,
};
use pokemart_infra::{CartStore, CheckoutService, InventoryStore, OrderLedger};

pub struct AppServices {
    pub inventory: Arc<dyn InventoryStore>,
    pub ledger: Arc<dyn OrderLedger>,
    pub cart: Arc<dyn CartStore>,
    pub checkout: CheckoutService,
}

impl AppServices {
    pub fn new(
        inventory: Arc<dyn InventoryStore>,
        ledger: Arc<dyn OrderLedger>,
        cart: Arc<dyn CartStore>,
    ) -> Self {
        let checkout = CheckoutService::new(inventory.clone(), ledger.clone(), cart.clone());
        Self {
            inventory,
            ledger,
            cart,
            checkout,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(InMemoryOrderLedger::new()),
            Arc::new(InMemoryCartStore::new()),
        )
    }
}

pub async fn build_services() -> AppServices {
    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    if use_persistent {
        let database_url =
            std::env::var("DATABASE_URL").expect("USE_PERSISTENT_STORES requires DATABASE_URL");
        let pool = postgres::connect(&database_url)
            .await
            .expect("failed to connect to postgres");
        tracing::info!("using persistent stores (postgres)");
        return AppServices::new(
            Arc::new(PostgresInventoryStore::new(pool.clone())),
            Arc::new(PostgresOrderLedger::new(pool.clone())),
            Arc::new(PostgresCartStore::new(pool)),
        );
    }

    tracing::info!("using in-memory stores");
    AppServices::in_memory()
}
