//! Storage contracts and backends.
//!
//! The traits here are the seams between the orchestration pipeline and the
//! persistence technology. Two backends are provided: a lock-based in-memory
//! implementation (tests/dev) and a Postgres implementation (sqlx).

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use in_memory::{InMemoryCartStore, InMemoryInventoryStore, InMemoryOrderLedger};
pub use postgres::{PostgresCartStore, PostgresInventoryStore, PostgresOrderLedger};
pub use traits::{CartStore, InventoryStore, OrderLedger, StoreError};
