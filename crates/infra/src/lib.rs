//! Infrastructure layer: storage contracts, in-memory and Postgres
//! backends, and the checkout orchestration pipeline.

pub mod checkout;
pub mod store;


pub use checkout::{CheckoutError, CheckoutLine, CheckoutReceipt, CheckoutService, StockUpdate};
pub use store::{CartStore, InventoryStore, OrderLedger, StoreError};
