//! Orders domain module.
//!
//! This crate contains business rules for the purchase ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;

pub use order::{Order, OrderId, OrderLine, OrderStatus};
