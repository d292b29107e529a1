//! Catalog domain module.
//!
//! This crate contains business rules for products and their stock,
//! implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage).

pub mod product;

pub use product::{Product, ProductId, ProductMetadata};
