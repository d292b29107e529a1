//! Cart domain module.
//!
//! A cart line is a pending, unpurchased selection owned by a user. The
//! display snapshot it carries (name, price, image) is captured at
//! add-to-cart time and is UI-only; checkout re-reads live products and
//! never trusts it for pricing.

pub mod line;

pub use line::CartLine;
