use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pokemart_core::{DomainError, DomainResult};

/// Product identifier (stable external string, e.g. `"pikachu"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("ProductId: cannot be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Descriptive product metadata. Immutable from the checkout path's
/// perspective; only the admin surface touches it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub image_url: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// A purchasable catalog entry with price and authoritative stock.
///
/// Availability is derived from `stock_quantity`, never stored as a second
/// field, so the `available == (stock_quantity > 0)` invariant holds by
/// construction after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Decimal,
    stock_quantity: i64,
    metadata: ProductMetadata,
}

impl Product {
    /// Build a validated product.
    ///
    /// Rejects empty names, negative prices, and negative stock.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        stock_quantity: i64,
        metadata: ProductMetadata,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if price < Decimal::ZERO {
            return Err(DomainError::validation("price cannot be negative"));
        }
        if stock_quantity < 0 {
            return Err(DomainError::validation("stock_quantity cannot be negative"));
        }
        Ok(Self {
            id,
            name,
            price,
            stock_quantity,
            metadata,
        })
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current unit price. Checkout snapshots this server-known value;
    /// client-supplied prices are never trusted.
    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stock_quantity(&self) -> i64 {
        self.stock_quantity
    }

    pub fn metadata(&self) -> &ProductMetadata {
        &self.metadata
    }

    /// Derived availability flag: in stock right now.
    pub fn available(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Remove `amount` units from stock.
    ///
    /// Preconditions: `amount > 0` and `stock_quantity >= amount`. Callers
    /// that need atomicity with respect to concurrent decrements must invoke
    /// this under a single lock section or translate it into one conditional
    /// store statement.
    pub fn decrement_stock(&mut self, amount: i64) -> DomainResult<()> {
        if amount <= 0 {
            return Err(DomainError::InvalidQuantity { requested: amount });
        }
        if self.stock_quantity < amount {
            return Err(DomainError::InsufficientStock {
                available: self.stock_quantity,
                requested: amount,
            });
        }
        self.stock_quantity -= amount;
        Ok(())
    }

    /// Admin path: set an absolute stock quantity.
    ///
    /// Shares the invariant-preserving update path with checkout decrements;
    /// availability is re-derived on the next read.
    pub fn set_stock(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation("stock_quantity cannot be negative"));
        }
        self.stock_quantity = quantity;
        Ok(())
    }
}
