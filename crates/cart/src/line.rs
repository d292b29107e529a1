use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pokemart_catalog::{Product, ProductId};
use pokemart_core::{DomainError, DomainResult};

/// A pending selection of a product and quantity for a given user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Display snapshot captured at add-to-cart time.
    pub name: String,
    /// Display snapshot; never used for pricing at checkout.
    pub unit_price: Decimal,
    pub image_url: Option<String>,
}

impl CartLine {
    pub fn new(
        product_id: ProductId,
        quantity: i64,
        name: impl Into<String>,
        unit_price: Decimal,
        image_url: Option<String>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity { requested: quantity });
        }
        Ok(Self {
            product_id,
            quantity,
            name: name.into(),
            unit_price,
            image_url,
        })
    }

    /// Capture the display snapshot from a live catalog product.
    pub fn for_product(product: &Product, quantity: i64) -> DomainResult<Self> {
        Self::new(
            product.id().clone(),
            quantity,
            product.name(),
            product.price(),
            product.metadata().image_url.clone(),
        )
    }
}
