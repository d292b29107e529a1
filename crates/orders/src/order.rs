use core::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pokemart_catalog::ProductId;
use pokemart_core::{DomainError, DomainResult, UserId};

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
    /// for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for OrderId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("OrderId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Order status lifecycle.
///
/// Transitions are not enforced: `Order::set_status` is an unconditional
/// overwrite. `is_terminal` marks the states a stricter policy would refuse
/// to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}' (expected one of: pending, processing, shipped, delivered, cancelled)"
            ))),
        }
    }
}

/// Order line: product, quantity, and the unit price copied at purchase
/// time. Immutable thereafter, so later catalog price changes never rewrite
/// the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// A durable record of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total: Decimal,
    created_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
}

impl Order {
    /// Build a validated order with its total computed from the lines.
    ///
    /// The total is never taken from the caller; it is `Σ quantity × unit
    /// price` over the snapshotted lines. Status starts at `Processing`.
    pub fn new(user_id: UserId, lines: Vec<OrderLine>) -> DomainResult<Self> {
        if lines.is_empty() {
            return Err(DomainError::validation("order must contain at least one line"));
        }
        for line in &lines {
            if line.quantity <= 0 {
                return Err(DomainError::InvalidQuantity {
                    requested: line.quantity,
                });
            }
            if line.unit_price < Decimal::ZERO {
                return Err(DomainError::validation("unit_price cannot be negative"));
            }
        }

        let total = lines.iter().map(OrderLine::subtotal).sum();

        Ok(Self {
            id: OrderId::new(),
            user_id,
            status: OrderStatus::Processing,
            total,
            created_at: Utc::now(),
            lines,
        })
    }

    /// Rehydrate an order from persisted parts (storage adapters only).
    pub fn from_parts(
        id: OrderId,
        user_id: UserId,
        status: OrderStatus,
        total: Decimal,
        created_at: DateTime<Utc>,
        lines: Vec<OrderLine>,
    ) -> Self {
        Self {
            id,
            user_id,
            status,
            total,
            created_at,
            lines,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Unconditional status overwrite (admin back-office path).
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    fn line(id: &str, quantity: i64, cents: i64) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(id).unwrap(),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn total_is_computed_from_lines() {
        let order = Order::new(user(), vec![line("pikachu", 2, 1000), line("eevee", 1, 550)]).unwrap();
        assert_eq!(order.total(), Decimal::new(2550, 2));
        assert_eq!(order.status(), OrderStatus::Processing);
        assert_eq!(order.lines().len(), 2);
    }

    #[test]
    fn rejects_empty_and_invalid_lines() {
        assert!(Order::new(user(), vec![]).is_err());
        assert!(matches!(
            Order::new(user(), vec![line("pikachu", 0, 1000)]).unwrap_err(),
            DomainError::InvalidQuantity { requested: 0 }
        ));
        assert!(Order::new(user(), vec![line("pikachu", 1, -100)]).is_err());
    }

    #[test]
    fn status_overwrite_is_unconditional() {
        let mut order = Order::new(user(), vec![line("pikachu", 1, 1000)]).unwrap();
        order.set_status(OrderStatus::Shipped);
        assert_eq!(order.status(), OrderStatus::Shipped);

        // The source never guards transitions; delivered -> pending is allowed.
        order.set_status(OrderStatus::Delivered);
        order.set_status(OrderStatus::Pending);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn status_parses_from_wire_strings() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
        assert!("archived".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn line_prices_are_snapshots() {
        let l = line("pikachu", 3, 1000);
        let order = Order::new(user(), vec![l.clone()]).unwrap();
        // The stored line is a copy; the ledger does not reference the catalog.
        assert_eq!(order.lines()[0], l);
        assert_eq!(order.lines()[0].subtotal(), Decimal::new(3000, 2));
    }
}
