use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use pokemart_cart::CartLine;
use pokemart_catalog::Product;
use pokemart_infra::{CheckoutReceipt, StockUpdate};
use pokemart_orders::Order;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CheckoutItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub items: Vec<CheckoutItemRequest>,
}

/// Admin upsert: the full product shape. Prices travel as JSON strings
/// (`"10.00"`), matching the response side.
#[derive(Debug, Deserialize)]
pub struct UpsertProductRequest {
    pub name: String,
    pub price: Decimal,
    pub stock_quantity: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCartLineRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
}

// -------------------------
// Response JSON mapping
// -------------------------

pub fn product_to_json(p: &Product) -> Value {
    json!({
        "id": p.id().as_str(),
        "name": p.name(),
        "price": p.price(),
        "stock_quantity": p.stock_quantity(),
        "available": p.available(),
        "image_url": p.metadata().image_url,
        "description": p.metadata().description,
        "categories": p.metadata().categories,
    })
}

pub fn order_to_json(o: &Order) -> Value {
    json!({
        "id": o.id().to_string(),
        "user_id": o.user_id().as_str(),
        "status": o.status().as_str(),
        "total": o.total(),
        "created_at": o.created_at(),
        "lines": o.lines().iter().map(|l| json!({
            "product_id": l.product_id.as_str(),
            "quantity": l.quantity,
            "unit_price": l.unit_price,
        })).collect::<Vec<_>>(),
    })
}

pub fn cart_line_to_json(l: &CartLine) -> Value {
    json!({
        "product_id": l.product_id.as_str(),
        "quantity": l.quantity,
        "name": l.name,
        "unit_price": l.unit_price,
        "image_url": l.image_url,
    })
}

pub fn stock_update_to_json(u: &StockUpdate) -> Value {
    json!({
        "product_id": u.product_id.as_str(),
        "previous_stock": u.previous_stock,
        "new_stock": u.new_stock,
        "quantity_purchased": u.quantity_purchased,
    })
}

pub fn receipt_to_json(r: &CheckoutReceipt) -> Value {
    json!({
        "order_id": r.order_id.to_string(),
        "total": r.total,
        "items_updated": r.stock_updates.len(),
        "stock_updates": r.stock_updates.iter().map(stock_update_to_json).collect::<Vec<_>>(),
    })
}
