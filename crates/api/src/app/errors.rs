use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pokemart_infra::{CheckoutError, StoreError};

use crate::app::dto;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::InsufficientStock {
            product_id,
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock for {product_id}"),
                "insufficient_stock": true,
                "item": product_id.as_str(),
                "available": available,
                "requested": requested,
            })),
        )
            .into_response(),
        StoreError::Domain(e) => json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        StoreError::Persistence(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

/// Checkout failures carry enough structure for the storefront to explain
/// exactly which line failed, so they get richer bodies than the generic
/// envelope.
pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    match err {
        CheckoutError::ProductNotFound(product_id) => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({
                "error": "product_not_found",
                "message": format!("product not found: {product_id}"),
                "item": product_id.as_str(),
            })),
        )
            .into_response(),
        CheckoutError::InvalidQuantity {
            product_id,
            requested,
        } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "invalid_quantity",
                "message": format!("invalid quantity {requested} for {product_id}"),
                "item": product_id.as_str(),
                "requested": requested,
            })),
        )
            .into_response(),
        CheckoutError::InsufficientStock {
            product_id,
            available,
            requested,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("insufficient stock for {product_id}"),
                "insufficient_stock": true,
                "item": product_id.as_str(),
                "available": available,
                "requested": requested,
            })),
        )
            .into_response(),
        CheckoutError::ReservationFailed {
            product_id,
            available,
            requested,
            reserved,
        } => (
            StatusCode::CONFLICT,
            axum::Json(json!({
                "error": "insufficient_stock",
                "message": format!("stock changed while reserving {product_id}"),
                "insufficient_stock": true,
                "item": product_id.as_str(),
                "available": available,
                "requested": requested,
                "reserved": reserved.iter().map(dto::stock_update_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        CheckoutError::EmptyCart => json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "checkout requires at least one cart line",
        ),
        CheckoutError::Store(e) => store_error_to_response(e),
    }
}
