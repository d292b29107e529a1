use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use pokemart_catalog::ProductId;
use pokemart_core::UserId;
use pokemart_infra::CheckoutLine;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Convert the caller's items into a committed order.
///
/// Client-supplied quantities are taken as-is; prices never come from the
/// request, only from the catalog.
pub async fn checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckoutRequest>,
) -> axum::response::Response {
    let user_id: UserId = match body.user_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };

    let mut lines = Vec::with_capacity(body.items.len());
    for item in &body.items {
        let product_id: ProductId = match item.product_id.parse() {
            Ok(v) => v,
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
            }
        };
        lines.push(CheckoutLine {
            product_id,
            quantity: item.quantity,
        });
    }

    match services.checkout.checkout(&user_id, &lines).await {
        Ok(receipt) => (StatusCode::OK, Json(dto::receipt_to_json(&receipt))).into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
