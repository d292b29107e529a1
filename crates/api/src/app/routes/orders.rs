use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use pokemart_orders::{OrderId, OrderStatus};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).patch(update_status))
        .route("/:id", get(get_order).delete(delete_order))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let orders = match services.ledger.list_orders().await {
        Ok(o) => o,
        Err(e) => return errors::store_error_to_response(e),
    };
    let items = orders.iter().map(dto::order_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    match services.ledger.get_order(order_id).await {
        Ok(Some(o)) => (StatusCode::OK, Json(dto::order_to_json(&o))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Back-office status overwrite. The id travels in the body, not the path.
pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match body.order_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    let status: OrderStatus = match body.status.parse() {
        Ok(v) => v,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.ledger.update_status(order_id, status).await {
        Ok(o) => (StatusCode::OK, Json(dto::order_to_json(&o))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Remove the order and return its last snapshot.
pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    match services.ledger.delete_order(order_id).await {
        Ok(o) => (StatusCode::OK, Json(dto::order_to_json(&o))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
