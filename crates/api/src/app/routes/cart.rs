use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use pokemart_cart::CartLine;
use pokemart_catalog::ProductId;
use pokemart_core::UserId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(add_line))
        .route("/:user_id", get(get_cart))
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(user_id): Path<String>,
) -> axum::response::Response {
    let user_id: UserId = match user_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };
    match services.cart.lines(&user_id).await {
        Ok(lines) => {
            let items = lines.iter().map(dto::cart_line_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Add or replace a cart line. The display snapshot (name, price, image) is
/// captured server-side from the live product; the client only names the
/// product and quantity.
pub async fn add_line(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::AddCartLineRequest>,
) -> axum::response::Response {
    let user_id: UserId = match body.user_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"),
    };
    let product_id: ProductId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let product = match services.inventory.get_product(&product_id).await {
        Ok(Some(p)) => p,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => return errors::store_error_to_response(e),
    };

    let line = match CartLine::for_product(&product, body.quantity) {
        Ok(l) => l,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_quantity", e.to_string()),
    };

    match services.cart.put_line(&user_id, line.clone()).await {
        Ok(()) => (StatusCode::CREATED, Json(dto::cart_line_to_json(&line))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
