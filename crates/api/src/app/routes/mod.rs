use axum::{Router, routing::post};

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod system;

/// Router for all storefront and back-office endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/checkout", post(checkout::checkout))
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/cart", cart::router())
}
