pub mod auth;
pub mod catalog;
pub mod content;
pub mod product;
pub mod review;
pub mod shop;
pub mod uploads;

use axum::Router;

use auth::auth_router;
use catalog::catalog_router;
use content::content_router;
use product::product_router;
use review::review_router;
use shop::shop_router;
use uploads::uploads_router;

/// Storefront routes that need no credentials.
pub fn public_api_router() -> Router {
    Router::new()
        .merge(auth_router())
        .merge(catalog_router())
        .merge(product_router())
        .merge(review_router())
        .merge(content_router())
        .merge(shop_router())
        .merge(uploads_router())
}
