pub mod cart;
pub mod catalog;
pub mod content;
pub mod employee;
pub mod inventory;
pub mod order;
pub mod product;
pub mod review;
pub mod role;
pub mod sales;
pub mod shop;
pub mod upload;
pub mod user;

use axum::{middleware::from_fn_with_state, Router};

use crate::config::Config;
use crate::middleware::auth::{auth_middleware, AuthState};

use cart::admin_cart_router;
use catalog::admin_catalog_router;
use content::admin_content_router;
use employee::admin_employee_router;
use inventory::admin_inventory_router;
use order::admin_order_router;
use product::admin_product_router;
use review::admin_review_router;
use role::admin_role_router;
use sales::admin_sales_router;
use shop::admin_shop_router;
use upload::upload_router;
use user::admin_user_router;

/// Staff-only management API. Every handler resolves the caller into an
/// `Actor` and scopes rows by the shops it manages.
pub fn admin_api_router(state: AuthState, config: &Config) -> Router {
    Router::new()
        .merge(admin_shop_router())
        .merge(admin_role_router())
        .merge(admin_employee_router())
        .merge(admin_user_router())
        .merge(admin_catalog_router())
        .merge(admin_product_router())
        .merge(admin_inventory_router())
        .merge(admin_order_router())
        .merge(admin_cart_router())
        .merge(admin_review_router())
        .merge(admin_sales_router())
        .merge(admin_content_router())
        .merge(upload_router(config.file_size_limit))
        .route_layer(from_fn_with_state(state, auth_middleware))
}
