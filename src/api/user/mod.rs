pub mod cart;
pub mod order;
pub mod profile;
pub mod review;
pub mod wishlist;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::{auth_middleware, AuthState};
use cart::cart_router;
use order::order_router;
use profile::profile_router;
use review::review_router;
use wishlist::wishlist_router;

/// Storefront routes for signed-in customers.
pub fn user_api_router(state: AuthState) -> Router {
    Router::new()
        .merge(profile_router())
        .merge(cart_router())
        .merge(order_router())
        .merge(review_router())
        .merge(wishlist_router())
        .route_layer(from_fn_with_state(state, auth_middleware))
}
