pub mod admin;
pub mod public;
pub mod responses;
pub mod user;
pub mod validation;

use axum::{middleware, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::auth::{Access, AuthState};
use crate::middleware::logging::logging_middleware;

use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub fn create_api_router(shared_db: Arc<DatabaseConnection>, config: Arc<Config>) -> Router {
    let auth_state = |access| AuthState {
        db: shared_db.clone(),
        config: config.clone(),
        access,
    };

    let store = public_api_router().merge(user_api_router(auth_state(Access::Authenticated)));
    let admin = admin_api_router(auth_state(Access::Staff), &config);

    Router::new()
        .nest("/api/store", store)
        .nest("/api/admin", admin)
        .layer(Extension(shared_db))
        .layer(Extension(config))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
