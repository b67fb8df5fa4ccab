use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::sync::Arc;

use crate::api::responses::cart_response;
use crate::entities::{cart, cart_item};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::{scoped_product_ids, Actor};

/// Read-only view of customer carts.
pub fn admin_cart_router() -> Router {
    Router::new()
        .route("/carts", get(list_carts))
        .route("/carts/:id", get(get_cart))
}

/// Carts holding at least one of the actor's products; `None` means all.
async fn visible_cart_ids<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> Result<Option<Vec<i32>>, ApiError> {
    let Some(products) = scoped_product_ids(db, &actor.visible_shops()).await? else {
        return Ok(None);
    };
    let mut ids: Vec<i32> = cart_item::Entity::find()
        .select_only()
        .column(cart_item::Column::CartId)
        .filter(cart_item::Column::ProductId.is_in(products))
        .into_tuple()
        .all(db)
        .await?;
    ids.sort_unstable();
    ids.dedup();
    Ok(Some(ids))
}

async fn list_carts(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let mut select = cart::Entity::find().order_by_asc(cart::Column::Id);
    if let Some(ids) = visible_cart_ids(&*db, &actor).await? {
        select = select.filter(cart::Column::Id.is_in(ids));
    }

    let mut response = Vec::new();
    for cart in select.all(&*db).await? {
        response.push(cart_response(&*db, cart).await?);
    }

    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    if let Some(ids) = visible_cart_ids(&*db, &actor).await? {
        if !ids.contains(&id) {
            return Err(ApiError::not_found("Cart not found"));
        }
    }
    let cart = cart::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart not found"))?;

    Ok((StatusCode::OK, Json(cart_response(&*db, cart).await?)).into_response())
}
