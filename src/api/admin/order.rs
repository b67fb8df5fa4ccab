use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::responses::order_responses;
use crate::entities::{order, role_permission::Permission};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

pub fn admin_order_router() -> Router {
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order).patch(patch_order))
}

async fn managed_order<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<order::Model, ApiError> {
    actor
        .scope(Permission::ManageOrders)?
        .apply(order::Entity::find_by_id(id), order::Column::ShopId)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))
}

fn parse_status(value: &str) -> Result<order::Status, ApiError> {
    value
        .parse::<order::Status>()
        .map_err(|_| ApiError::bad_request(format!("Invalid status: {value}")))
}

async fn list_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<OrdersQuery>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let mut select = actor
        .scope(Permission::ManageOrders)?
        .apply(order::Entity::find(), order::Column::ShopId)
        .order_by_desc(order::Column::OrderDate)
        .order_by_desc(order::Column::Id);
    if let Some(status) = query.status.as_deref() {
        select = select.filter(order::Column::Status.eq(parse_status(status)?));
    }
    if let Some(shop_id) = query.shop_id {
        select = select.filter(order::Column::ShopId.eq(shop_id));
    }
    let orders = select.all(&*db).await?;

    Ok((StatusCode::OK, Json(order_responses(&*db, orders).await?)).into_response())
}

async fn get_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let order = managed_order(&*db, &actor, id).await?;

    let mut response = order_responses(&*db, vec![order]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn patch_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchOrder>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let order = managed_order(&*db, &actor, id).await?;
    let status = parse_status(&payload.status)?;

    let previous = order.status;
    let mut update: order::ActiveModel = order.into();
    update.status = Set(status);
    let order = update.update(&*db).await?;

    info!(order_id = order.id, from = %previous, to = %status, "Order status changed");
    let mut response = order_responses(&*db, vec![order]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

#[derive(Deserialize)]
struct OrdersQuery {
    status: Option<String>,
    shop_id: Option<i32>,
}

#[derive(Deserialize)]
struct PatchOrder {
    status: String,
}
