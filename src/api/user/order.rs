use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::responses::order_responses;
use crate::entities::order;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::{cart as carts, checkout};

pub fn order_router() -> Router {
    Router::new()
        .route("/orders", post(create_orders))
        .route("/checkorder", get(list_orders))
        .route("/checkorder/:id", get(get_order))
}

/// Checks out an explicit list of lines for the caller. Lines for products of
/// different shops end up in separate pending orders.
async fn create_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateOrders>,
) -> ApiResult {
    let lines = payload
        .color_size_quantities
        .iter()
        .map(checkout::CheckoutLine::from_value)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            ApiError::bad_request("Invalid item format (product_id/color_name/quantity).")
        })?;
    if lines.is_empty() {
        return Err(ApiError::bad_request("No items to order."));
    }
    let lines = checkout::aggregate(lines)?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let customer = carts::customer_for(&txn, claims.user_id).await?;
    let order_ids = checkout::place_orders(&txn, &customer, &lines).await?;

    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "detail": "Orders placed/updated successfully.",
            "order_ids": order_ids
        })),
    )
        .into_response())
}

async fn list_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let customer = carts::customer_for(&*db, claims.user_id).await?;

    let orders = order::Entity::find()
        .filter(order::Column::CustomerId.eq(customer.id))
        .order_by_desc(order::Column::OrderDate)
        .order_by_desc(order::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(order_responses(&*db, orders).await?)).into_response())
}

async fn get_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let customer = carts::customer_for(&*db, claims.user_id).await?;

    let order = order::Entity::find_by_id(id)
        .filter(order::Column::CustomerId.eq(customer.id))
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let mut responses = order_responses(&*db, vec![order]).await?;
    match responses.pop() {
        Some(response) => Ok((StatusCode::OK, Json(response)).into_response()),
        None => Err(ApiError::not_found("Order not found")),
    }
}

#[derive(Deserialize)]
struct CreateOrders {
    #[serde(default, alias = "color_quantities")]
    color_size_quantities: Vec<Value>,
}
