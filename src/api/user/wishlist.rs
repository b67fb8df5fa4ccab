use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::responses::wishlist_responses;
use crate::entities::{product, wishlist, wishlist_product};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::cart as carts;

pub fn wishlist_router() -> Router {
    Router::new()
        .route("/wishlists", get(list_wishlists).post(create_wishlist))
        .route("/wishlists/:id", delete(delete_wishlist))
        .route("/wishlists/user/:user_id", get(user_wishlists))
}

async fn list_wishlists(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let customer = carts::customer_for(&*db, claims.user_id).await?;
    let wishlists = wishlist::Entity::find()
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .order_by_desc(wishlist::Column::CreatedAt)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(wishlist_responses(&*db, wishlists).await?)).into_response())
}

async fn create_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateWishlist>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let customer = carts::customer_for(&txn, claims.user_id).await?;

    let mut product_ids: Vec<i32> = product::Entity::find()
        .select_only()
        .column(product::Column::Id)
        .filter(product::Column::Id.is_in(payload.products))
        .into_tuple()
        .all(&txn)
        .await?;
    if product_ids.is_empty() {
        return Err(ApiError::bad_request("No valid products found."));
    }
    product_ids.sort_unstable();
    product_ids.dedup();

    let name = payload
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "My wishlist".to_owned());

    let wishlist = wishlist::ActiveModel {
        name: Set(name),
        description: Set(payload.description.unwrap_or_default()),
        created_at: Set(Utc::now()),
        customer_id: Set(Some(customer.id)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    wishlist_product::Entity::insert_many(product_ids.iter().map(|product_id| {
        wishlist_product::ActiveModel {
            wishlist_id: Set(wishlist.id),
            product_id: Set(*product_id),
        }
    }))
    .exec(&txn)
    .await?;

    let mut response = wishlist_responses(&txn, vec![wishlist]).await?;
    txn.commit().await?;

    info!(customer_id = customer.id, products = product_ids.len(), "Created wishlist");
    Ok((StatusCode::CREATED, Json(response.pop())).into_response())
}

async fn delete_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let customer = carts::customer_for(&*db, claims.user_id).await?;

    let wishlist = wishlist::Entity::find_by_id(id)
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Wishlist not found"))?;
    wishlist.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Wishlists of `user_id`, which must be the caller.
async fn user_wishlists(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i32>,
) -> ApiResult {
    if user_id != claims.user_id {
        return Err(ApiError::Forbidden(
            "You can only view your own wishlists.".to_owned(),
        ));
    }

    let customer = carts::customer_for(&*db, claims.user_id).await?;
    let wishlists = wishlist::Entity::find()
        .filter(wishlist::Column::CustomerId.eq(customer.id))
        .order_by_desc(wishlist::Column::CreatedAt)
        .all(&*db)
        .await?;
    if wishlists.is_empty() {
        return Err(ApiError::not_found("No wishlists found for this user."));
    }

    Ok((StatusCode::OK, Json(wishlist_responses(&*db, wishlists).await?)).into_response())
}

#[derive(Deserialize)]
struct CreateWishlist {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    products: Vec<i32>,
}
