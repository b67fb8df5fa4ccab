use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::entities::{shop, user};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

pub fn admin_shop_router() -> Router {
    Router::new()
        .route("/shops", get(list_shops).post(create_shop))
        .route(
            "/shops/:id",
            get(get_shop).patch(patch_shop).delete(delete_shop),
        )
}

async fn list_shops(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let shops = actor
        .visible_shops()
        .apply(shop::Entity::find(), shop::Column::Id)
        .order_by_asc(shop::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(shops)).into_response())
}

async fn get_shop(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    if !actor.visible_shops().contains(Some(id)) {
        return Err(ApiError::not_found("Shop not found"));
    }

    let shop = shop::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop not found"))?;

    Ok((StatusCode::OK, Json(shop)).into_response())
}

/// Superuser only. The owner becomes staff so they can reach this API.
async fn create_shop(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateShop>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    actor.require_superuser()?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Shop name is required"));
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let owner = user::Entity::find_by_id(payload.owner_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("User {} not found", payload.owner_id)))?;
    if !owner.is_staff {
        let mut owner: user::ActiveModel = owner.into();
        owner.is_staff = Set(true);
        owner.update(&txn).await?;
    }

    let shop = shop::ActiveModel {
        name: Set(payload.name.trim().to_owned()),
        address: Set(payload.address.unwrap_or_default()),
        owner_id: Set(payload.owner_id),
        contact_email: Set(payload.contact_email.unwrap_or_default()),
        contact_phone: Set(payload.contact_phone.unwrap_or_default()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(shop_id = shop.id, owner_id = shop.owner_id, "Created shop");
    Ok((StatusCode::CREATED, Json(shop)).into_response())
}

async fn patch_shop(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchShop>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    if !actor.is_owner_of(id) {
        return Err(ApiError::forbidden());
    }

    let shop = shop::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop not found"))?;

    let mut shop: shop::ActiveModel = shop.into();
    if let Some(name) = payload.name {
        shop.name = Set(name);
    }
    if let Some(address) = payload.address {
        shop.address = Set(address);
    }
    if let Some(contact_email) = payload.contact_email {
        shop.contact_email = Set(contact_email);
    }
    if let Some(contact_phone) = payload.contact_phone {
        shop.contact_phone = Set(contact_phone);
    }
    if let Some(owner_id) = payload.owner_id {
        actor.require_superuser()?;
        shop.owner_id = Set(owner_id);
    }
    let shop = shop.update(&*db).await?;

    Ok((StatusCode::OK, Json(shop)).into_response())
}

async fn delete_shop(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    if !actor.is_owner_of(id) {
        return Err(ApiError::forbidden());
    }

    let shop = shop::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop not found"))?;
    shop.delete(&*db).await?;

    info!(shop_id = id, "Deleted shop");
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct CreateShop {
    name: String,
    address: Option<String>,
    owner_id: i32,
    contact_email: Option<String>,
    contact_phone: Option<String>,
}

#[derive(Deserialize)]
struct PatchShop {
    name: Option<String>,
    address: Option<String>,
    owner_id: Option<i32>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
}
