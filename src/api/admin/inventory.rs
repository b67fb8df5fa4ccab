use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::entities::{product, role_permission::Permission, shop_inventory};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

pub fn admin_inventory_router() -> Router {
    Router::new()
        .route("/inventory", get(list_inventory).post(create_listing))
        .route(
            "/inventory/:id",
            get(get_listing).patch(patch_listing).delete(delete_listing),
        )
}

#[derive(Serialize)]
struct ListingResponse {
    #[serde(flatten)]
    listing: shop_inventory::Model,
    product_name: String,
    effective_price: Decimal,
    effective_discount: Decimal,
    final_price: Decimal,
    effective_stock: i32,
}

impl ListingResponse {
    fn new(listing: shop_inventory::Model, product: &product::Model) -> Self {
        ListingResponse {
            product_name: product.name.clone(),
            effective_price: listing.price(product),
            effective_discount: listing.discount(product),
            final_price: listing.final_price(product),
            effective_stock: listing.stock(product),
            listing,
        }
    }
}

async fn listing_response<C: ConnectionTrait>(
    db: &C,
    listing: shop_inventory::Model,
) -> Result<ListingResponse, ApiError> {
    let product = product::Entity::find_by_id(listing.product_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;
    Ok(ListingResponse::new(listing, &product))
}

async fn managed_listing<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<shop_inventory::Model, ApiError> {
    actor
        .scope(Permission::ManageInventory)?
        .apply(shop_inventory::Entity::find_by_id(id), shop_inventory::Column::ShopId)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Inventory entry not found"))
}

fn check_overrides(
    price: Option<Decimal>,
    discount: Option<Decimal>,
    stock: Option<i32>,
) -> Result<(), ApiError> {
    if price.is_some_and(|price| price.is_sign_negative()) {
        return Err(ApiError::bad_request("Price cannot be negative"));
    }
    if discount.is_some_and(|discount| discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED) {
        return Err(ApiError::bad_request("Discount must be between 0 and 100"));
    }
    if stock.is_some_and(|stock| stock < 0) {
        return Err(ApiError::bad_request("Stock cannot be negative"));
    }
    Ok(())
}

async fn list_inventory(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let listings = actor
        .scope(Permission::ManageInventory)?
        .apply(shop_inventory::Entity::find(), shop_inventory::Column::ShopId)
        .order_by_asc(shop_inventory::Column::Id)
        .find_also_related(product::Entity)
        .all(&*db)
        .await?;

    let response: Vec<ListingResponse> = listings
        .into_iter()
        .filter_map(|(listing, product)| product.map(|product| ListingResponse::new(listing, &product)))
        .collect();

    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn get_listing(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let listing = managed_listing(&*db, &actor, id).await?;

    Ok((StatusCode::OK, Json(listing_response(&*db, listing).await?)).into_response())
}

/// Non-superusers may only list products their own shop created.
async fn create_listing(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateListing>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let shop_id = match payload.shop_id {
        Some(shop_id) => shop_id,
        None => actor.home_shop(Permission::ManageInventory)?,
    };
    actor.require(Some(shop_id), Permission::ManageInventory)?;
    check_overrides(payload.custom_price, payload.custom_discount, payload.custom_stock)?;

    let product = product::Entity::find_by_id(payload.product_id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Product {} not found", payload.product_id)))?;
    if !actor.is_superuser() && product.created_by_shop_id != Some(shop_id) {
        return Err(ApiError::bad_request(
            "You can only add products created by your shop.",
        ));
    }

    let listing = shop_inventory::ActiveModel {
        shop_id: Set(shop_id),
        product_id: Set(product.id),
        custom_price: Set(payload.custom_price),
        custom_discount: Set(payload.custom_discount),
        custom_stock: Set(payload.custom_stock),
        available: Set(payload.available.unwrap_or(true)),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(ListingResponse::new(listing, &product))).into_response())
}

async fn patch_listing(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchListing>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let listing = managed_listing(&*db, &actor, id).await?;
    check_overrides(payload.custom_price, payload.custom_discount, payload.custom_stock)?;

    let mut update: shop_inventory::ActiveModel = listing.into();
    if let Some(custom_price) = payload.custom_price {
        update.custom_price = Set(Some(custom_price));
    }
    if let Some(custom_discount) = payload.custom_discount {
        update.custom_discount = Set(Some(custom_discount));
    }
    if let Some(custom_stock) = payload.custom_stock {
        update.custom_stock = Set(Some(custom_stock));
    }
    if let Some(available) = payload.available {
        update.available = Set(available);
    }
    let listing = update.update(&*db).await?;

    Ok((StatusCode::OK, Json(listing_response(&*db, listing).await?)).into_response())
}

async fn delete_listing(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let listing = managed_listing(&*db, &actor, id).await?;
    listing.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct CreateListing {
    shop_id: Option<i32>,
    product_id: i32,
    custom_price: Option<Decimal>,
    custom_discount: Option<Decimal>,
    custom_stock: Option<i32>,
    available: Option<bool>,
}

#[derive(Deserialize)]
struct PatchListing {
    custom_price: Option<Decimal>,
    custom_discount: Option<Decimal>,
    custom_stock: Option<i32>,
    available: Option<bool>,
}
