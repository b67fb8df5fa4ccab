use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::responses::{color_image_responses, product_response, product_responses};
use crate::entities::{
    color, product, product_color, product_color_image, product_color_size,
    role_permission::Permission,
};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::{access::Actor, stock};

pub fn admin_product_router() -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).patch(patch_product).delete(delete_product),
        )
        .route(
            "/products/:id/colors",
            get(get_product_colors).put(set_product_colors),
        )
        .route(
            "/products/:id/color-images",
            get(list_color_images).post(create_color_image),
        )
        .route(
            "/color-images/:id",
            get(get_color_image)
                .patch(patch_color_image)
                .delete(delete_color_image),
        )
        .route(
            "/color-images/:id/sizes",
            get(list_color_sizes).post(create_color_size),
        )
        .route(
            "/color-sizes/:id",
            patch(patch_color_size).delete(delete_color_size),
        )
}

/// Loads a product the actor may manage. Products outside the actor's
/// shops read as missing.
async fn managed_product<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<product::Model, ApiError> {
    let scope = actor.scope(Permission::ManageProducts)?;
    scope
        .apply(product::Entity::find_by_id(id), product::Column::CreatedByShopId)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))
}

async fn managed_color_image<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<(product::Model, product_color_image::Model), ApiError> {
    let color_image = product_color_image::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Color image not found"))?;
    let product = managed_product(db, actor, color_image.product_id)
        .await
        .map_err(|_| ApiError::not_found("Color image not found"))?;
    Ok((product, color_image))
}

fn check_pricing(price: Option<Decimal>, discount: Option<Decimal>) -> Result<(), ApiError> {
    if price.is_some_and(|price| price.is_sign_negative()) {
        return Err(ApiError::bad_request("Price cannot be negative"));
    }
    if discount.is_some_and(|discount| discount < Decimal::ZERO || discount > Decimal::ONE_HUNDRED) {
        return Err(ApiError::bad_request("Discount must be between 0 and 100"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::bad_request("Stock cannot be negative"));
    }
    Ok(())
}

async fn list_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let products = actor
        .scope(Permission::ManageProducts)?
        .apply(product::Entity::find(), product::Column::CreatedByShopId)
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(product_responses(&*db, products).await?)).into_response())
}

async fn get_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let product = managed_product(&*db, &actor, id).await?;

    Ok((StatusCode::OK, Json(product_response(&*db, product).await?)).into_response())
}

/// New products of non-superusers always land in their own shop.
async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let shop_id = if actor.is_superuser() {
        payload.created_by_shop_id
    } else {
        Some(actor.home_shop(Permission::ManageProducts)?)
    };

    let name = payload
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Name is required"))?;
    let price = payload
        .price
        .ok_or_else(|| ApiError::bad_request("Price is required"))?;
    check_pricing(Some(price), payload.discount)?;

    let product = product::ActiveModel {
        name: Set(name),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(price),
        make_by: Set(payload.make_by.unwrap_or_default()),
        rating: Set(Decimal::ZERO),
        discount: Set(payload.discount.unwrap_or(Decimal::ZERO)),
        stock: Set(0),
        category_id: Set(payload.category_id),
        brand_id: Set(payload.brand_id),
        device_model_id: Set(payload.device_model_id),
        created_by_shop_id: Set(shop_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    info!(product_id = product.id, shop_id = ?shop_id, "Created product");
    Ok((StatusCode::CREATED, Json(product_response(&*db, product).await?)).into_response())
}

async fn patch_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductPayload>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let product = managed_product(&*db, &actor, id).await?;
    check_pricing(payload.price, payload.discount)?;
    if payload.created_by_shop_id.is_some() {
        actor.require_superuser()?;
    }

    let mut product: product::ActiveModel = product.into();
    if let Some(name) = payload.name {
        product.name = Set(name);
    }
    if let Some(description) = payload.description {
        product.description = Set(description);
    }
    if let Some(price) = payload.price {
        product.price = Set(price);
    }
    if let Some(make_by) = payload.make_by {
        product.make_by = Set(make_by);
    }
    if let Some(discount) = payload.discount {
        product.discount = Set(discount);
    }
    if let Some(category_id) = payload.category_id {
        product.category_id = Set(Some(category_id));
    }
    if let Some(brand_id) = payload.brand_id {
        product.brand_id = Set(Some(brand_id));
    }
    if let Some(device_model_id) = payload.device_model_id {
        product.device_model_id = Set(Some(device_model_id));
    }
    if let Some(shop_id) = payload.created_by_shop_id {
        product.created_by_shop_id = Set(Some(shop_id));
    }
    let product = product.update(&*db).await?;

    Ok((StatusCode::OK, Json(product_response(&*db, product).await?)).into_response())
}

async fn delete_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let product = managed_product(&*db, &actor, id).await?;
    product.delete(&*db).await?;

    info!(product_id = id, "Deleted product");
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn get_product_colors(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let product = managed_product(&*db, &actor, id).await?;

    let color_ids: Vec<i32> = product_color::Entity::find()
        .select_only()
        .column(product_color::Column::ColorId)
        .filter(product_color::Column::ProductId.eq(product.id))
        .into_tuple()
        .all(&*db)
        .await?;
    let colors = color::Entity::find()
        .filter(color::Column::Id.is_in(color_ids))
        .order_by_asc(color::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(colors)).into_response())
}

/// Replaces the set of colors a product is offered in.
async fn set_product_colors(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductColors>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let product = managed_product(&txn, &actor, id).await?;

    let mut color_ids = payload.color_ids;
    color_ids.sort_unstable();
    color_ids.dedup();

    let colors = color::Entity::find()
        .filter(color::Column::Id.is_in(color_ids.clone()))
        .order_by_asc(color::Column::Id)
        .all(&txn)
        .await?;
    if colors.len() != color_ids.len() {
        return Err(ApiError::bad_request("Unknown color id"));
    }

    product_color::Entity::delete_many()
        .filter(product_color::Column::ProductId.eq(product.id))
        .exec(&txn)
        .await?;
    if !colors.is_empty() {
        product_color::Entity::insert_many(colors.iter().map(|color| product_color::ActiveModel {
            product_id: Set(product.id),
            color_id: Set(color.id),
        }))
        .exec(&txn)
        .await?;
    }
    txn.commit().await?;

    Ok((StatusCode::OK, Json(colors)).into_response())
}

async fn list_color_images(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let product = managed_product(&*db, &actor, id).await?;

    let color_images = product_color_image::Entity::find()
        .filter(product_color_image::Column::ProductId.eq(product.id))
        .order_by_asc(product_color_image::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(color_image_responses(&*db, color_images).await?)).into_response())
}

async fn create_color_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<CreateColorImage>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let stock_value = payload.stock.unwrap_or(0);
    check_stock(stock_value)?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let product = managed_product(&txn, &actor, id).await?;
    let color_image = product_color_image::ActiveModel {
        product_id: Set(product.id),
        color_id: Set(payload.color_id),
        image_id: Set(payload.image_id),
        stock: Set(stock_value),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_color(&txn, product.id, payload.color_id).await?;
    stock::recompute_product_stock(&txn, product.id).await?;
    let mut response = color_image_responses(&txn, vec![color_image]).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(response.pop())).into_response())
}

/// Records the product/color pair behind a color image when it is missing.
async fn link_color<C: ConnectionTrait>(db: &C, product_id: i32, color_id: i32) -> Result<(), DbErr> {
    let linked = product_color::Entity::find_by_id((product_id, color_id))
        .one(db)
        .await?
        .is_some();
    if !linked {
        product_color::ActiveModel {
            product_id: Set(product_id),
            color_id: Set(color_id),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

async fn get_color_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let (_, color_image) = managed_color_image(&*db, &actor, id).await?;

    let mut response = color_image_responses(&*db, vec![color_image]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

/// Stock is only writable here while the color image has no size rows;
/// otherwise it is the sum of the sizes.
async fn patch_color_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchColorImage>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let (product, color_image) = managed_color_image(&txn, &actor, id).await?;

    if let Some(value) = payload.stock {
        check_stock(value)?;
        let sized = product_color_size::Entity::find()
            .filter(product_color_size::Column::ProductColorImageId.eq(color_image.id))
            .count(&txn)
            .await?
            > 0;
        if sized {
            return Err(ApiError::bad_request(
                "Stock of a color with sizes is the sum of its sizes; edit the sizes instead.",
            ));
        }
    }

    let mut update: product_color_image::ActiveModel = color_image.into();
    if let Some(value) = payload.stock {
        update.stock = Set(value);
    }
    if let Some(image_id) = payload.image_id {
        update.image_id = Set(Some(image_id));
    }
    if let Some(color_id) = payload.color_id {
        update.color_id = Set(color_id);
    }
    let color_image = update.update(&txn).await?;
    if payload.color_id.is_some() {
        link_color(&txn, product.id, color_image.color_id).await?;
    }

    stock::recompute_product_stock(&txn, product.id).await?;
    let mut response = color_image_responses(&txn, vec![color_image]).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn delete_color_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let (product, color_image) = managed_color_image(&txn, &actor, id).await?;
    product_color_size::Entity::delete_many()
        .filter(product_color_size::Column::ProductColorImageId.eq(color_image.id))
        .exec(&txn)
        .await?;
    color_image.delete(&txn).await?;
    stock::recompute_product_stock(&txn, product.id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn list_color_sizes(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let (_, color_image) = managed_color_image(&*db, &actor, id).await?;

    let sizes = product_color_size::Entity::find()
        .filter(product_color_size::Column::ProductColorImageId.eq(color_image.id))
        .order_by_asc(product_color_size::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(sizes)).into_response())
}

async fn create_color_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<CreateColorSize>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    check_stock(payload.stock)?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let (_, color_image) = managed_color_image(&txn, &actor, id).await?;
    let entry = product_color_size::ActiveModel {
        product_color_image_id: Set(color_image.id),
        size_id: Set(payload.size_id),
        stock: Set(payload.stock),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    stock::sync_after_size_change(&txn, color_image.id).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

async fn managed_color_size<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<product_color_size::Model, ApiError> {
    let entry = product_color_size::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Size entry not found"))?;
    managed_color_image(db, actor, entry.product_color_image_id)
        .await
        .map_err(|_| ApiError::not_found("Size entry not found"))?;
    Ok(entry)
}

async fn patch_color_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchColorSize>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let entry = managed_color_size(&txn, &actor, id).await?;
    let color_image_id = entry.product_color_image_id;

    let mut update: product_color_size::ActiveModel = entry.into();
    if let Some(value) = payload.stock {
        check_stock(value)?;
        update.stock = Set(value);
    }
    if let Some(size_id) = payload.size_id {
        update.size_id = Set(size_id);
    }
    let entry = update.update(&txn).await?;

    stock::sync_after_size_change(&txn, color_image_id).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(entry)).into_response())
}

async fn delete_color_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let entry = managed_color_size(&txn, &actor, id).await?;
    let color_image_id = entry.product_color_image_id;
    entry.delete(&txn).await?;

    stock::sync_after_size_change(&txn, color_image_id).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct ProductPayload {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    make_by: Option<String>,
    discount: Option<Decimal>,
    category_id: Option<i32>,
    brand_id: Option<i32>,
    device_model_id: Option<i32>,
    created_by_shop_id: Option<i32>,
}

#[derive(Deserialize)]
struct ProductColors {
    #[serde(default)]
    color_ids: Vec<i32>,
}

#[derive(Deserialize)]
struct CreateColorImage {
    color_id: i32,
    image_id: Option<i32>,
    stock: Option<i32>,
}

#[derive(Deserialize)]
struct PatchColorImage {
    color_id: Option<i32>,
    image_id: Option<i32>,
    stock: Option<i32>,
}

#[derive(Deserialize)]
struct CreateColorSize {
    size_id: i32,
    #[serde(default)]
    stock: i32,
}

#[derive(Deserialize)]
struct PatchColorSize {
    size_id: Option<i32>,
    stock: Option<i32>,
}
