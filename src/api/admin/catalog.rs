use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::api::validation::COLOR_CODE_REGEX;
use crate::entities::{
    brand, category, color, device_model, product, product_color_image, product_color_size, size,
};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::{scoped_product_ids, Actor};
use crate::services::stock;

/// Global catalog. Superusers edit it; other staff read only the entries
/// their shops' products use.
pub fn admin_catalog_router() -> Router {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category)
                .patch(patch_category)
                .delete(delete_category),
        )
        .route("/brands", get(list_brands).post(create_brand))
        .route(
            "/brands/:id",
            get(get_brand).patch(patch_brand).delete(delete_brand),
        )
        .route(
            "/device-models",
            get(list_device_models).post(create_device_model),
        )
        .route(
            "/device-models/:id",
            get(get_device_model)
                .patch(patch_device_model)
                .delete(delete_device_model),
        )
        .route("/colors", get(list_colors).post(create_color))
        .route(
            "/colors/:id",
            get(get_color).patch(patch_color).delete(delete_color),
        )
        .route("/sizes", get(list_sizes).post(create_size))
        .route(
            "/sizes/:id",
            get(get_size).patch(patch_size).delete(delete_size),
        )
}

/// Ids of `column` on the products visible to the actor; `None` means no
/// restriction.
async fn referenced<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    column: product::Column,
) -> Result<Option<Vec<i32>>, ApiError> {
    let Some(products) = scoped_product_ids(db, &actor.visible_shops()).await? else {
        return Ok(None);
    };
    let ids: Vec<Option<i32>> = product::Entity::find()
        .select_only()
        .column(column)
        .filter(product::Column::Id.is_in(products))
        .into_tuple()
        .all(db)
        .await?;
    Ok(Some(ids.into_iter().flatten().collect()))
}

async fn referenced_colors<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> Result<Option<Vec<i32>>, ApiError> {
    let Some(products) = scoped_product_ids(db, &actor.visible_shops()).await? else {
        return Ok(None);
    };
    let ids: Vec<i32> = product_color_image::Entity::find()
        .select_only()
        .column(product_color_image::Column::ColorId)
        .filter(product_color_image::Column::ProductId.is_in(products))
        .into_tuple()
        .all(db)
        .await?;
    Ok(Some(ids))
}

async fn referenced_sizes<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> Result<Option<Vec<i32>>, ApiError> {
    let Some(products) = scoped_product_ids(db, &actor.visible_shops()).await? else {
        return Ok(None);
    };
    let color_images: Vec<i32> = product_color_image::Entity::find()
        .select_only()
        .column(product_color_image::Column::Id)
        .filter(product_color_image::Column::ProductId.is_in(products))
        .into_tuple()
        .all(db)
        .await?;
    let ids: Vec<i32> = product_color_size::Entity::find()
        .select_only()
        .column(product_color_size::Column::SizeId)
        .filter(product_color_size::Column::ProductColorImageId.is_in(color_images))
        .into_tuple()
        .all(db)
        .await?;
    Ok(Some(ids))
}

fn restrict<E: EntityTrait>(query: Select<E>, column: E::Column, ids: Option<Vec<i32>>) -> Select<E> {
    match ids {
        Some(ids) => query.filter(column.is_in(ids)),
        None => query,
    }
}

fn required(value: &str, what: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::bad_request(format!("{what} is required")));
    }
    Ok(value.to_owned())
}

// categories

async fn list_categories(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced(&*db, &actor, product::Column::CategoryId).await?;

    let categories = restrict(category::Entity::find(), category::Column::Id, ids)
        .order_by_asc(category::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(categories)).into_response())
}

async fn get_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced(&*db, &actor, product::Column::CategoryId).await?;

    let category = restrict(category::Entity::find_by_id(id), category::Column::Id, ids)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok((StatusCode::OK, Json(category)).into_response())
}

async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let category = category::ActiveModel {
        name: Set(required(payload.name.as_deref().unwrap_or_default(), "Name")?),
        description: Set(payload.description.unwrap_or_default()),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

async fn patch_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let category = category::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    let mut category: category::ActiveModel = category.into();
    if let Some(name) = payload.name {
        category.name = Set(required(&name, "Name")?);
    }
    if let Some(description) = payload.description {
        category.description = Set(description);
    }
    let category = category.update(&*db).await?;

    Ok((StatusCode::OK, Json(category)).into_response())
}

async fn delete_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let category = category::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;
    category.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// brands

async fn list_brands(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced(&*db, &actor, product::Column::BrandId).await?;

    let brands = restrict(brand::Entity::find(), brand::Column::Id, ids)
        .order_by_asc(brand::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(brands)).into_response())
}

async fn get_brand(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced(&*db, &actor, product::Column::BrandId).await?;

    let brand = restrict(brand::Entity::find_by_id(id), brand::Column::Id, ids)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;

    Ok((StatusCode::OK, Json(brand)).into_response())
}

async fn create_brand(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BrandPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let brand = brand::ActiveModel {
        name: Set(required(payload.name.as_deref().unwrap_or_default(), "Name")?),
        description: Set(payload.description.unwrap_or_default()),
        category_id: Set(payload.category_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(brand)).into_response())
}

async fn patch_brand(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<BrandPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let brand = brand::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;

    let mut brand: brand::ActiveModel = brand.into();
    if let Some(name) = payload.name {
        brand.name = Set(required(&name, "Name")?);
    }
    if let Some(description) = payload.description {
        brand.description = Set(description);
    }
    if let Some(category_id) = payload.category_id {
        brand.category_id = Set(Some(category_id));
    }
    let brand = brand.update(&*db).await?;

    Ok((StatusCode::OK, Json(brand)).into_response())
}

async fn delete_brand(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let brand = brand::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Brand not found"))?;
    brand.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// device models

async fn list_device_models(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced(&*db, &actor, product::Column::DeviceModelId).await?;

    let device_models = restrict(device_model::Entity::find(), device_model::Column::Id, ids)
        .order_by_asc(device_model::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(device_models)).into_response())
}

async fn get_device_model(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced(&*db, &actor, product::Column::DeviceModelId).await?;

    let device_model = restrict(
        device_model::Entity::find_by_id(id),
        device_model::Column::Id,
        ids,
    )
    .one(&*db)
    .await?
    .ok_or_else(|| ApiError::not_found("Device model not found"))?;

    Ok((StatusCode::OK, Json(device_model)).into_response())
}

async fn create_device_model(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<DeviceModelPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let brand_id = payload
        .brand_id
        .ok_or_else(|| ApiError::bad_request("brand_id is required"))?;
    let device_model = device_model::ActiveModel {
        name: Set(required(payload.name.as_deref().unwrap_or_default(), "Name")?),
        brand_id: Set(brand_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(device_model)).into_response())
}

async fn patch_device_model(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<DeviceModelPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let device_model = device_model::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Device model not found"))?;

    let mut device_model: device_model::ActiveModel = device_model.into();
    if let Some(name) = payload.name {
        device_model.name = Set(required(&name, "Name")?);
    }
    if let Some(brand_id) = payload.brand_id {
        device_model.brand_id = Set(brand_id);
    }
    let device_model = device_model.update(&*db).await?;

    Ok((StatusCode::OK, Json(device_model)).into_response())
}

async fn delete_device_model(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let device_model = device_model::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Device model not found"))?;
    device_model.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// colors

async fn list_colors(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced_colors(&*db, &actor).await?;

    let colors = restrict(color::Entity::find(), color::Column::Id, ids)
        .order_by_asc(color::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(colors)).into_response())
}

async fn get_color(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced_colors(&*db, &actor).await?;

    let color = restrict(color::Entity::find_by_id(id), color::Column::Id, ids)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Color not found"))?;

    Ok((StatusCode::OK, Json(color)).into_response())
}

async fn create_color(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ColorPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;
    payload
        .validate()
        .map_err(|_| ApiError::ValidationFail("Color code must look like #RRGGBB".to_owned()))?;

    let color = color::ActiveModel {
        color_name: Set(required(payload.color_name.as_deref().unwrap_or_default(), "Color name")?),
        color_code: Set(payload.color_code.unwrap_or_else(|| "#000000".to_owned())),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(color)).into_response())
}

async fn patch_color(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ColorPayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;
    payload
        .validate()
        .map_err(|_| ApiError::ValidationFail("Color code must look like #RRGGBB".to_owned()))?;

    let color = color::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Color not found"))?;

    let mut color: color::ActiveModel = color.into();
    if let Some(color_name) = payload.color_name {
        color.color_name = Set(required(&color_name, "Color name")?);
    }
    if let Some(color_code) = payload.color_code {
        color.color_code = Set(color_code);
    }
    let color = color.update(&*db).await?;

    Ok((StatusCode::OK, Json(color)).into_response())
}

async fn delete_color(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let color = color::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Color not found"))?;

    let color_images = product_color_image::Entity::find()
        .filter(product_color_image::Column::ColorId.eq(color.id))
        .all(&txn)
        .await?;
    let color_image_ids: Vec<i32> = color_images.iter().map(|color_image| color_image.id).collect();
    let mut product_ids: Vec<i32> = color_images
        .iter()
        .map(|color_image| color_image.product_id)
        .collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    product_color_size::Entity::delete_many()
        .filter(product_color_size::Column::ProductColorImageId.is_in(color_image_ids.clone()))
        .exec(&txn)
        .await?;
    product_color_image::Entity::delete_many()
        .filter(product_color_image::Column::Id.is_in(color_image_ids))
        .exec(&txn)
        .await?;
    color.delete(&txn).await?;
    for product_id in product_ids {
        stock::recompute_product_stock(&txn, product_id).await?;
    }
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// sizes

async fn list_sizes(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced_sizes(&*db, &actor).await?;

    let sizes = restrict(size::Entity::find(), size::Column::Id, ids)
        .order_by_asc(size::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(sizes)).into_response())
}

async fn get_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let ids = referenced_sizes(&*db, &actor).await?;

    let size = restrict(size::Entity::find_by_id(id), size::Column::Id, ids)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Size not found"))?;

    Ok((StatusCode::OK, Json(size)).into_response())
}

async fn create_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SizePayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let size = size::ActiveModel {
        name: Set(required(payload.name.as_deref().unwrap_or_default(), "Name")?),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(size)).into_response())
}

async fn patch_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<SizePayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let size = size::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Size not found"))?;

    let mut size: size::ActiveModel = size.into();
    if let Some(name) = payload.name {
        size.name = Set(required(&name, "Name")?);
    }
    let size = size.update(&*db).await?;

    Ok((StatusCode::OK, Json(size)).into_response())
}

async fn delete_size(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?.require_superuser()?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let size = size::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Size not found"))?;

    let mut color_image_ids: Vec<i32> = product_color_size::Entity::find()
        .filter(product_color_size::Column::SizeId.eq(size.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|entry| entry.product_color_image_id)
        .collect();
    color_image_ids.sort_unstable();
    color_image_ids.dedup();

    product_color_size::Entity::delete_many()
        .filter(product_color_size::Column::SizeId.eq(size.id))
        .exec(&txn)
        .await?;
    size.delete(&txn).await?;
    for color_image_id in color_image_ids {
        stock::sync_after_size_change(&txn, color_image_id).await?;
    }
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct CategoryPayload {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct BrandPayload {
    name: Option<String>,
    description: Option<String>,
    category_id: Option<i32>,
}

#[derive(Deserialize)]
struct DeviceModelPayload {
    name: Option<String>,
    brand_id: Option<i32>,
}

#[derive(Deserialize, Validate)]
struct ColorPayload {
    color_name: Option<String>,
    #[validate(regex(path = *COLOR_CODE_REGEX))]
    color_code: Option<String>,
}

#[derive(Deserialize)]
struct SizePayload {
    name: Option<String>,
}
