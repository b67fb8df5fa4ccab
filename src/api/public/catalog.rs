use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use std::sync::Arc;

use crate::entities::{brand, category, color, device_model, size};
use crate::middleware::logging::{ApiError, ApiResult};

pub fn catalog_router() -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/:id", get(get_category))
        .route("/brands", get(get_brands))
        .route("/brands/:id", get(get_brand))
        .route("/device-models", get(get_device_models))
        .route("/device-models/:id", get(get_device_model))
        .route("/colors", get(get_colors))
        .route("/colors/by_name/:name", get(get_color_by_name))
        .route("/sizes", get(get_sizes))
}

async fn get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(categories)).into_response())
}

async fn get_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let category = category::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No category with {id} id was found.")))?;

    Ok((StatusCode::OK, Json(category)).into_response())
}

/// `?category=<name>` narrows to brands of that category; an unknown name
/// yields an empty list.
async fn get_brands(
    Query(query): Query<BrandsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let mut select = brand::Entity::find().order_by_asc(brand::Column::Id);

    if let Some(name) = query.category.filter(|name| !name.trim().is_empty()) {
        let found = category::Entity::find()
            .filter(category::Column::Name.eq(name.trim()))
            .one(&*db)
            .await?;
        match found {
            Some(category) => select = select.filter(brand::Column::CategoryId.eq(category.id)),
            None => return Ok((StatusCode::OK, Json(Vec::<brand::Model>::new())).into_response()),
        }
    }

    let brands = select.all(&*db).await?;
    Ok((StatusCode::OK, Json(brands)).into_response())
}

async fn get_brand(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let brand = brand::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No brand with {id} id was found.")))?;

    Ok((StatusCode::OK, Json(brand)).into_response())
}

async fn get_device_models(
    Query(query): Query<DeviceModelsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let mut select = device_model::Entity::find().order_by_asc(device_model::Column::Id);
    if let Some(brand_id) = query.brand_id {
        select = select.filter(device_model::Column::BrandId.eq(brand_id));
    }

    let models = select.all(&*db).await?;
    Ok((StatusCode::OK, Json(models)).into_response())
}

async fn get_device_model(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let model = device_model::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No device model with {id} id was found.")))?;

    Ok((StatusCode::OK, Json(model)).into_response())
}

async fn get_colors(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let colors = color::Entity::find()
        .order_by_asc(color::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(colors)).into_response())
}

async fn get_color_by_name(
    Path(name): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let color = color::Entity::find()
        .filter(color::Column::ColorName.eq(name.as_str()))
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Color not found"))?;

    Ok((StatusCode::OK, Json(color)).into_response())
}

async fn get_sizes(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let sizes = size::Entity::find()
        .order_by_asc(size::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(sizes)).into_response())
}

#[derive(Deserialize)]
struct BrandsQuery {
    category: Option<String>,
}

#[derive(Deserialize)]
struct DeviceModelsQuery {
    brand_id: Option<i32>,
}
