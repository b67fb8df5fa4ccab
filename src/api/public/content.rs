use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{about_page, banner, banner_image, blog, image::image_url, logo, partner};
use crate::middleware::logging::{ApiError, ApiResult};

pub fn content_router() -> Router {
    Router::new()
        .route("/banners", get(get_banners))
        .route("/banners/:id", get(get_banner))
        .route("/logo", get(get_logo))
        .route("/about", get(get_about))
}

#[derive(Serialize)]
pub struct BannerImageResponse {
    pub id: i32,
    pub image: String,
    pub order: i32,
}

#[derive(Serialize)]
pub struct BannerResponse {
    pub id: i32,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<BannerImageResponse>,
}

pub async fn banner_responses<C: ConnectionTrait>(
    db: &C,
    banners: Vec<banner::Model>,
) -> Result<Vec<BannerResponse>, DbErr> {
    let ids: Vec<i32> = banners.iter().map(|b| b.id).collect();
    let mut images: HashMap<i32, Vec<BannerImageResponse>> = HashMap::new();
    for image in banner_image::Entity::find()
        .filter(banner_image::Column::BannerId.is_in(ids))
        .order_by_asc(banner_image::Column::SortOrder)
        .order_by_asc(banner_image::Column::Id)
        .all(db)
        .await?
    {
        images.entry(image.banner_id).or_default().push(BannerImageResponse {
            id: image.id,
            image: image_url(image.image_id),
            order: image.sort_order,
        });
    }

    Ok(banners
        .into_iter()
        .map(|banner| BannerResponse {
            images: images.remove(&banner.id).unwrap_or_default(),
            id: banner.id,
            title: banner.title,
            description: banner.description,
            link: banner.link,
            created_at: banner.created_at,
            updated_at: banner.updated_at,
        })
        .collect())
}

async fn get_banners(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let banners = banner::Entity::find()
        .order_by_asc(banner::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(banner_responses(&*db, banners).await?)).into_response())
}

async fn get_banner(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let banner = banner::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner not found"))?;

    let mut response = banner_responses(&*db, vec![banner]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

/// The most recently updated logo.
async fn get_logo(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let logo = logo::Entity::find()
        .order_by_desc(logo::Column::UpdatedAt)
        .order_by_desc(logo::Column::Id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Logo not found"))?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "id": logo.id,
            "name": logo.name,
            "image_url": image_url(logo.image_id)
        })),
    )
        .into_response())
}

async fn get_about(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let about = about_page::Entity::find()
        .order_by_desc(about_page::Column::Id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("About page content not found"))?;

    let blogs: Vec<_> = blog::Entity::find()
        .order_by_asc(blog::Column::Id)
        .all(&*db)
        .await?
        .into_iter()
        .map(|blog| json!({ "id": blog.id, "title": blog.title, "image_url": image_url(blog.image_id) }))
        .collect();

    let partners: Vec<_> = partner::Entity::find()
        .order_by_asc(partner::Column::Id)
        .all(&*db)
        .await?
        .into_iter()
        .map(|partner| {
            json!({ "id": partner.id, "name": partner.name, "logo_url": image_url(partner.logo_image_id) })
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "image": about.image_id.map(image_url),
            "title": about.title,
            "description": about.description,
            "history_title": about.history_title,
            "history_description": about.history_description,
            "customers_title": about.customers_title,
            "customers_map_image": about.customers_map_image_id.map(image_url),
            "blogs": blogs,
            "partners": partners
        })),
    )
        .into_response())
}
