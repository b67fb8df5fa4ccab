use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set, TryIntoModel,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::public::content::banner_responses;
use crate::entities::{about_page, banner, banner_image, blog, logo, partner};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

/// Storefront content: banners, logo, blogs, partners, about page.
/// Superuser only.
pub fn admin_content_router() -> Router {
    Router::new()
        .route("/banners", get(list_banners).post(create_banner))
        .route("/banners/:id", patch(patch_banner).delete(delete_banner))
        .route("/banners/:id/images", post(add_banner_image))
        .route(
            "/banner-images/:id",
            patch(patch_banner_image).delete(delete_banner_image),
        )
        .route("/logo", get(list_logos).post(create_logo))
        .route("/logo/:id", delete(delete_logo))
        .route("/blogs", get(list_blogs).post(create_blog))
        .route("/blogs/:id", patch(patch_blog).delete(delete_blog))
        .route("/partners", get(list_partners).post(create_partner))
        .route("/partners/:id", patch(patch_partner).delete(delete_partner))
        .route("/about", get(get_about).put(put_about))
}

async fn superuser(db: &DatabaseConnection, claims: &Claims) -> Result<(), ApiError> {
    Actor::load(db, claims.user_id).await?.require_superuser()
}

// banners

async fn list_banners(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let banners = banner::Entity::find()
        .order_by_asc(banner::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(banner_responses(&*db, banners).await?)).into_response())
}

async fn create_banner(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BannerPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let now = Utc::now();
    let banner = banner::ActiveModel {
        title: Set(payload.title),
        description: Set(payload.description),
        link: Set(payload.link),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    let mut response = banner_responses(&*db, vec![banner]).await?;
    Ok((StatusCode::CREATED, Json(response.pop())).into_response())
}

async fn patch_banner(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<BannerPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let banner = banner::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner not found"))?;

    let mut banner: banner::ActiveModel = banner.into();
    if let Some(title) = payload.title {
        banner.title = Set(Some(title));
    }
    if let Some(description) = payload.description {
        banner.description = Set(Some(description));
    }
    if let Some(link) = payload.link {
        banner.link = Set(Some(link));
    }
    banner.updated_at = Set(Utc::now());
    let banner = banner.update(&*db).await?;

    let mut response = banner_responses(&*db, vec![banner]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn delete_banner(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let banner = banner::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner not found"))?;
    banner.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn add_banner_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<BannerImagePayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let image_id = payload
        .image_id
        .ok_or_else(|| ApiError::bad_request("image_id is required"))?;
    let banner = banner::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner not found"))?;

    let image = banner_image::ActiveModel {
        banner_id: Set(banner.id),
        image_id: Set(image_id),
        sort_order: Set(payload.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(image)).into_response())
}

async fn patch_banner_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<BannerImagePayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let image = banner_image::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner image not found"))?;

    let mut image: banner_image::ActiveModel = image.into();
    if let Some(image_id) = payload.image_id {
        image.image_id = Set(image_id);
    }
    if let Some(order) = payload.order {
        image.sort_order = Set(order);
    }
    let image = image.update(&*db).await?;

    Ok((StatusCode::OK, Json(image)).into_response())
}

async fn delete_banner_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let image = banner_image::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner image not found"))?;
    image.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// logo

async fn list_logos(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let logos = logo::Entity::find()
        .order_by_desc(logo::Column::UpdatedAt)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(logos)).into_response())
}

async fn create_logo(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<LogoPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let logo = logo::ActiveModel {
        name: Set(payload.name.unwrap_or_else(|| "Logo".to_owned())),
        image_id: Set(payload.image_id),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(logo)).into_response())
}

async fn delete_logo(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let logo = logo::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Logo not found"))?;
    logo.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// blogs

async fn list_blogs(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let blogs = blog::Entity::find()
        .order_by_asc(blog::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(blogs)).into_response())
}

async fn create_blog(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<BlogPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let (Some(title), Some(image_id)) = (payload.title, payload.image_id) else {
        return Err(ApiError::bad_request("title and image_id are required"));
    };
    let blog = blog::ActiveModel {
        title: Set(title),
        image_id: Set(image_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(blog)).into_response())
}

async fn patch_blog(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<BlogPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let blog = blog::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;

    let mut blog: blog::ActiveModel = blog.into();
    if let Some(title) = payload.title {
        blog.title = Set(title);
    }
    if let Some(image_id) = payload.image_id {
        blog.image_id = Set(image_id);
    }
    let blog = blog.update(&*db).await?;

    Ok((StatusCode::OK, Json(blog)).into_response())
}

async fn delete_blog(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let blog = blog::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Blog not found"))?;
    blog.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// partners

async fn list_partners(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let partners = partner::Entity::find()
        .order_by_asc(partner::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(partners)).into_response())
}

async fn create_partner(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PartnerPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let (Some(name), Some(logo_image_id)) = (payload.name, payload.logo_image_id) else {
        return Err(ApiError::bad_request("name and logo_image_id are required"));
    };
    let partner = partner::ActiveModel {
        name: Set(name),
        logo_image_id: Set(logo_image_id),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((StatusCode::CREATED, Json(partner)).into_response())
}

async fn patch_partner(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PartnerPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let partner = partner::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner not found"))?;

    let mut partner: partner::ActiveModel = partner.into();
    if let Some(name) = payload.name {
        partner.name = Set(name);
    }
    if let Some(logo_image_id) = payload.logo_image_id {
        partner.logo_image_id = Set(logo_image_id);
    }
    let partner = partner.update(&*db).await?;

    Ok((StatusCode::OK, Json(partner)).into_response())
}

async fn delete_partner(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let partner = partner::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner not found"))?;
    partner.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

// about page

async fn get_about(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let about = about_page::Entity::find()
        .order_by_desc(about_page::Column::Id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("About page content not found"))?;

    Ok((StatusCode::OK, Json(about)).into_response())
}

/// Writes the single about page row, creating it on first use.
async fn put_about(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AboutPayload>,
) -> ApiResult {
    superuser(&db, &claims).await?;

    let existing = about_page::Entity::find()
        .order_by_desc(about_page::Column::Id)
        .one(&*db)
        .await?;

    let (status, mut about): (StatusCode, about_page::ActiveModel) = match existing {
        Some(about) => (StatusCode::OK, about.into()),
        None => (StatusCode::CREATED, Default::default()),
    };
    about.image_id = Set(payload.image_id);
    about.title = Set(payload.title);
    about.description = Set(payload.description);
    about.history_title = Set(payload.history_title);
    about.history_description = Set(payload.history_description);
    about.customers_title = Set(payload.customers_title);
    about.customers_map_image_id = Set(payload.customers_map_image_id);
    let about = about.save(&*db).await?.try_into_model()?;

    Ok((status, Json(about)).into_response())
}

#[derive(Deserialize)]
struct BannerPayload {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
}

#[derive(Deserialize)]
struct BannerImagePayload {
    image_id: Option<i32>,
    order: Option<i32>,
}

#[derive(Deserialize)]
struct LogoPayload {
    name: Option<String>,
    image_id: i32,
}

#[derive(Deserialize)]
struct BlogPayload {
    title: Option<String>,
    image_id: Option<i32>,
}

#[derive(Deserialize)]
struct PartnerPayload {
    name: Option<String>,
    logo_image_id: Option<i32>,
}

#[derive(Deserialize)]
struct AboutPayload {
    image_id: Option<i32>,
    title: String,
    description: String,
    history_title: String,
    history_description: String,
    customers_title: String,
    customers_map_image_id: Option<i32>,
}
