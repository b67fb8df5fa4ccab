use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Extension, Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::api::public::uploads::stored_path;
use crate::api::validation::FILE_NAME_REGEX;
use crate::config::Config;
use crate::entities::image::{self, FileExtension};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

const FILE_NAME_MESSAGE: &str =
    "Invalid file name. It should contain only Latin letters, numbers, '-', or '_'.";

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 16 * 1024;

pub fn upload_router(file_size_limit: usize) -> Router {
    Router::new()
        .route("/image", post(upload).get(get_images))
        .route("/image/:id", patch(patch_image).delete(delete_image))
        .layer(DefaultBodyLimit::max(file_size_limit + MULTIPART_OVERHEAD))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Payload too large".to_owned())
    } else {
        ApiError::bad_request(err.body_text())
    }
}

fn extension_for(content_type: Option<&str>, file_name: Option<&str>) -> Option<FileExtension> {
    match content_type {
        Some("image/jpeg") => Some(FileExtension::Jpg),
        Some("image/png") => Some(FileExtension::Png),
        _ => file_name
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| ext.parse().ok()),
    }
}

/// Stores the first multipart field as an image. The field name becomes
/// the image's file name.
async fn upload(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?;

    let field = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
        .ok_or_else(|| ApiError::bad_request("No file was sent."))?;

    let extension = extension_for(field.content_type(), field.file_name())
        .ok_or_else(|| ApiError::bad_request("Unsupported content type."))?;

    let file_name = field
        .name()
        .map(str::to_owned)
        .ok_or_else(|| ApiError::bad_request("File name is not set."))?;
    if !FILE_NAME_REGEX.is_match(&file_name) {
        return Err(ApiError::bad_request(FILE_NAME_MESSAGE));
    }

    let data = field.bytes().await.map_err(multipart_error)?;
    if data.len() > config.file_size_limit {
        return Err(ApiError::PayloadTooLarge("Payload too large".to_owned()));
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let image = image::ActiveModel {
        file_name: Set(file_name),
        path_name: Set(Uuid::new_v4().to_string()),
        extension: Set(extension),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let path = stored_path(&config, &image);
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to create upload dir: {err}")))?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(|err| ApiError::Internal(format!("Failed to write {}: {err}", path.display())))?;

    txn.commit().await?;

    info!(image_id = image.id, bytes = data.len(), "Uploaded image");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "File uploaded successfully.",
            "id": image.id,
            "url": image.url()
        })),
    )
        .into_response())
}

/// `?query=` matches file names, or an exact id when numeric.
async fn get_images(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ImagesQuery>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?;

    let mut select = image::Entity::find().order_by_asc(image::Column::Id);
    if let Some(query) = query.query.filter(|q| !q.trim().is_empty()) {
        let mut condition = Condition::any().add(image::Column::FileName.contains(query.trim()));
        if let Ok(id) = query.trim().parse::<i32>() {
            condition = condition.add(image::Column::Id.eq(id));
        }
        select = select.filter(condition);
    }
    let images = select.all(&*db).await?;

    Ok((StatusCode::OK, Json(images)).into_response())
}

async fn patch_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchImagePayload>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?;
    payload
        .validate()
        .map_err(|_| ApiError::ValidationFail(FILE_NAME_MESSAGE.to_owned()))?;

    let image = image::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No image with {id} id was found.")))?;

    let mut image: image::ActiveModel = image.into();
    image.file_name = Set(payload.file_name);
    let image = image.update(&*db).await?;

    Ok((StatusCode::OK, Json(image)).into_response())
}

async fn delete_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    Actor::load(&*db, claims.user_id).await?;

    let image = image::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No image with {id} id was found.")))?;

    let path = stored_path(&config, &image);
    image.delete(&*db).await?;
    if let Err(err) = tokio::fs::remove_file(&path).await {
        warn!(image_id = id, path = %path.display(), error = %err, "Stored file already gone");
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize, Validate)]
struct PatchImagePayload {
    #[validate(regex(path = *FILE_NAME_REGEX))]
    file_name: String,
}

#[derive(Deserialize)]
struct ImagesQuery {
    query: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_decides_extension() {
        assert_eq!(extension_for(Some("image/png"), Some("a.jpg")), Some(FileExtension::Png));
        assert_eq!(extension_for(Some("image/jpeg"), None), Some(FileExtension::Jpg));
    }

    #[test]
    fn falls_back_to_file_name_extension() {
        assert_eq!(
            extension_for(Some("application/octet-stream"), Some("photo.JPEG")),
            Some(FileExtension::Jpg)
        );
        assert_eq!(extension_for(Some("image/gif"), Some("anim.gif")), None);
    }
}
