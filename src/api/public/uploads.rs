use axum::{
    body::Body,
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::get,
    Router,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::warn;

use crate::config::Config;
use crate::entities::image::{self, Entity as ImageEntity};
use crate::middleware::logging::{ApiError, ApiResult};

pub fn uploads_router() -> Router {
    Router::new().route("/image/:id", get(print_image))
}

pub fn stored_path(config: &Config, image: &image::Model) -> std::path::PathBuf {
    config
        .upload_dir
        .join(format!("{}.{}", image.path_name, image.extension))
}

/// Streams the stored bytes of an uploaded image.
pub async fn print_image(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
) -> ApiResult {
    let image = ImageEntity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Not found"))?;

    let path = stored_path(&config, &image);
    let file = tokio::fs::File::open(&path).await.map_err(|err| {
        warn!(image_id = id, path = %path.display(), error = %err, "Image file missing");
        ApiError::not_found("Not found")
    })?;

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let body = Body::from_stream(ReaderStream::new(file));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("inline"));

    Ok((headers, body).into_response())
}
