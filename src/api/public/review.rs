use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::sync::Arc;

use crate::api::responses::review_responses;
use crate::entities::review;
use crate::middleware::logging::{ApiError, ApiResult};

pub fn review_router() -> Router {
    Router::new()
        .route("/reviews", get(get_reviews))
        .route("/reviews/:id", get(get_review))
}

async fn get_reviews(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let reviews = review::Entity::find()
        .order_by_asc(review::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(review_responses(&*db, reviews).await?)).into_response())
}

async fn get_review(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let review = review::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    let mut response = review_responses(&*db, vec![review]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}
