use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::api::responses::ReplyResponse;
use crate::entities::{product, reply, review, review_like};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::rating;

pub fn review_router() -> Router {
    Router::new()
        .route("/product/:id/reviews", post(submit_review))
        .route("/reviews/:id/like", post(like_review))
        .route("/reviews/:id/reply", post(reply_to_review))
}

/// Accepts whole numbers given either as JSON numbers or numeric strings.
fn parse_rating(value: Option<&Value>) -> Option<i32> {
    let rating = match value? {
        Value::Number(number) => number.as_i64()?,
        Value::String(text) => text.trim().parse().ok()?,
        _ => return None,
    };
    (1..=5).contains(&rating).then_some(rating as i32)
}

async fn submit_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(product_id): Path<i32>,
    Json(payload): Json<SubmitReview>,
) -> ApiResult {
    let rating = parse_rating(payload.rating.as_ref())
        .ok_or_else(|| ApiError::bad_request("Rating must be between 1 and 5"))?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let product = product::Entity::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    review::ActiveModel {
        product_id: Set(product.id),
        user_id: Set(claims.user_id),
        rating: Set(rating),
        comment: Set(payload.comment.unwrap_or_default()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let average_rating = rating::refresh_product_rating(&txn, product.id).await?;
    txn.commit().await?;

    info!(product_id = product.id, %average_rating, "Review submitted");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Review submitted successfully",
            "average_rating": average_rating
        })),
    )
        .into_response())
}

async fn like_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(review_id): Path<i32>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let review = review::Entity::find_by_id(review_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    let already = review_like::Entity::find_by_id((review.id, claims.user_id))
        .one(&txn)
        .await?
        .is_some();
    if already {
        let count = like_count(&txn, review.id).await?;
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "You have already liked this review",
                "like_count": count,
                "has_liked": true
            })),
        )
            .into_response());
    }

    review_like::ActiveModel {
        review_id: Set(review.id),
        user_id: Set(claims.user_id),
    }
    .insert(&txn)
    .await?;

    let count = like_count(&txn, review.id).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Review liked",
            "like_count": count
        })),
    )
        .into_response())
}

async fn like_count<C: ConnectionTrait>(db: &C, review_id: i32) -> Result<u64, DbErr> {
    review_like::Entity::find()
        .filter(review_like::Column::ReviewId.eq(review_id))
        .count(db)
        .await
}

async fn reply_to_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(review_id): Path<i32>,
    Json(payload): Json<ReplyPayload>,
) -> ApiResult {
    let reply_text = payload
        .reply_text
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::bad_request("Reply text is required"))?;

    let review = review::Entity::find_by_id(review_id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    let reply = reply::ActiveModel {
        review_id: Set(review.id),
        user_id: Set(claims.user_id),
        reply_text: Set(reply_text),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&*db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReplyResponse {
            id: reply.id,
            user: reply.user_id,
            reply_text: reply.reply_text,
            created_at: reply.created_at,
        }),
    )
        .into_response())
}

#[derive(Deserialize)]
struct SubmitReview {
    rating: Option<Value>,
    comment: Option<String>,
}

#[derive(Deserialize)]
struct ReplyPayload {
    reply_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_rating(Some(&json!(4))), Some(4));
        assert_eq!(parse_rating(Some(&json!(" 5 "))), Some(5));
    }

    #[test]
    fn rating_rejects_out_of_range_and_fractions() {
        assert_eq!(parse_rating(Some(&json!(0))), None);
        assert_eq!(parse_rating(Some(&json!(6))), None);
        assert_eq!(parse_rating(Some(&json!(3.5))), None);
        assert_eq!(parse_rating(None), None);
    }
}
