use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Select, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::api::responses::{review_responses, ReplyResponse};
use crate::entities::{reply, review, role_permission::Permission};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::{
    access::{scoped_product_ids, Actor},
    rating,
};

pub fn admin_review_router() -> Router {
    Router::new()
        .route("/reviews", get(list_reviews))
        .route("/reviews/:id", get(get_review).delete(delete_review))
        .route("/reviews/:id/reply", post(reply_to_review))
        .route("/replies", get(list_replies))
        .route("/replies/:id", delete(delete_reply))
}

/// Reviews of products in the actor's inventories.
async fn scoped_reviews<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
) -> Result<Select<review::Entity>, ApiError> {
    let scope = actor.scope(Permission::ManageReviews)?;
    let query = review::Entity::find();
    Ok(match scoped_product_ids(db, &scope).await? {
        Some(products) => query.filter(review::Column::ProductId.is_in(products)),
        None => query,
    })
}

async fn managed_review<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<review::Model, ApiError> {
    scoped_reviews(db, actor)
        .await?
        .filter(review::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Review not found"))
}

async fn list_reviews(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let reviews = scoped_reviews(&*db, &actor)
        .await?
        .order_by_desc(review::Column::CreatedAt)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(review_responses(&*db, reviews).await?)).into_response())
}

async fn get_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let review = managed_review(&*db, &actor, id).await?;

    let mut response = review_responses(&*db, vec![review]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn delete_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let review = managed_review(&txn, &actor, id).await?;
    let product_id = review.product_id;
    review.delete(&txn).await?;
    rating::refresh_product_rating(&txn, product_id).await?;
    txn.commit().await?;

    info!(review_id = id, product_id, "Deleted review");
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn reply_to_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<ReplyPayload>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let reply_text = payload
        .reply_text
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::bad_request("Reply text is required"))?;

    let review = managed_review(&*db, &actor, id).await?;
    let reply = reply::ActiveModel {
        review_id: Set(review.id),
        user_id: Set(actor.user.id),
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

async fn list_replies(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let review_ids: Vec<i32> = scoped_reviews(&*db, &actor)
        .await?
        .all(&*db)
        .await?
        .into_iter()
        .map(|review| review.id)
        .collect();
    let replies = reply::Entity::find()
        .filter(reply::Column::ReviewId.is_in(review_ids))
        .order_by_desc(reply::Column::CreatedAt)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(replies)).into_response())
}

async fn delete_reply(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let reply = reply::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Reply not found"))?;
    managed_review(&*db, &actor, reply.review_id)
        .await
        .map_err(|_| ApiError::not_found("Reply not found"))?;
    reply.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct ReplyPayload {
    reply_text: Option<String>,
}
