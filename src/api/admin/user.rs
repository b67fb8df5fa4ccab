use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::validation::{validate_password, EMAIL_REGEX, PASSWORD_MESSAGE};
use crate::entities::{employee, user};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

pub fn admin_user_router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(patch_user).delete(delete_user),
        )
}

#[derive(Serialize)]
pub(super) struct UserResponse {
    id: i32,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    is_staff: bool,
    is_superuser: bool,
    date_joined: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            date_joined: user.date_joined,
        }
    }
}

pub(super) struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Validates and inserts a user account.
pub(super) async fn insert_user<C: ConnectionTrait>(
    db: &C,
    new: NewUser,
) -> Result<user::Model, ApiError> {
    let username = new.username.trim().to_owned();
    if username.is_empty() {
        return Err(ApiError::bad_request("Username is required"));
    }
    if validate_password(&new.password).is_err() {
        return Err(ApiError::bad_request(PASSWORD_MESSAGE));
    }
    let email = new.email.unwrap_or_default();
    if !email.is_empty() && !EMAIL_REGEX.is_match(&email) {
        return Err(ApiError::bad_request(
            "Invalid email format. Please enter a valid email address.",
        ));
    }

    let taken = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .count(db)
        .await?
        > 0;
    if taken {
        return Err(ApiError::bad_request(
            "Username is already taken. Please choose a different username.",
        ));
    }

    let password = user::hash_password(&new.password)
        .map_err(|err| ApiError::PasswordHashFailed(err.to_string()))?;

    let user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password: Set(password),
        first_name: Set(new.first_name.unwrap_or_default()),
        last_name: Set(new.last_name.unwrap_or_default()),
        is_staff: Set(new.is_staff || new.is_superuser),
        is_superuser: Set(new.is_superuser),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(user)
}

/// A user may edit themselves; owners may edit the users of their employees.
async fn can_edit<C: ConnectionTrait>(db: &C, actor: &Actor, user_id: i32) -> Result<bool, ApiError> {
    if actor.is_superuser() || actor.user.id == user_id {
        return Ok(true);
    }
    let employment = employee::Entity::find()
        .filter(employee::Column::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(employment.is_some_and(|employee| actor.owned_shops.contains(&employee.shop_id)))
}

async fn list_users(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    actor.require_superuser()?;

    let users: Vec<UserResponse> = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&*db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok((StatusCode::OK, Json(users)).into_response())
}

async fn get_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    if !can_edit(&*db, &actor, id).await? {
        return Err(ApiError::forbidden());
    }

    let user = user::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))).into_response())
}

async fn create_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateUser>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    actor.require_superuser()?;

    let user = insert_user(
        &*db,
        NewUser {
            username: payload.username,
            password: payload.password,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            is_staff: payload.is_staff,
            is_superuser: payload.is_superuser,
        },
    )
    .await?;

    info!(user_id = user.id, "Created user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))).into_response())
}

async fn patch_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchUser>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    if !can_edit(&*db, &actor, id).await? {
        return Err(ApiError::forbidden());
    }
    if (payload.is_staff.is_some() || payload.is_superuser.is_some()) && !actor.is_superuser() {
        return Err(ApiError::forbidden());
    }

    let user = user::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let mut update: user::ActiveModel = user.into();
    if let Some(username) = payload.username {
        update.username = Set(username);
    }
    if let Some(email) = payload.email {
        if !EMAIL_REGEX.is_match(&email) {
            return Err(ApiError::bad_request(
                "Invalid email format. Please enter a valid email address.",
            ));
        }
        update.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        update.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        update.last_name = Set(last_name);
    }
    if let Some(password) = payload.password {
        if validate_password(&password).is_err() {
            return Err(ApiError::bad_request(PASSWORD_MESSAGE));
        }
        let hash = user::hash_password(&password)
            .map_err(|err| ApiError::PasswordHashFailed(err.to_string()))?;
        update.password = Set(hash);
    }
    if let Some(is_staff) = payload.is_staff {
        update.is_staff = Set(is_staff);
    }
    if let Some(is_superuser) = payload.is_superuser {
        update.is_superuser = Set(is_superuser);
    }
    let user = update.update(&*db).await?;

    Ok((StatusCode::OK, Json(UserResponse::from(user))).into_response())
}

async fn delete_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    actor.require_superuser()?;
    if actor.user.id == id {
        return Err(ApiError::bad_request("You cannot delete your own account"));
    }

    let user = user::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    user.delete(&*db).await?;

    info!(user_id = id, "Deleted user");
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct CreateUser {
    username: String,
    password: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    is_staff: bool,
    #[serde(default)]
    is_superuser: bool,
}

#[derive(Deserialize)]
struct PatchUser {
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    is_staff: Option<bool>,
    is_superuser: Option<bool>,
}
