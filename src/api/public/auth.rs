use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::api::validation::{
    first_error, validate_address, validate_password, EMAIL_REGEX, PHONE_REGEX,
};
use crate::config::Config;
use crate::entities::{customer_profile, user};
use crate::middleware::auth::{generate_token, validate_token, TokenKind};
use crate::middleware::logging::{ApiError, ApiResult};

pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
}

async fn register_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterUser>,
) -> ApiResult {
    let errors = payload.validate().err();
    let check = |fields: &[&str]| -> Result<(), ApiError> {
        match errors.as_ref().and_then(|errors| first_error(errors, fields)) {
            Some(message) => Err(ApiError::ValidationFail(message)),
            None => Ok(()),
        }
    };

    check(&["email"])?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let email_taken = user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.as_str()))
        .count(&txn)
        .await?
        > 0;
    if email_taken {
        return Err(ApiError::bad_request(
            "Email is already in use. Please use a different email address.",
        ));
    }

    let username_taken = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .count(&txn)
        .await?
        > 0;
    if payload.username.trim().is_empty() || username_taken {
        return Err(ApiError::bad_request(
            "Username is already taken. Please choose a different username.",
        ));
    }

    check(&["password"])?;
    if payload.password != payload.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match."));
    }
    check(&["phone_number", "address"])?;

    let password = user::hash_password(&payload.password)
        .map_err(|err| ApiError::PasswordHashFailed(err.to_string()))?;

    let new_user = user::ActiveModel {
        username: Set(payload.username.clone()),
        email: Set(payload.email),
        password: Set(password),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        is_staff: Set(false),
        is_superuser: Set(false),
        date_joined: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    customer_profile::ActiveModel {
        user_id: Set(new_user.id),
        phone_number: Set(Some(payload.phone_number)),
        address: Set(Some(payload.address)),
        city: Set(Some(payload.city)),
        postal_code: Set(Some(payload.postal_code)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(user_id = new_user.id, username = %payload.username, "Registered user");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully!"
        })),
    )
        .into_response())
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<LoginPayload>,
) -> ApiResult {
    let found = user::Entity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(&*db)
        .await?;

    let user = match found {
        Some(user) if user.check_hash(&payload.password).is_ok() => user,
        _ => {
            warn!(username = %payload.username, "Failed login attempt");
            return Err(ApiError::Unauthorized("Invalid credentials".to_owned()));
        }
    };

    let access_token = generate_token(user.id, TokenKind::Access, &config)?;
    let refresh_token = generate_token(user.id, TokenKind::Refresh, &config)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "user_id": user.id
        })),
    )
        .into_response())
}

async fn refresh_token(
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<RefreshPayload>,
) -> ApiResult {
    let claims = validate_token(&payload.refresh_token, TokenKind::Refresh, &config)
        .map_err(|_| ApiError::bad_request("Invalid or expired refresh token"))?;

    let access_token = generate_token(claims.user_id, TokenKind::Access, &config)?;

    Ok((StatusCode::OK, Json(json!({ "access_token": access_token }))).into_response())
}

#[derive(Default, Deserialize, Validate)]
#[serde(default)]
struct RegisterUser {
    username: String,
    #[validate(regex(path = *EMAIL_REGEX, message = "Invalid email format. Please enter a valid email address."))]
    email: String,
    #[validate(custom(function = "validate_password"))]
    password: String,
    confirm_password: String,
    first_name: String,
    last_name: String,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone number must be exactly 11 digits."))]
    phone_number: String,
    #[validate(custom(function = "validate_address"))]
    address: String,
    city: String,
    postal_code: String,
}

#[derive(Deserialize)]
struct LoginPayload {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshPayload {
    refresh_token: String,
}
