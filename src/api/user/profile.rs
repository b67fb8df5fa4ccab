use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::api::responses::ProfileResponse;
use crate::api::validation::{
    first_error, validate_address, validate_password, EMAIL_REGEX, PHONE_REGEX,
};
use crate::entities::{customer_profile, user};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};

pub fn profile_router() -> Router {
    Router::new()
        .route("/verify-token", get(verify_token))
        .route("/profile", get(get_profile))
        .route("/editprofile", put(edit_profile))
}

/// Reaching the handler means the auth layer accepted the token.
async fn verify_token(Extension(claims): Extension<Claims>) -> ApiResult {
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Token is valid!",
            "user_id": claims.user_id
        })),
    )
        .into_response())
}

async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let (profile, user) = customer_profile::Entity::find()
        .filter(customer_profile::Column::UserId.eq(claims.user_id))
        .find_also_related(user::Entity)
        .one(&*db)
        .await?
        .and_then(|(profile, user)| user.map(|user| (profile, user)))
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok((StatusCode::OK, Json(ProfileResponse::new(profile, &user))).into_response())
}

async fn edit_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<EditProfile>,
) -> ApiResult {
    if let Err(errors) = payload.validate() {
        let message = first_error(&errors, &["email", "new_password", "phone_number", "address"])
            .unwrap_or_else(|| "Invalid profile data".to_owned());
        return Err(ApiError::ValidationFail(message));
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let user = user::Entity::find_by_id(claims.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_owned()))?;

    let profile = customer_profile::Entity::find()
        .filter(customer_profile::Column::UserId.eq(user.id))
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    let mut user_update: user::ActiveModel = user.clone().into();

    if let (Some(current), Some(new)) = (&payload.current_password, &payload.new_password) {
        if user.check_hash(current).is_err() {
            return Err(ApiError::bad_request("Current password is incorrect"));
        }
        let hash =
            user::hash_password(new).map_err(|err| ApiError::PasswordHashFailed(err.to_string()))?;
        user_update.password = Set(hash);
    }

    if let Some(username) = payload.username.filter(|name| name != &user.username) {
        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(username.as_str()))
            .count(&txn)
            .await?
            > 0;
        if username.trim().is_empty() || taken {
            return Err(ApiError::bad_request(
                "Username is already taken. Please choose a different username.",
            ));
        }
        user_update.username = Set(username);
    }
    if let Some(email) = payload.email {
        user_update.email = Set(email);
    }
    if let Some(first_name) = payload.first_name {
        user_update.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        user_update.last_name = Set(last_name);
    }
    let user = user_update.update(&txn).await?;

    let mut profile_update: customer_profile::ActiveModel = profile.into();
    if let Some(phone_number) = payload.phone_number {
        profile_update.phone_number = Set(Some(phone_number));
    }
    if let Some(address) = payload.address {
        profile_update.address = Set(Some(address));
    }
    if let Some(city) = payload.city {
        profile_update.city = Set(Some(city));
    }
    if let Some(postal_code) = payload.postal_code {
        profile_update.postal_code = Set(Some(postal_code));
    }
    let profile = profile_update.update(&txn).await?;

    txn.commit().await?;

    info!(user_id = user.id, "Updated profile");
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Profile updated successfully",
            "profile": ProfileResponse::new(profile, &user)
        })),
    )
        .into_response())
}

#[derive(Deserialize, Validate)]
struct EditProfile {
    username: Option<String>,
    #[validate(regex(path = *EMAIL_REGEX, message = "Invalid email format. Please enter a valid email address."))]
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[validate(regex(path = *PHONE_REGEX, message = "Phone number must be exactly 11 digits."))]
    phone_number: Option<String>,
    #[validate(custom(function = "validate_address"))]
    address: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    current_password: Option<String>,
    #[validate(custom(function = "validate_password"))]
    new_password: Option<String>,
}
