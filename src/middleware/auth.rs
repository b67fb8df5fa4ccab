use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::entities::user::Entity as UserEntity;
use crate::middleware::logging::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub kind: TokenKind,
    pub exp: usize,
}

/// What a protected router demands of the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    Staff,
}

#[derive(Clone)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<Config>,
    pub access: Access,
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Authentication credentials were not provided")]
    MissingToken,
    #[error("Invalid user id")]
    InvalidUser,
    #[error("Token is invalid or expired")]
    InvalidToken,
    #[error("Wrong token type")]
    WrongKind,
    #[error("Staff access required")]
    NotStaff,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<AuthMiddlewareError> for ApiError {
    fn from(err: AuthMiddlewareError) -> Self {
        match err {
            AuthMiddlewareError::NotStaff => ApiError::forbidden(),
            AuthMiddlewareError::GenerationFail => ApiError::TokenGenerationFailed(err.to_string()),
            AuthMiddlewareError::InternalServerError(value) => ApiError::DbError(value),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AuthMiddlewareError::MissingToken)?;

    let claims = validate_token(token, TokenKind::Access, &state.config)?;

    let user = UserEntity::find_by_id(claims.user_id)
        .one(&*state.db)
        .await
        .map_err(|err| AuthMiddlewareError::InternalServerError(err.to_string()))?
        .ok_or(AuthMiddlewareError::InvalidUser)?;

    if state.access == Access::Staff && !user.has_admin_access() {
        return Err(AuthMiddlewareError::NotStaff.into());
    }

    debug!(user_id = claims.user_id, "Authenticated request");
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn generate_token(user_id: i32, kind: TokenKind, config: &Config) -> Result<String, AuthMiddlewareError> {
    let ttl = match kind {
        TokenKind::Access => config.access_token_ttl,
        TokenKind::Refresh => config.refresh_token_ttl,
    };
    let exp = Utc::now()
        .checked_add_signed(ttl)
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims { user_id, kind, exp };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

pub fn validate_token(token: &str, kind: TokenKind, config: &Config) -> Result<Claims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AuthMiddlewareError::InvalidToken)?
    .claims;

    if claims.kind != kind {
        return Err(AuthMiddlewareError::WrongKind);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn access_token_round_trip() {
        let config = Config::for_tests(PathBuf::from("uploads"));
        let token = generate_token(7, TokenKind::Access, &config).unwrap();

        let claims = validate_token(&token, TokenKind::Access, &config).unwrap();
        assert_eq!(claims.user_id, 7);
        assert!(matches!(
            validate_token(&token, TokenKind::Refresh, &config),
            Err(AuthMiddlewareError::WrongKind)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = Config::for_tests(PathBuf::from("uploads"));
        let other = Config {
            secret: "another-secret".to_owned(),
            ..config.clone()
        };
        let token = generate_token(7, TokenKind::Refresh, &other).unwrap();
        assert!(matches!(
            validate_token(&token, TokenKind::Refresh, &config),
            Err(AuthMiddlewareError::InvalidToken)
        ));
    }
}
