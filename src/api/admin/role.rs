use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::entities::{
    role,
    role_permission::{self, Permission},
};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::{Actor, Scope};

pub fn admin_role_router() -> Router {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route(
            "/roles/:id",
            get(get_role).patch(patch_role).delete(delete_role),
        )
}

/// Roles are managed by shop owners only.
fn owner_scope(actor: &Actor) -> Result<Scope, ApiError> {
    if actor.is_superuser() {
        return Ok(Scope::All);
    }
    if actor.owned_shops.is_empty() {
        return Err(ApiError::forbidden());
    }
    Ok(Scope::Shops(actor.owned_shops.clone()))
}

#[derive(Serialize)]
struct RoleResponse {
    id: i32,
    shop: i32,
    name: String,
    description: String,
    permissions: Vec<Permission>,
}

async fn role_responses<C: ConnectionTrait>(
    db: &C,
    roles: Vec<role::Model>,
) -> Result<Vec<RoleResponse>, DbErr> {
    let mut grants: HashMap<i32, Vec<Permission>> = HashMap::new();
    for grant in role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.is_in(roles.iter().map(|r| r.id)))
        .all(db)
        .await?
    {
        grants.entry(grant.role_id).or_default().push(grant.permission);
    }

    Ok(roles
        .into_iter()
        .map(|role| RoleResponse {
            permissions: grants.remove(&role.id).unwrap_or_default(),
            id: role.id,
            shop: role.shop_id,
            name: role.name,
            description: role.description,
        })
        .collect())
}

async fn replace_permissions<C: ConnectionTrait>(
    db: &C,
    role_id: i32,
    permissions: &[Permission],
) -> Result<(), DbErr> {
    role_permission::Entity::delete_many()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .exec(db)
        .await?;

    let mut unique: Vec<Permission> = Vec::new();
    for permission in permissions {
        if !unique.contains(permission) {
            unique.push(*permission);
        }
    }
    if unique.is_empty() {
        return Ok(());
    }

    role_permission::Entity::insert_many(unique.into_iter().map(|permission| {
        role_permission::ActiveModel {
            role_id: Set(role_id),
            permission: Set(permission),
        }
    }))
    .exec(db)
    .await?;
    Ok(())
}

async fn scoped_role<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<role::Model, ApiError> {
    let scope = owner_scope(actor)?;
    scope
        .apply(role::Entity::find_by_id(id), role::Column::ShopId)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Role not found"))
}

async fn list_roles(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let roles = owner_scope(&actor)?
        .apply(role::Entity::find(), role::Column::ShopId)
        .order_by_asc(role::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(role_responses(&*db, roles).await?)).into_response())
}

async fn get_role(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let role = scoped_role(&*db, &actor, id).await?;

    let mut response = role_responses(&*db, vec![role]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn create_role(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRole>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    if !actor.is_owner_of(payload.shop_id) {
        return Err(ApiError::forbidden());
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("Role name is required"));
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let role = role::ActiveModel {
        shop_id: Set(payload.shop_id),
        name: Set(payload.name.trim().to_owned()),
        description: Set(payload.description.unwrap_or_default()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    replace_permissions(&txn, role.id, &payload.permissions).await?;

    let mut response = role_responses(&txn, vec![role]).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(response.pop())).into_response())
}

async fn patch_role(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchRole>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let role = scoped_role(&txn, &actor, id).await?;
    let mut role: role::ActiveModel = role.into();
    if let Some(name) = payload.name {
        role.name = Set(name);
    }
    if let Some(description) = payload.description {
        role.description = Set(description);
    }
    let role = role.update(&txn).await?;

    if let Some(permissions) = payload.permissions {
        replace_permissions(&txn, role.id, &permissions).await?;
    }

    let mut response = role_responses(&txn, vec![role]).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn delete_role(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let role = scoped_role(&*db, &actor, id).await?;
    role.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct CreateRole {
    shop_id: i32,
    name: String,
    description: Option<String>,
    #[serde(default)]
    permissions: Vec<Permission>,
}

#[derive(Deserialize)]
struct PatchRole {
    name: Option<String>,
    description: Option<String>,
    permissions: Option<Vec<Permission>>,
}
