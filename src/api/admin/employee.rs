use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use super::user::{insert_user, NewUser};
use crate::entities::{employee, role, user};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::access::Actor;

pub fn admin_employee_router() -> Router {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/:id",
            get(get_employee)
                .patch(patch_employee)
                .delete(delete_employee),
        )
}

#[derive(Serialize)]
struct EmployeeResponse {
    id: i32,
    user: i32,
    username: String,
    full_name: String,
    shop: i32,
    role: Option<i32>,
    position: String,
    phone: Option<String>,
    date_joined: NaiveDate,
}

async fn employee_responses<C: ConnectionTrait>(
    db: &C,
    employees: Vec<employee::Model>,
) -> Result<Vec<EmployeeResponse>, ApiError> {
    let users: HashMap<i32, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(employees.iter().map(|e| e.user_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(employees
        .into_iter()
        .map(|employee| {
            let user = users.get(&employee.user_id);
            EmployeeResponse {
                id: employee.id,
                user: employee.user_id,
                username: user.map(|u| u.username.clone()).unwrap_or_default(),
                full_name: user.map(user::Model::full_name).unwrap_or_default(),
                shop: employee.shop_id,
                role: employee.role_id,
                position: employee.position,
                phone: employee.phone,
                date_joined: employee.date_joined,
            }
        })
        .collect())
}

/// Superusers see everyone, owners their shops' staff, employees themselves.
fn visibility(actor: &Actor) -> Option<Condition> {
    if actor.is_superuser() {
        return None;
    }
    Some(
        Condition::any()
            .add(employee::Column::ShopId.is_in(actor.owned_shops.clone()))
            .add(employee::Column::UserId.eq(actor.user.id)),
    )
}

async fn scoped_employee<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    id: i32,
) -> Result<employee::Model, ApiError> {
    let mut query = employee::Entity::find_by_id(id);
    if let Some(condition) = visibility(actor) {
        query = query.filter(condition);
    }
    query
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Employee not found"))
}

async fn check_role<C: ConnectionTrait>(
    db: &C,
    role_id: Option<i32>,
    shop_id: i32,
) -> Result<(), ApiError> {
    let Some(role_id) = role_id else {
        return Ok(());
    };
    let role = role::Entity::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Role {role_id} not found")))?;
    if role.shop_id != shop_id {
        return Err(ApiError::bad_request(
            "The role must belong to the employee's shop.",
        ));
    }
    Ok(())
}

async fn list_employees(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let mut query = employee::Entity::find().order_by_asc(employee::Column::Id);
    if let Some(condition) = visibility(&actor) {
        query = query.filter(condition);
    }
    let employees = query.all(&*db).await?;

    Ok((StatusCode::OK, Json(employee_responses(&*db, employees).await?)).into_response())
}

async fn get_employee(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let employee = scoped_employee(&*db, &actor, id).await?;

    let mut response = employee_responses(&*db, vec![employee]).await?;
    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

/// Creates the staff user together with its employment record.
async fn create_employee(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateEmployee>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let shop_id = match payload.shop_id {
        Some(shop_id) => shop_id,
        None => actor
            .owned_shops
            .first()
            .copied()
            .ok_or_else(|| ApiError::bad_request("shop_id is required"))?,
    };
    if !actor.is_owner_of(shop_id) {
        return Err(ApiError::forbidden());
    }

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    check_role(&txn, payload.role_id, shop_id).await?;

    let user = insert_user(
        &txn,
        NewUser {
            username: payload.username,
            password: payload.password,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            is_staff: true,
            is_superuser: false,
        },
    )
    .await?;

    let employee = employee::ActiveModel {
        user_id: Set(user.id),
        shop_id: Set(shop_id),
        role_id: Set(payload.role_id),
        position: Set(payload.position.unwrap_or_else(|| "Staff".to_owned())),
        phone: Set(payload.phone),
        date_joined: Set(Utc::now().date_naive()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut response = employee_responses(&txn, vec![employee]).await?;
    txn.commit().await?;

    info!(user_id = user.id, shop_id, "Created employee");
    Ok((StatusCode::CREATED, Json(response.pop())).into_response())
}

async fn patch_employee(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchEmployee>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let employee = scoped_employee(&txn, &actor, id).await?;
    let owner = actor.is_owner_of(employee.shop_id);
    if !owner && (payload.role_id.is_some() || payload.position.is_some()) {
        return Err(ApiError::forbidden());
    }
    if payload.role_id.is_some() {
        check_role(&txn, payload.role_id, employee.shop_id).await?;
    }

    let mut update: employee::ActiveModel = employee.into();
    if let Some(role_id) = payload.role_id {
        update.role_id = Set(Some(role_id));
    }
    if let Some(position) = payload.position {
        update.position = Set(position);
    }
    if let Some(phone) = payload.phone {
        update.phone = Set(Some(phone));
    }
    let employee = update.update(&txn).await?;

    let mut response = employee_responses(&txn, vec![employee]).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response.pop())).into_response())
}

async fn delete_employee(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i32>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;
    let employee = scoped_employee(&*db, &actor, id).await?;
    if !actor.is_owner_of(employee.shop_id) {
        return Err(ApiError::forbidden());
    }
    employee.delete(&*db).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[derive(Deserialize)]
struct CreateEmployee {
    username: String,
    password: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    shop_id: Option<i32>,
    role_id: Option<i32>,
    position: Option<String>,
    phone: Option<String>,
}

#[derive(Deserialize)]
struct PatchEmployee {
    role_id: Option<i32>,
    position: Option<String>,
    phone: Option<String>,
}
