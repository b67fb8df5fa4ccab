use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use sea_orm::{
    sea_query::{Expr, Func},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    TransactionTrait, ActiveModelTrait, Set,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::api::responses::cart_response;
use crate::entities::{cart, cart_item, color, product, size};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{ApiError, ApiResult};
use crate::services::{cart as carts, checkout, normalize_size, stock};

pub fn cart_router() -> Router {
    Router::new()
        .route("/cart", post(add_product))
        .route("/getcart", get(get_cart))
        .route("/cart/remove", post(remove_product))
        .route("/cart/increment", post(increment_quantity))
        .route("/cart/decrement", post(decrement_quantity))
        .route("/cart/checkout", post(checkout_cart))
        .route("/delete_cart", delete(delete_cart))
}

async fn add_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddProduct>,
) -> ApiResult {
    let (Some(product_id), Some(lines)) = (
        payload.product_id,
        payload.color_size_quantities.filter(|lines| !lines.is_empty()),
    ) else {
        return Err(ApiError::bad_request(
            "Missing product_id or color_size_quantities",
        ));
    };

    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let customer = carts::customer_for(&txn, claims.user_id).await?;
    let product = product::Entity::find_by_id(product_id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid product"))?;
    let cart = carts::get_or_create_cart(&txn, customer.id).await?;

    for line in lines {
        let color_name = line.color_name.trim();
        if color_name.is_empty() || line.quantity <= 0 {
            return Err(ApiError::bad_request(
                "Invalid color_name, size_name, or quantity",
            ));
        }
        let requested = i32::try_from(line.quantity)
            .map_err(|_| ApiError::bad_request("Invalid color_name, size_name, or quantity"))?;

        let size_name = normalize_size(line.size_name.as_deref());
        let variant =
            stock::resolve_variant(&txn, &product, color_name, size_name.as_deref(), false).await?;

        let in_cart = carts::find_item(&txn, cart.id, product.id, variant.color.id, variant.size_id())
            .await?
            .map(|item| item.quantity)
            .unwrap_or(0);

        if i64::from(in_cart) + i64::from(requested) > i64::from(variant.available()) {
            return Err(ApiError::bad_request(format!(
                "Not enough stock for {}. Available: {}, Requested: {}, In cart: {}",
                variant.label(),
                variant.available(),
                requested,
                in_cart
            )));
        }

        carts::add_quantity(
            &txn,
            cart.id,
            product.id,
            variant.color.id,
            variant.size_id(),
            requested,
        )
        .await?;
    }

    let cart = carts::refresh_totals(&txn, cart).await?;
    let response = cart_response(&txn, cart).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Returns the caller's cart after dropping lines that went out of stock.
async fn get_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let customer = carts::customer_for(&txn, claims.user_id).await?;
    let cart = carts::get_or_create_cart(&txn, customer.id).await?;
    carts::prune_unavailable(&txn, cart.id).await?;
    let cart = carts::refresh_totals(&txn, cart).await?;
    let response = cart_response(&txn, cart).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

struct LocatedLine {
    cart: cart::Model,
    product: product::Model,
    item: cart_item::Model,
}

async fn locate_line<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    payload: &CartLine,
) -> Result<LocatedLine, ApiError> {
    let (Some(product_id), Some(color_name)) = (
        payload.product_id,
        payload
            .color_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Missing product_id or color_name"));
    };

    let customer = carts::customer_for(db, user_id).await?;
    let cart = carts::find_cart(db, customer.id)
        .await?
        .ok_or_else(|| ApiError::not_found("No cart found for this user"))?;

    let product = product::Entity::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid product"))?;

    let color = color::Entity::find()
        .filter(color::Column::ColorName.eq(color_name))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Invalid color: {color_name}")))?;

    let size_id = match normalize_size(payload.size_name.as_deref()) {
        Some(name) => Some(
            size::Entity::find()
                .filter(Expr::expr(Func::lower(Expr::col(size::Column::Name))).eq(name.to_lowercase()))
                .one(db)
                .await?
                .ok_or_else(|| {
                    ApiError::not_found("Cart item not found for this product, color, and size")
                })?
                .id,
        ),
        None => None,
    };

    let item = carts::find_item(db, cart.id, product.id, color.id, size_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Cart item not found for this product, color, and size"))?;

    Ok(LocatedLine {
        cart,
        product,
        item,
    })
}

async fn remove_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartLine>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let line = locate_line(&txn, claims.user_id, &payload).await?;
    line.item.delete(&txn).await?;

    let cart = carts::refresh_totals(&txn, line.cart).await?;
    let response = cart_response(&txn, cart).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn increment_quantity(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartLine>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let line = locate_line(&txn, claims.user_id, &payload).await?;
    let color_name = payload.color_name.as_deref().unwrap_or_default();
    let size_name = normalize_size(payload.size_name.as_deref());
    let variant =
        stock::resolve_variant(&txn, &line.product, color_name, size_name.as_deref(), false)
            .await?;

    if line.item.quantity >= variant.available() {
        return Err(ApiError::bad_request(format!(
            "Not enough stock for {}. Only {} more can be added.",
            variant.label(),
            (variant.available() - line.item.quantity).max(0)
        )));
    }

    let quantity = line.item.quantity + 1;
    let mut item: cart_item::ActiveModel = line.item.into();
    item.quantity = Set(quantity);
    item.update(&txn).await?;

    let cart = carts::refresh_totals(&txn, line.cart).await?;
    let response = cart_response(&txn, cart).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Takes one unit off the line, removing it at zero.
async fn decrement_quantity(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CartLine>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let line = locate_line(&txn, claims.user_id, &payload).await?;
    if line.item.quantity > 1 {
        let quantity = line.item.quantity - 1;
        let mut item: cart_item::ActiveModel = line.item.into();
        item.quantity = Set(quantity);
        item.update(&txn).await?;
    } else {
        line.item.delete(&txn).await?;
    }

    let cart = carts::refresh_totals(&txn, line.cart).await?;
    let response = cart_response(&txn, cart).await?;
    txn.commit().await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn delete_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let customer = carts::customer_for(&txn, claims.user_id).await?;
    if let Some(cart) = carts::find_cart(&txn, customer.id).await? {
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
        cart.delete(&txn).await?;
        info!(customer_id = customer.id, "Deleted cart");
    }
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Places the stored cart as pending orders and empties it.
async fn checkout_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> ApiResult {
    let txn = db
        .begin()
        .await
        .map_err(|_| ApiError::TransactionCreationFailed)?;

    let customer = carts::customer_for(&txn, claims.user_id).await?;
    let cart = carts::find_cart(&txn, customer.id)
        .await?
        .ok_or_else(|| ApiError::bad_request("Cart is empty"))?;
    let items = carts::items(&txn, cart.id).await?;
    if items.is_empty() {
        return Err(ApiError::bad_request("Cart is empty"));
    }

    let color_ids: Vec<i32> = items.iter().map(|item| item.color_id).collect();
    let colors: HashMap<i32, String> = color::Entity::find()
        .filter(color::Column::Id.is_in(color_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|color| (color.id, color.color_name))
        .collect();
    let size_ids: Vec<i32> = items.iter().filter_map(|item| item.size_id).collect();
    let sizes: HashMap<i32, String> = size::Entity::find()
        .filter(size::Column::Id.is_in(size_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|size| (size.id, size.name))
        .collect();

    let lines: Vec<checkout::CheckoutLine> = items
        .iter()
        .filter_map(|item| {
            Some(checkout::CheckoutLine {
                product_id: item.product_id,
                color_name: colors.get(&item.color_id)?.clone(),
                size_name: item.size_id.and_then(|id| sizes.get(&id).cloned()),
                quantity: item.quantity,
            })
        })
        .collect();

    let order_ids = checkout::place_orders(&txn, &customer, &checkout::aggregate(lines)?).await?;

    cart_item::Entity::delete_many()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .exec(&txn)
        .await?;
    carts::refresh_totals(&txn, cart).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "detail": "Orders placed/updated successfully.",
            "order_ids": order_ids
        })),
    )
        .into_response())
}

fn default_quantity() -> i64 {
    1
}

#[derive(Deserialize)]
struct ColorSizeQuantity {
    #[serde(default)]
    color_name: String,
    size_name: Option<String>,
    #[serde(default = "default_quantity")]
    quantity: i64,
}

#[derive(Deserialize)]
struct AddProduct {
    product_id: Option<i32>,
    color_size_quantities: Option<Vec<ColorSizeQuantity>>,
}

#[derive(Deserialize)]
struct CartLine {
    product_id: Option<i32>,
    color_name: Option<String>,
    size_name: Option<String>,
}
