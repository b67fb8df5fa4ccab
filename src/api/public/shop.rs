use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;

use crate::entities::{product, shop, shop_inventory};
use crate::middleware::logging::{ApiError, ApiResult};

pub fn shop_router() -> Router {
    Router::new().route("/shops/:id/products", get(get_shop_products))
}

#[derive(Serialize)]
struct ShopProductResponse {
    inventory_id: i32,
    product_id: i32,
    name: String,
    price: Decimal,
    discount: Decimal,
    final_price: Decimal,
    stock: i32,
}

impl ShopProductResponse {
    fn new(listing: &shop_inventory::Model, product: product::Model) -> Self {
        ShopProductResponse {
            inventory_id: listing.id,
            product_id: product.id,
            price: listing.price(&product),
            discount: listing.discount(&product),
            final_price: listing.final_price(&product),
            stock: listing.stock(&product),
            name: product.name,
        }
    }
}

/// A shop's available listings with the shop's overrides applied.
async fn get_shop_products(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    shop::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Shop not found"))?;

    let listings = shop_inventory::Entity::find()
        .filter(shop_inventory::Column::ShopId.eq(id))
        .filter(shop_inventory::Column::Available.eq(true))
        .order_by_asc(shop_inventory::Column::Id)
        .find_also_related(product::Entity)
        .all(&*db)
        .await?;

    let response: Vec<ShopProductResponse> = listings
        .into_iter()
        .filter_map(|(listing, product)| product.map(|product| ShopProductResponse::new(&listing, product)))
        .collect();

    Ok((StatusCode::OK, Json(response)).into_response())
}
