use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::collections::HashMap;
use tracing::info;

use crate::entities::{
    cart, cart_item, customer_profile, product, product_color_image, product_color_size,
};
use crate::middleware::logging::ApiError;
use crate::services::{inventory, pricing, size_condition};

pub async fn customer_for<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<customer_profile::Model, ApiError> {
    customer_profile::Entity::find()
        .filter(customer_profile::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::bad_request("Invalid user"))
}

pub async fn find_cart<C: ConnectionTrait>(db: &C, customer_id: i32) -> Result<Option<cart::Model>, DbErr> {
    cart::Entity::find()
        .filter(cart::Column::CustomerId.eq(customer_id))
        .one(db)
        .await
}

pub async fn get_or_create_cart<C: ConnectionTrait>(db: &C, customer_id: i32) -> Result<cart::Model, DbErr> {
    if let Some(cart) = find_cart(db, customer_id).await? {
        return Ok(cart);
    }

    cart::ActiveModel {
        customer_id: Set(customer_id),
        total_price: Set(pricing::round_money(Decimal::ZERO)),
        cart_date: Set(Utc::now()),
        product_description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find_item<C: ConnectionTrait>(
    db: &C,
    cart_id: i32,
    product_id: i32,
    color_id: i32,
    size_id: Option<i32>,
) -> Result<Option<cart_item::Model>, DbErr> {
    cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .filter(cart_item::Column::ColorId.eq(color_id))
        .filter(size_condition(cart_item::Column::SizeId, size_id))
        .one(db)
        .await
}

pub async fn items<C: ConnectionTrait>(db: &C, cart_id: i32) -> Result<Vec<cart_item::Model>, DbErr> {
    cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await
}

/// Adds `quantity` to the line, creating it when missing.
pub async fn add_quantity<C: ConnectionTrait>(
    db: &C,
    cart_id: i32,
    product_id: i32,
    color_id: i32,
    size_id: Option<i32>,
    quantity: i32,
) -> Result<cart_item::Model, ApiError> {
    match find_item(db, cart_id, product_id, color_id, size_id).await? {
        Some(item) => {
            let new_quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| ApiError::bad_request("Requested quantity is too large."))?;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(new_quantity);
            Ok(item.update(db).await?)
        }
        None => Ok(cart_item::ActiveModel {
            cart_id: Set(cart_id),
            product_id: Set(product_id),
            color_id: Set(color_id),
            size_id: Set(size_id),
            quantity: Set(quantity),
            ..Default::default()
        }
        .insert(db)
        .await?),
    }
}

/// Stock currently backing a cart line, `None` when the record is gone.
async fn line_stock<C: ConnectionTrait>(db: &C, item: &cart_item::Model) -> Result<Option<i32>, DbErr> {
    let Some(color_image) = product_color_image::Entity::find()
        .filter(product_color_image::Column::ProductId.eq(item.product_id))
        .filter(product_color_image::Column::ColorId.eq(item.color_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let sizes = product_color_size::Entity::find()
        .filter(product_color_size::Column::ProductColorImageId.eq(color_image.id))
        .all(db)
        .await?;

    if sizes.is_empty() {
        return Ok(match item.size_id {
            None => Some(color_image.stock),
            Some(_) => None,
        });
    }

    Ok(item
        .size_id
        .and_then(|size_id| sizes.iter().find(|entry| entry.size_id == size_id))
        .map(|entry| entry.stock))
}

/// Drops lines whose stock record is missing or empty.
pub async fn prune_unavailable<C: ConnectionTrait>(db: &C, cart_id: i32) -> Result<u64, DbErr> {
    let mut removed = 0;
    for item in items(db, cart_id).await? {
        match line_stock(db, &item).await? {
            Some(stock) if stock > 0 => {}
            _ => {
                item.delete(db).await?;
                removed += 1;
            }
        }
    }
    if removed > 0 {
        info!(cart_id, removed, "Pruned unavailable cart lines");
    }
    Ok(removed)
}

/// Recomputes the cart total and description from its lines.
pub async fn refresh_totals<C: ConnectionTrait>(db: &C, cart: cart::Model) -> Result<cart::Model, DbErr> {
    let lines = items(db, cart.id).await?;

    let product_ids: Vec<i32> = lines.iter().map(|item| item.product_id).collect();
    let products: HashMap<i32, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut total = Decimal::ZERO;
    let mut names = Vec::with_capacity(lines.len());
    for item in &lines {
        let Some(product) = products.get(&item.product_id) else {
            continue;
        };
        let listing = inventory::owning_listing(db, product).await?;
        let unit_price = inventory::unit_price(product, listing.as_ref());
        total += pricing::line_total(unit_price, item.quantity);
        names.push(product.name.clone());
    }

    let mut cart: cart::ActiveModel = cart.into();
    cart.total_price = Set(pricing::round_money(total));
    cart.product_description = Set(if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    });
    cart.update(db).await
}
