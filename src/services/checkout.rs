use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

use crate::entities::{customer_profile, order, order_item, product};
use crate::middleware::logging::ApiError;
use crate::services::{inventory, normalize_size, pricing, size_condition, stock};

/// One requested purchase line.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckoutLine {
    pub product_id: i32,
    pub color_name: String,
    pub size_name: Option<String>,
    pub quantity: i32,
}

impl CheckoutLine {
    /// Reads a line from request JSON. `None` when the product id is missing,
    /// the color is blank, or the quantity is not a positive integer.
    pub fn from_value(value: &Value) -> Option<Self> {
        let product_id = match value.get("product_id")? {
            Value::Number(number) => i32::try_from(number.as_i64()?).ok()?,
            Value::String(text) => text.trim().parse().ok()?,
            _ => return None,
        };
        let color_name = value.get("color_name")?.as_str()?.trim();
        let quantity = i32::try_from(value.get("quantity")?.as_i64()?).ok()?;

        if product_id <= 0 || color_name.is_empty() || quantity <= 0 {
            return None;
        }

        Some(CheckoutLine {
            product_id,
            color_name: color_name.to_owned(),
            size_name: normalize_size(value.get("size_name").and_then(Value::as_str)),
            quantity,
        })
    }
}

fn quantity_too_large() -> ApiError {
    ApiError::bad_request("Requested quantity is too large.")
}

/// Merges lines for the same product, color and size, keeping first-seen order.
/// Fails when a merged quantity no longer fits in an `i32`.
pub fn aggregate(lines: Vec<CheckoutLine>) -> Result<Vec<CheckoutLine>, ApiError> {
    let mut merged: Vec<CheckoutLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let existing = merged.iter_mut().find(|seen| {
            seen.product_id == line.product_id
                && seen.color_name == line.color_name
                && seen.size_name == line.size_name
        });
        match existing {
            Some(seen) => {
                seen.quantity = seen
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(quantity_too_large)?;
            }
            None => merged.push(line),
        }
    }
    Ok(merged)
}

struct PreparedLine {
    product: product::Model,
    variant: stock::Variant,
    quantity: i32,
    unit_price: Decimal,
}

/// Turns aggregated lines into pending orders, one per owning shop, and takes
/// the stock. Must run inside a transaction; any error leaves nothing written
/// once the caller drops it.
pub async fn place_orders<C: ConnectionTrait>(
    db: &C,
    customer: &customer_profile::Model,
    lines: &[CheckoutLine],
) -> Result<Vec<i32>, ApiError> {
    let mut claimed: HashMap<stock::StockKey, i32> = HashMap::new();
    let mut per_shop: Vec<(i32, Vec<PreparedLine>)> = Vec::new();

    for line in lines {
        let product = product::Entity::find_by_id(line.product_id)
            .lock_exclusive()
            .one(db)
            .await?
            .ok_or_else(|| ApiError::bad_request(format!("Product {} not found.", line.product_id)))?;

        let variant = stock::resolve_variant(
            db,
            &product,
            &line.color_name,
            line.size_name.as_deref(),
            true,
        )
        .await?;

        let already = claimed.get(&variant.key()).copied().unwrap_or(0);
        let available = i64::from(variant.available()) - i64::from(already);
        if available < i64::from(line.quantity) {
            return Err(ApiError::bad_request(format!(
                "Not enough stock for {} ({}). Available: {}, requested: {}.",
                product.name,
                variant.label(),
                available.max(0),
                line.quantity
            )));
        }

        let Some(shop_id) = product.created_by_shop_id else {
            return Err(ApiError::bad_request(format!(
                "Product '{}' is not linked to a shop.",
                product.name
            )));
        };

        let listing = inventory::owning_listing(db, &product).await?;
        if matches!(&listing, Some(listing) if !listing.available) {
            return Err(ApiError::bad_request(format!(
                "Product '{}' is not available in its shop.",
                product.name
            )));
        }
        let unit_price = inventory::unit_price(&product, listing.as_ref());

        let claim = already.checked_add(line.quantity).ok_or_else(quantity_too_large)?;
        claimed.insert(variant.key(), claim);

        let prepared = PreparedLine {
            product,
            variant,
            quantity: line.quantity,
            unit_price,
        };
        match per_shop.iter_mut().find(|(id, _)| *id == shop_id) {
            Some((_, shop_lines)) => shop_lines.push(prepared),
            None => per_shop.push((shop_id, vec![prepared])),
        }
    }

    if per_shop.is_empty() {
        return Err(ApiError::bad_request("No valid items to add to the order."));
    }

    let mut order_ids = Vec::with_capacity(per_shop.len());
    for (shop_id, shop_lines) in per_shop {
        let order = pending_order(db, customer.id, shop_id).await?;
        let order_id = order.id;

        for line in &shop_lines {
            add_order_item(db, order_id, line).await?;
            stock::decrement(db, &line.variant, line.quantity).await?;
        }

        refresh_order_totals(db, order).await?;
        order_ids.push(order_id);
    }

    info!(customer_id = customer.id, orders = ?order_ids, "Checkout completed");
    Ok(order_ids)
}

/// The customer's single pending order for a shop, created when missing.
async fn pending_order<C: ConnectionTrait>(
    db: &C,
    customer_id: i32,
    shop_id: i32,
) -> Result<order::Model, DbErr> {
    let existing = order::Entity::find()
        .filter(order::Column::CustomerId.eq(customer_id))
        .filter(order::Column::ShopId.eq(shop_id))
        .filter(order::Column::Status.eq(order::Status::Pending))
        .lock_exclusive()
        .one(db)
        .await?;
    if let Some(order) = existing {
        return Ok(order);
    }

    order::ActiveModel {
        customer_id: Set(customer_id),
        shop_id: Set(Some(shop_id)),
        total_price: Set(pricing::round_money(Decimal::ZERO)),
        status: Set(order::Status::Pending),
        order_date: Set(Utc::now()),
        product_description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

async fn add_order_item<C: ConnectionTrait>(
    db: &C,
    order_id: i32,
    line: &PreparedLine,
) -> Result<order_item::Model, ApiError> {
    let size_id = line.variant.size_id();
    let existing = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .filter(order_item::Column::ProductId.eq(line.product.id))
        .filter(order_item::Column::ColorId.eq(line.variant.color.id))
        .filter(size_condition(order_item::Column::SizeId, size_id))
        .one(db)
        .await?;

    match existing {
        Some(item) => {
            let quantity = item
                .quantity
                .checked_add(line.quantity)
                .ok_or_else(quantity_too_large)?;
            let mut item: order_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.unit_price = Set(line.unit_price);
            Ok(item.update(db).await?)
        }
        None => Ok(order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(line.product.id),
            color_id: Set(line.variant.color.id),
            size_id: Set(size_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            ..Default::default()
        }
        .insert(db)
        .await?),
    }
}

/// Recomputes an order's total and description from all of its items.
pub async fn refresh_order_totals<C: ConnectionTrait>(
    db: &C,
    order: order::Model,
) -> Result<order::Model, DbErr> {
    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(db)
        .await?;

    let product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
    let names: HashMap<i32, String> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product.name))
        .collect();

    let total = items
        .iter()
        .map(|item| pricing::line_total(item.unit_price, item.quantity))
        .sum::<Decimal>();
    let description: Vec<String> = items
        .iter()
        .filter_map(|item| names.get(&item.product_id).cloned())
        .collect();

    let mut order: order::ActiveModel = order.into();
    order.total_price = Set(pricing::round_money(total));
    order.product_description = Set(if description.is_empty() {
        None
    } else {
        Some(description.join(", "))
    });
    order.update(db).await
}
