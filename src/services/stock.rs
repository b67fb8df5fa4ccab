use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, Select,
};
use tracing::debug;

use crate::entities::{color, product, product_color_image, product_color_size, size};
use crate::middleware::logging::ApiError;

/// The record a purchase draws stock from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StockKey {
    Color(i32),
    Size(i32),
}

#[derive(Clone, Debug)]
pub struct SizeStock {
    pub size: size::Model,
    pub entry: product_color_size::Model,
}

/// A product variant resolved from a color name and an optional size name.
#[derive(Clone, Debug)]
pub struct Variant {
    pub color: color::Model,
    pub color_image: product_color_image::Model,
    pub size: Option<SizeStock>,
}

impl Variant {
    pub fn available(&self) -> i32 {
        match &self.size {
            Some(size) => size.entry.stock,
            None => self.color_image.stock,
        }
    }

    pub fn size_id(&self) -> Option<i32> {
        self.size.as_ref().map(|size| size.size.id)
    }

    pub fn size_name(&self) -> Option<&str> {
        self.size.as_ref().map(|size| size.size.name.as_str())
    }

    pub fn key(&self) -> StockKey {
        match &self.size {
            Some(size) => StockKey::Size(size.entry.id),
            None => StockKey::Color(self.color_image.id),
        }
    }

    pub fn label(&self) -> String {
        match self.size_name() {
            Some(size) => format!("{} - {}", self.color.color_name, size),
            None => self.color.color_name.clone(),
        }
    }
}

pub async fn find_color<C: ConnectionTrait>(db: &C, color_name: &str) -> Result<color::Model, ApiError> {
    color::Entity::find()
        .filter(color::Column::ColorName.eq(color_name.trim()))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::bad_request(format!("Color {} not found.", color_name.trim())))
}

/// Size rows of a color image. Locked without the size join: PostgreSQL
/// refuses FOR UPDATE on the nullable side of an outer join.
fn size_entries(color_image_id: i32, lock: bool) -> Select<product_color_size::Entity> {
    let query = product_color_size::Entity::find()
        .filter(product_color_size::Column::ProductColorImageId.eq(color_image_id));
    if lock {
        query.lock_exclusive()
    } else {
        query
    }
}

/// Resolves the stock record for `color_name`/`size_name` of a product.
/// A size is required exactly when the color image has size rows.
/// With `lock` the rows are selected `FOR UPDATE`.
pub async fn resolve_variant<C: ConnectionTrait>(
    db: &C,
    product: &product::Model,
    color_name: &str,
    size_name: Option<&str>,
    lock: bool,
) -> Result<Variant, ApiError> {
    let color = find_color(db, color_name).await?;

    let mut query = product_color_image::Entity::find()
        .filter(product_color_image::Column::ProductId.eq(product.id))
        .filter(product_color_image::Column::ColorId.eq(color.id));
    if lock {
        query = query.lock_exclusive();
    }
    let color_image = query.one(db).await?.ok_or_else(|| {
        ApiError::bad_request(format!(
            "No stock entry for {} - {}.",
            product.name, color.color_name
        ))
    })?;

    let entries = size_entries(color_image.id, lock).all(db).await?;

    if entries.is_empty() {
        return Ok(Variant {
            color,
            color_image,
            size: None,
        });
    }

    let Some(size_name) = size_name else {
        return Err(ApiError::bad_request(format!(
            "Size required for {} - {}.",
            product.name, color.color_name
        )));
    };

    let size_ids: Vec<i32> = entries.iter().map(|entry| entry.size_id).collect();
    let sizes = size::Entity::find()
        .filter(size::Column::Id.is_in(size_ids))
        .all(db)
        .await?;

    let found = sizes
        .into_iter()
        .find(|size| size.name.eq_ignore_ascii_case(size_name))
        .and_then(|size| {
            entries
                .into_iter()
                .find(|entry| entry.size_id == size.id)
                .map(|entry| SizeStock { size, entry })
        });

    match found {
        Some(size) => Ok(Variant {
            color,
            color_image,
            size: Some(size),
        }),
        None => Err(ApiError::bad_request(format!(
            "No size '{}' for {} - {}.",
            size_name, product.name, color.color_name
        ))),
    }
}

/// Sums stock counts without wrapping; totals past `i32::MAX` are rejected.
fn stock_total(counts: impl Iterator<Item = i32>) -> Result<i32, ApiError> {
    let total: i64 = counts.map(i64::from).sum();
    i32::try_from(total).map_err(|_| ApiError::bad_request("Total stock is too large."))
}

/// Sets a color image's stock to the sum of its sizes (0 without sizes).
pub async fn recompute_color_stock<C: ConnectionTrait>(db: &C, color_image_id: i32) -> Result<i32, ApiError> {
    let entries = product_color_size::Entity::find()
        .filter(product_color_size::Column::ProductColorImageId.eq(color_image_id))
        .all(db)
        .await?;
    let total = stock_total(entries.iter().map(|entry| entry.stock))?;

    product_color_image::Entity::update_many()
        .col_expr(product_color_image::Column::Stock, Expr::value(total))
        .filter(product_color_image::Column::Id.eq(color_image_id))
        .exec(db)
        .await?;

    debug!(color_image_id, total, "Recomputed color stock");
    Ok(total)
}

/// Sets a product's stock to the sum of its color image stocks.
pub async fn recompute_product_stock<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<i32, ApiError> {
    let color_images = product_color_image::Entity::find()
        .filter(product_color_image::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    let total = stock_total(color_images.iter().map(|color_image| color_image.stock))?;

    product::Entity::update_many()
        .col_expr(product::Column::Stock, Expr::value(total))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    debug!(product_id, total, "Recomputed product stock");
    Ok(total)
}

/// Propagates a size row change up to the color image and the product.
pub async fn sync_after_size_change<C: ConnectionTrait>(db: &C, color_image_id: i32) -> Result<(), ApiError> {
    recompute_color_stock(db, color_image_id).await?;
    if let Some(color_image) = product_color_image::Entity::find_by_id(color_image_id).one(db).await? {
        recompute_product_stock(db, color_image.product_id).await?;
    }
    Ok(())
}

/// Takes `quantity` units from the variant's stock record and refreshes the
/// derived counters.
pub async fn decrement<C: ConnectionTrait>(db: &C, variant: &Variant, quantity: i32) -> Result<(), ApiError> {
    match &variant.size {
        Some(size) => {
            product_color_size::Entity::update_many()
                .col_expr(
                    product_color_size::Column::Stock,
                    Expr::col(product_color_size::Column::Stock).sub(quantity),
                )
                .filter(product_color_size::Column::Id.eq(size.entry.id))
                .exec(db)
                .await?;
            recompute_color_stock(db, variant.color_image.id).await?;
        }
        None => {
            product_color_image::Entity::update_many()
                .col_expr(
                    product_color_image::Column::Stock,
                    Expr::col(product_color_image::Column::Stock).sub(quantity),
                )
                .filter(product_color_image::Column::Id.eq(variant.color_image.id))
                .exec(db)
                .await?;
        }
    }
    recompute_product_stock(db, variant.color_image.product_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn locked_size_rows_skip_the_join() {
        let sql = size_entries(3, true).build(DbBackend::Postgres).to_string();
        assert!(sql.ends_with("FOR UPDATE"), "{sql}");
        assert!(!sql.contains("JOIN"), "{sql}");

        let sql = size_entries(3, false).build(DbBackend::Postgres).to_string();
        assert!(!sql.contains("FOR UPDATE"), "{sql}");
    }

    #[test]
    fn stock_total_sums_without_wrapping() {
        assert_eq!(stock_total([2, 5, 0].into_iter()).ok(), Some(7));
        assert_eq!(stock_total(std::iter::empty()).ok(), Some(0));
        assert!(stock_total([i32::MAX, 1].into_iter()).is_err());
    }
}
