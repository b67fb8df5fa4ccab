use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
    Set,
};

use crate::entities::{product, review};
use crate::services::pricing;

/// Stores the average of the product's review ratings on the product row.
pub async fn refresh_product_rating<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
) -> Result<Decimal, DbErr> {
    let ratings: Vec<i32> = review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::ProductId.eq(product_id))
        .into_tuple()
        .all(db)
        .await?;
    let average = pricing::average_rating(&ratings);

    product::ActiveModel {
        id: Set(product_id),
        rating: Set(average),
        ..Default::default()
    }
    .update(db)
    .await?;

    Ok(average)
}
