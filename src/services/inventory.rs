use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::entities::{product, shop_inventory};

/// Inventory row of the shop that created the product, if it has one.
pub async fn owning_listing<C: ConnectionTrait>(
    db: &C,
    product: &product::Model,
) -> Result<Option<shop_inventory::Model>, DbErr> {
    let Some(shop_id) = product.created_by_shop_id else {
        return Ok(None);
    };

    shop_inventory::Entity::find()
        .filter(shop_inventory::Column::ShopId.eq(shop_id))
        .filter(shop_inventory::Column::ProductId.eq(product.id))
        .one(db)
        .await
}

/// Final unit price, with the shop's custom price and discount taking
/// precedence over the product's.
pub fn unit_price(product: &product::Model, listing: Option<&shop_inventory::Model>) -> Decimal {
    match listing {
        Some(listing) => listing.final_price(product),
        None => product.final_price(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product() -> product::Model {
        product::Model {
            id: 1,
            name: "Phone case".to_owned(),
            description: String::new(),
            price: Decimal::from_str("20.00").unwrap(),
            make_by: "Acme".to_owned(),
            rating: Decimal::ZERO,
            discount: Decimal::from_str("10").unwrap(),
            stock: 0,
            category_id: None,
            brand_id: None,
            device_model_id: None,
            created_by_shop_id: Some(1),
        }
    }

    #[test]
    fn listing_overrides_price_and_discount() {
        let product = product();
        assert_eq!(unit_price(&product, None), Decimal::from_str("18.00").unwrap());

        let listing = shop_inventory::Model {
            id: 1,
            shop_id: 1,
            product_id: 1,
            custom_price: Some(Decimal::from_str("30.00").unwrap()),
            custom_discount: None,
            custom_stock: None,
            available: true,
        };
        assert_eq!(unit_price(&product, Some(&listing)), Decimal::from_str("27.00").unwrap());

        let discount_only = shop_inventory::Model {
            custom_price: None,
            custom_discount: Some(Decimal::ZERO),
            ..listing
        };
        assert_eq!(unit_price(&product, Some(&discount_only)), Decimal::from_str("20.00").unwrap());
    }
}
