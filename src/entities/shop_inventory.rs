use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::entities::product;
use crate::services::pricing;

/// Per-shop overrides of a product's price, discount, stock and availability.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "shop_inventory")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub shop_id: i32,
    pub product_id: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub custom_price: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))", nullable)]
    pub custom_discount: Option<Decimal>,
    pub custom_stock: Option<i32>,
    pub available: bool,
}

impl Model {
    pub fn price(&self, product: &product::Model) -> Decimal {
        self.custom_price.unwrap_or(product.price)
    }

    pub fn discount(&self, product: &product::Model) -> Decimal {
        self.custom_discount.unwrap_or(product.discount)
    }

    pub fn stock(&self, product: &product::Model) -> i32 {
        self.custom_stock.unwrap_or(product.stock)
    }

    pub fn final_price(&self, product: &product::Model) -> Decimal {
        pricing::final_price(self.price(product), self.discount(product))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::ShopId",
        to = "super::shop::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Shop,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
