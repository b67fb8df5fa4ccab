use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::services::pricing;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub make_by: String,
    #[sea_orm(column_type = "Decimal(Some((2, 1)))")]
    pub rating: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub discount: Decimal,
    // Sum of the color image stocks, never written directly.
    pub stock: i32,
    pub category_id: Option<i32>,
    pub brand_id: Option<i32>,
    pub device_model_id: Option<i32>,
    pub created_by_shop_id: Option<i32>,
}

impl Model {
    pub fn final_price(&self) -> Decimal {
        pricing::final_price(self.price, self.discount)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::brand::Entity",
        from = "Column::BrandId",
        to = "super::brand::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Brand,
    #[sea_orm(
        belongs_to = "super::device_model::Entity",
        from = "Column::DeviceModelId",
        to = "super::device_model::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    DeviceModel,
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::CreatedByShopId",
        to = "super::shop::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Shop,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::brand::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Brand.def()
    }
}

impl Related<super::device_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeviceModel.def()
    }
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
