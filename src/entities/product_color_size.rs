use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "product_color_size")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_color_image_id: i32,
    pub size_id: i32,
    pub stock: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product_color_image::Entity",
        from = "Column::ProductColorImageId",
        to = "super::product_color_image::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ProductColorImage,
    #[sea_orm(
        belongs_to = "super::size::Entity",
        from = "Column::SizeId",
        to = "super::size::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Size,
}

impl Related<super::product_color_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductColorImage.def()
    }
}

impl Related<super::size::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Size.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
