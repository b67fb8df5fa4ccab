use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "about_page_content")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub image_id: Option<i32>,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub history_title: String,
    #[sea_orm(column_type = "Text")]
    pub history_description: String,
    pub customers_title: String,
    pub customers_map_image_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::ImageId",
        to = "super::image::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Image,
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::CustomersMapImageId",
        to = "super::image::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    CustomersMapImage,
}

impl ActiveModelBehavior for ActiveModel {}
