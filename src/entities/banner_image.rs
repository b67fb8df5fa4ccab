use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "banner_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub banner_id: i32,
    pub image_id: i32,
    pub sort_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::banner::Entity",
        from = "Column::BannerId",
        to = "super::banner::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Banner,
    #[sea_orm(
        belongs_to = "super::image::Entity",
        from = "Column::ImageId",
        to = "super::image::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Image,
}

impl Related<super::banner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Banner.def()
    }
}

impl Related<super::image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Image.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
