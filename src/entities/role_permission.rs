use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One granted permission of a shop role.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "role_permission")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub permission: Permission,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    enum_name = "permission_enum",
    db_type = "String(StringLen::N(64))",
    rs_type = "String"
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    #[sea_orm(string_value = "manage_products")]
    ManageProducts,
    #[sea_orm(string_value = "manage_inventory")]
    ManageInventory,
    #[sea_orm(string_value = "manage_orders")]
    ManageOrders,
    #[sea_orm(string_value = "manage_reviews")]
    ManageReviews,
    #[sea_orm(string_value = "view_sales")]
    ViewSales,
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manage_products" => Ok(Self::ManageProducts),
            "manage_inventory" => Ok(Self::ManageInventory),
            "manage_orders" => Ok(Self::ManageOrders),
            "manage_reviews" => Ok(Self::ManageReviews),
            "view_sales" => Ok(Self::ViewSales),
            _ => Err(format!("Invalid permission: {}", s)),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::ManageProducts => "manage_products",
            Self::ManageInventory => "manage_inventory",
            Self::ManageOrders => "manage_orders",
            Self::ManageReviews => "manage_reviews",
            Self::ViewSales => "view_sales",
        };
        f.write_str(value)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Role,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
