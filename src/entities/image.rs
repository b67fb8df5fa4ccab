use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Uploaded media file. Stored on disk under `path_name`, served by id.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub file_name: String,
    #[sea_orm(unique)]
    pub path_name: String,
    pub extension: FileExtension,
}

impl Model {
    pub fn url(&self) -> String {
        image_url(self.id)
    }
}

pub fn image_url(id: i32) -> String {
    format!("/api/store/image/{id}")
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, PartialEq, Debug, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(
    enum_name = "extension_enum",
    db_type = "String(StringLen::N(16))",
    rs_type = "String"
)]
#[serde(rename_all = "lowercase")]
pub enum FileExtension {
    #[sea_orm(string_value = "jpg")]
    Jpg,
    #[sea_orm(string_value = "png")]
    Png,
}

impl FromStr for FileExtension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(FileExtension::Jpg),
            "png" => Ok(FileExtension::Png),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FileExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileExtension::Jpg => f.write_str("jpg"),
            FileExtension::Png => f.write_str("png"),
        }
    }
}
