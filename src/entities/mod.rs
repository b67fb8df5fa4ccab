pub mod about_page;
pub mod banner;
pub mod banner_image;
pub mod blog;
pub mod brand;
pub mod cart;
pub mod cart_item;
pub mod category;
pub mod color;
pub mod customer_profile;
pub mod device_model;
pub mod employee;
pub mod image;
pub mod logo;
pub mod order;
pub mod order_item;
pub mod partner;
pub mod product;
pub mod product_color;
pub mod product_color_image;
pub mod product_color_size;
pub mod reply;
pub mod review;
pub mod review_like;
pub mod role;
pub mod role_permission;
pub mod shop;
pub mod shop_inventory;
pub mod size;
pub mod user;
pub mod wishlist;
pub mod wishlist_product;

use chrono::Utc;
use sea_orm::{
    sea_query::{Index, IndexCreateStatement},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Schema, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

fn unique_index<C: ColumnTrait + Copy>(name: &str, table: impl EntityTrait, columns: &[C]) -> IndexCreateStatement {
    let mut index = Index::create();
    index.name(name).table(table).unique().if_not_exists();
    for column in columns {
        index.col(*column);
    }
    index.to_owned()
}

/// Creates every table that does not exist yet, referenced tables first.
pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, customer_profile::Entity).await?;
    create_table(db, &schema, shop::Entity).await?;
    create_table(db, &schema, role::Entity).await?;
    create_table(db, &schema, role_permission::Entity).await?;
    create_table(db, &schema, employee::Entity).await?;
    create_table(db, &schema, image::Entity).await?;
    create_table(db, &schema, category::Entity).await?;
    create_table(db, &schema, brand::Entity).await?;
    create_table(db, &schema, device_model::Entity).await?;
    create_table(db, &schema, color::Entity).await?;
    create_table(db, &schema, size::Entity).await?;
    create_table(db, &schema, product::Entity).await?;
    create_table(db, &schema, product_color::Entity).await?;
    create_table(db, &schema, product_color_image::Entity).await?;
    create_table(db, &schema, product_color_size::Entity).await?;
    create_table(db, &schema, shop_inventory::Entity).await?;
    create_table(db, &schema, banner::Entity).await?;
    create_table(db, &schema, banner_image::Entity).await?;
    create_table(db, &schema, review::Entity).await?;
    create_table(db, &schema, review_like::Entity).await?;
    create_table(db, &schema, reply::Entity).await?;
    create_table(db, &schema, order::Entity).await?;
    create_table(db, &schema, order_item::Entity).await?;
    create_table(db, &schema, cart::Entity).await?;
    create_table(db, &schema, cart_item::Entity).await?;
    create_table(db, &schema, wishlist::Entity).await?;
    create_table(db, &schema, wishlist_product::Entity).await?;
    create_table(db, &schema, logo::Entity).await?;
    create_table(db, &schema, blog::Entity).await?;
    create_table(db, &schema, partner::Entity).await?;
    create_table(db, &schema, about_page::Entity).await?;

    let backend = db.get_database_backend();
    let indexes = [
        unique_index(
            "idx_role_shop_name",
            role::Entity,
            &[role::Column::ShopId, role::Column::Name],
        ),
        unique_index(
            "idx_color_image_product_color",
            product_color_image::Entity,
            &[
                product_color_image::Column::ProductId,
                product_color_image::Column::ColorId,
            ],
        ),
        unique_index(
            "idx_color_size_image_size",
            product_color_size::Entity,
            &[
                product_color_size::Column::ProductColorImageId,
                product_color_size::Column::SizeId,
            ],
        ),
        unique_index(
            "idx_inventory_shop_product",
            shop_inventory::Entity,
            &[
                shop_inventory::Column::ShopId,
                shop_inventory::Column::ProductId,
            ],
        ),
    ];
    for index in indexes.iter() {
        db.execute(backend.build(index)).await?;
    }

    Ok(())
}

/// Creates the first superuser from the configured credentials.
/// Does nothing once any superuser exists.
pub async fn primary_setup(db: &Arc<DatabaseConnection>, config: &Config) -> Result<(), DbErr> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set, skipping superuser bootstrap");
        return Ok(());
    };

    let txn = db.begin().await?;

    let existing = user::Entity::find()
        .filter(user::Column::IsSuperuser.eq(true))
        .count(&txn)
        .await?;
    if existing > 0 {
        return txn.commit().await;
    }

    let password_hash =
        user::hash_password(password).map_err(|err| DbErr::Custom(err.to_string()))?;

    let admin = user::ActiveModel {
        username: Set(username.clone()),
        email: Set(String::new()),
        password: Set(password_hash),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_staff: Set(true),
        is_superuser: Set(true),
        date_joined: Set(Utc::now()),
        ..Default::default()
    };
    admin.insert(&txn).await?;
    txn.commit().await?;

    info!(username = %username, "Created superuser");
    Ok(())
}
