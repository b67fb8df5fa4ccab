use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{
    brand, cart, cart_item, category, color, customer_profile, device_model,
    image::image_url, order, order_item, product, product_color_image, product_color_size, reply,
    review, review_like, shop_inventory, size, user, wishlist, wishlist_product,
};
use crate::services::{inventory, pricing};

#[derive(Clone, Serialize)]
pub struct SizeStockResponse {
    pub id: i32,
    pub size_name: String,
    pub stock: i32,
}

#[derive(Clone, Serialize)]
pub struct ColorImageResponse {
    pub id: i32,
    pub color_name: String,
    pub color_code: String,
    pub image: Option<String>,
    pub stock: i32,
    pub sizes: Vec<SizeStockResponse>,
}

#[derive(Clone, Serialize)]
pub struct ReplyResponse {
    pub id: i32,
    pub user: i32,
    pub reply_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Serialize)]
pub struct ReviewResponse {
    pub id: i32,
    pub product: i32,
    pub user: i32,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub like_count: usize,
    pub replies: Vec<ReplyResponse>,
}

#[derive(Clone, Serialize)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub make_by: String,
    pub rating: Decimal,
    pub discount: Decimal,
    pub stock: i32,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub image3: Option<String>,
    pub category: Option<category::Model>,
    pub brand: Option<brand::Model>,
    pub device_model: Option<device_model::Model>,
    pub reviews: Vec<ReviewResponse>,
    pub final_price: Decimal,
    pub color_images: Vec<ColorImageResponse>,
    pub created_by_shop: Option<i32>,
}

pub async fn color_image_responses<C: ConnectionTrait>(
    db: &C,
    color_images: Vec<product_color_image::Model>,
) -> Result<Vec<ColorImageResponse>, DbErr> {
    let color_ids: Vec<i32> = color_images.iter().map(|ci| ci.color_id).collect();
    let colors: HashMap<i32, color::Model> = color::Entity::find()
        .filter(color::Column::Id.is_in(color_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|color| (color.id, color))
        .collect();

    let image_ids: Vec<i32> = color_images.iter().map(|ci| ci.id).collect();
    let mut sizes: HashMap<i32, Vec<SizeStockResponse>> = HashMap::new();
    for (entry, size) in product_color_size::Entity::find()
        .filter(product_color_size::Column::ProductColorImageId.is_in(image_ids))
        .order_by_asc(product_color_size::Column::Id)
        .find_also_related(size::Entity)
        .all(db)
        .await?
    {
        sizes
            .entry(entry.product_color_image_id)
            .or_default()
            .push(SizeStockResponse {
                id: entry.id,
                size_name: size.map(|size| size.name).unwrap_or_default(),
                stock: entry.stock,
            });
    }

    Ok(color_images
        .into_iter()
        .map(|ci| {
            let color = colors.get(&ci.color_id);
            ColorImageResponse {
                id: ci.id,
                color_name: color.map(|c| c.color_name.clone()).unwrap_or_default(),
                color_code: color.map(|c| c.color_code.clone()).unwrap_or_default(),
                image: ci.image_id.map(image_url),
                stock: ci.stock,
                sizes: sizes.remove(&ci.id).unwrap_or_default(),
            }
        })
        .collect())
}

pub async fn review_responses<C: ConnectionTrait>(
    db: &C,
    reviews: Vec<review::Model>,
) -> Result<Vec<ReviewResponse>, DbErr> {
    let review_ids: Vec<i32> = reviews.iter().map(|review| review.id).collect();

    let mut likes: HashMap<i32, usize> = HashMap::new();
    for like in review_like::Entity::find()
        .filter(review_like::Column::ReviewId.is_in(review_ids.clone()))
        .all(db)
        .await?
    {
        *likes.entry(like.review_id).or_default() += 1;
    }

    let mut replies: HashMap<i32, Vec<ReplyResponse>> = HashMap::new();
    for reply in reply::Entity::find()
        .filter(reply::Column::ReviewId.is_in(review_ids))
        .order_by_asc(reply::Column::CreatedAt)
        .all(db)
        .await?
    {
        replies.entry(reply.review_id).or_default().push(ReplyResponse {
            id: reply.id,
            user: reply.user_id,
            reply_text: reply.reply_text,
            created_at: reply.created_at,
        });
    }

    Ok(reviews
        .into_iter()
        .map(|review| ReviewResponse {
            like_count: likes.get(&review.id).copied().unwrap_or(0),
            replies: replies.remove(&review.id).unwrap_or_default(),
            id: review.id,
            product: review.product_id,
            user: review.user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: review.created_at,
        })
        .collect())
}

async fn lookup<C, E>(db: &C, ids: Vec<i32>, column: E::Column) -> Result<Vec<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    E::find().filter(column.is_in(ids)).all(db).await
}

/// Loads everything the product JSON nests, in a fixed number of queries.
pub async fn product_responses<C: ConnectionTrait>(
    db: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductResponse>, DbErr> {
    let product_ids: Vec<i32> = products.iter().map(|p| p.id).collect();

    let categories: HashMap<i32, category::Model> = lookup::<_, category::Entity>(
        db,
        products.iter().filter_map(|p| p.category_id).collect(),
        category::Column::Id,
    )
    .await?
    .into_iter()
    .map(|c| (c.id, c))
    .collect();
    let brands: HashMap<i32, brand::Model> = lookup::<_, brand::Entity>(
        db,
        products.iter().filter_map(|p| p.brand_id).collect(),
        brand::Column::Id,
    )
    .await?
    .into_iter()
    .map(|b| (b.id, b))
    .collect();
    let device_models: HashMap<i32, device_model::Model> = lookup::<_, device_model::Entity>(
        db,
        products.iter().filter_map(|p| p.device_model_id).collect(),
        device_model::Column::Id,
    )
    .await?
    .into_iter()
    .map(|d| (d.id, d))
    .collect();

    let color_images = product_color_image::Entity::find()
        .filter(product_color_image::Column::ProductId.is_in(product_ids.clone()))
        .order_by_asc(product_color_image::Column::Id)
        .all(db)
        .await?;
    let mut color_images_by_product: HashMap<i32, Vec<ColorImageResponse>> = HashMap::new();
    let owners: Vec<i32> = color_images.iter().map(|ci| ci.product_id).collect();
    for (product_id, response) in owners
        .into_iter()
        .zip(color_image_responses(db, color_images).await?)
    {
        color_images_by_product
            .entry(product_id)
            .or_default()
            .push(response);
    }

    let reviews = review::Entity::find()
        .filter(review::Column::ProductId.is_in(product_ids))
        .order_by_asc(review::Column::Id)
        .all(db)
        .await?;
    let mut reviews_by_product: HashMap<i32, Vec<ReviewResponse>> = HashMap::new();
    for response in review_responses(db, reviews).await? {
        reviews_by_product
            .entry(response.product)
            .or_default()
            .push(response);
    }

    Ok(products
        .into_iter()
        .map(|product| {
            let color_images = color_images_by_product.remove(&product.id).unwrap_or_default();
            let mut images = color_images.iter().map(|ci| ci.image.clone());
            ProductResponse {
                id: product.id,
                image1: images.next().flatten(),
                image2: images.next().flatten(),
                image3: images.next().flatten(),
                category: product.category_id.and_then(|id| categories.get(&id).cloned()),
                brand: product.brand_id.and_then(|id| brands.get(&id).cloned()),
                device_model: product
                    .device_model_id
                    .and_then(|id| device_models.get(&id).cloned()),
                reviews: reviews_by_product.remove(&product.id).unwrap_or_default(),
                final_price: product.final_price(),
                created_by_shop: product.created_by_shop_id,
                name: product.name,
                description: product.description,
                price: product.price,
                make_by: product.make_by,
                rating: product.rating,
                discount: product.discount,
                stock: product.stock,
                color_images,
            }
        })
        .collect())
}

pub async fn product_response<C: ConnectionTrait>(
    db: &C,
    product: product::Model,
) -> Result<ProductResponse, DbErr> {
    let mut responses = product_responses(db, vec![product]).await?;
    responses
        .pop()
        .ok_or_else(|| DbErr::Custom("product response went missing".to_owned()))
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub id: i32,
    pub user: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl ProfileResponse {
    pub fn new(profile: customer_profile::Model, user: &user::Model) -> Self {
        ProfileResponse {
            id: profile.id,
            user: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: profile.phone_number,
            address: profile.address,
            city: profile.city,
            postal_code: profile.postal_code,
        }
    }
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: i32,
    pub product: i32,
    pub product_name: String,
    pub color: i32,
    pub color_name: String,
    pub size_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: i32,
    pub customer: i32,
    pub total_price: Decimal,
    pub product_description: Option<String>,
    pub cart_date: DateTime<Utc>,
    pub cart_items: Vec<CartItemResponse>,
}

async fn names_by_id<C: ConnectionTrait>(
    db: &C,
    product_ids: Vec<i32>,
    color_ids: Vec<i32>,
    size_ids: Vec<i32>,
) -> Result<(HashMap<i32, product::Model>, HashMap<i32, String>, HashMap<i32, String>), DbErr> {
    let products = lookup::<_, product::Entity>(db, product_ids, product::Column::Id)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let colors = lookup::<_, color::Entity>(db, color_ids, color::Column::Id)
        .await?
        .into_iter()
        .map(|c| (c.id, c.color_name))
        .collect();
    let sizes = lookup::<_, size::Entity>(db, size_ids, size::Column::Id)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();
    Ok((products, colors, sizes))
}

pub async fn cart_response<C: ConnectionTrait>(db: &C, cart: cart::Model) -> Result<CartResponse, DbErr> {
    let items = cart_item::Entity::find()
        .filter(cart_item::Column::CartId.eq(cart.id))
        .order_by_asc(cart_item::Column::Id)
        .all(db)
        .await?;

    let (products, colors, sizes) = names_by_id(
        db,
        items.iter().map(|i| i.product_id).collect(),
        items.iter().map(|i| i.color_id).collect(),
        items.iter().filter_map(|i| i.size_id).collect(),
    )
    .await?;

    let mut listings: HashMap<i32, Option<shop_inventory::Model>> = HashMap::new();
    for product in products.values() {
        listings.insert(product.id, inventory::owning_listing(db, product).await?);
    }

    let cart_items = items
        .into_iter()
        .map(|item| {
            let product = products.get(&item.product_id);
            let unit_price = product
                .map(|p| {
                    inventory::unit_price(p, listings.get(&p.id).and_then(|listing| listing.as_ref()))
                })
                .unwrap_or_default();
            CartItemResponse {
                id: item.id,
                product: item.product_id,
                product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                color: item.color_id,
                color_name: colors.get(&item.color_id).cloned().unwrap_or_default(),
                size_name: item.size_id.and_then(|id| sizes.get(&id).cloned()),
                quantity: item.quantity,
                line_total: pricing::line_total(unit_price, item.quantity),
                unit_price,
            }
        })
        .collect();

    Ok(CartResponse {
        id: cart.id,
        customer: cart.customer_id,
        total_price: pricing::round_money(cart.total_price),
        product_description: cart.product_description,
        cart_date: cart.cart_date,
        cart_items,
    })
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub id: i32,
    pub product: i32,
    pub product_name: String,
    pub color_name: String,
    pub size_name: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub customer: i32,
    pub shop: Option<i32>,
    pub order_items: Vec<OrderItemResponse>,
    pub total_price: Decimal,
    pub status: order::Status,
    pub order_date: DateTime<Utc>,
    pub product_description: Option<String>,
}

pub async fn order_responses<C: ConnectionTrait>(
    db: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderResponse>, DbErr> {
    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let items = lookup::<_, order_item::Entity>(db, order_ids, order_item::Column::OrderId).await?;

    let (products, colors, sizes) = names_by_id(
        db,
        items.iter().map(|i| i.product_id).collect(),
        items.iter().map(|i| i.color_id).collect(),
        items.iter().filter_map(|i| i.size_id).collect(),
    )
    .await?;

    let mut items_by_order: HashMap<i32, Vec<OrderItemResponse>> = HashMap::new();
    for item in items {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemResponse {
                id: item.id,
                product: item.product_id,
                product_name: products
                    .get(&item.product_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                color_name: colors.get(&item.color_id).cloned().unwrap_or_default(),
                size_name: item.size_id.and_then(|id| sizes.get(&id).cloned()),
                quantity: item.quantity,
                unit_price: pricing::round_money(item.unit_price),
            });
    }

    Ok(orders
        .into_iter()
        .map(|order| OrderResponse {
            order_items: items_by_order.remove(&order.id).unwrap_or_default(),
            id: order.id,
            customer: order.customer_id,
            shop: order.shop_id,
            total_price: pricing::round_money(order.total_price),
            status: order.status,
            order_date: order.order_date,
            product_description: order.product_description,
        })
        .collect())
}

#[derive(Serialize)]
pub struct WishlistResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub customer: Option<i32>,
    pub products: Vec<ProductResponse>,
}

pub async fn wishlist_responses<C: ConnectionTrait>(
    db: &C,
    wishlists: Vec<wishlist::Model>,
) -> Result<Vec<WishlistResponse>, DbErr> {
    let links = lookup::<_, wishlist_product::Entity>(
        db,
        wishlists.iter().map(|w| w.id).collect(),
        wishlist_product::Column::WishlistId,
    )
    .await?;

    let products = lookup::<_, product::Entity>(
        db,
        links.iter().map(|link| link.product_id).collect(),
        product::Column::Id,
    )
    .await?;
    let products: HashMap<i32, ProductResponse> = product_responses(db, products)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut products_by_wishlist: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in links {
        products_by_wishlist
            .entry(link.wishlist_id)
            .or_default()
            .push(link.product_id);
    }

    Ok(wishlists
        .into_iter()
        .map(|wishlist| {
            let mut product_ids = products_by_wishlist.remove(&wishlist.id).unwrap_or_default();
            product_ids.sort_unstable();
            WishlistResponse {
                products: product_ids
                    .iter()
                    .filter_map(|id| products.get(id))
                    .map(ProductResponse::clone)
                    .collect(),
                id: wishlist.id,
                name: wishlist.name,
                description: wishlist.description,
                created_at: wishlist.created_at,
                customer: wishlist.customer_id,
            }
        })
        .collect())
}
