use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::responses::{
    color_image_responses, product_response, product_responses, review_responses, ProductResponse,
};
use crate::entities::{order_item, product, product_color_image, review};
use crate::middleware::logging::{ApiError, ApiResult};

const SEARCH_PAGE_SIZE: u64 = 10;
const BEST_SELLING_LIMIT: usize = 5;
const LIKE_ESCAPE: char = '!';

/// Makes `%` and `_` in user input match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

pub fn product_router() -> Router {
    Router::new()
        .route("/products", get(get_products))
        .route("/products/:id", get(get_product))
        .route("/products/name/:name", get(get_product_by_name))
        .route("/products/:id/reviews", get(get_product_reviews))
        .route("/products/:id/color-images", get(get_product_color_images))
        .route("/search", get(search_products))
        .route("/popular_products", get(popular_products))
        .route("/best_selling_products", get(best_selling_products))
}

/// `"All"`, blank and unparsable values mean no filter.
fn id_filter(value: Option<&str>) -> Option<i32> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "All")
        .and_then(|value| value.parse().ok())
}

async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let mut select = product::Entity::find().order_by_asc(product::Column::Id);

    if let Some(id) = id_filter(params.category_id.as_deref()) {
        select = select.filter(product::Column::CategoryId.eq(id));
    }
    if let Some(id) = id_filter(params.brand_id.as_deref()) {
        select = select.filter(product::Column::BrandId.eq(id));
    }
    if let Some(id) = id_filter(params.device_model_id.as_deref()) {
        select = select.filter(product::Column::DeviceModelId.eq(id));
    }

    let products = select.all(&*db).await?;
    let response = product_responses(&*db, products).await?;

    Ok((StatusCode::OK, Json(response)).into_response())
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let product = product::Entity::find_by_id(id)
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No product with {id} id was found.")))?;

    Ok((StatusCode::OK, Json(product_response(&*db, product).await?)).into_response())
}

async fn get_product_by_name(
    Path(name): Path<String>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let product = product::Entity::find()
        .filter(product::Column::Name.eq(name.as_str()))
        .one(&*db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok((StatusCode::OK, Json(product_response(&*db, product).await?)).into_response())
}

async fn get_product_reviews(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let reviews = review::Entity::find()
        .filter(review::Column::ProductId.eq(id))
        .order_by_asc(review::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(review_responses(&*db, reviews).await?)).into_response())
}

async fn get_product_color_images(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let color_images = product_color_image::Entity::find()
        .filter(product_color_image::Column::ProductId.eq(id))
        .order_by_asc(product_color_image::Column::Id)
        .all(&*db)
        .await?;

    Ok((StatusCode::OK, Json(color_image_responses(&*db, color_images).await?)).into_response())
}

/// Case-insensitive prefix match on the name, substring match on the
/// description.
async fn search_products(
    Query(params): Query<SearchQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> ApiResult {
    let query = params.q.unwrap_or_default().trim().to_lowercase();
    if query.is_empty() {
        return Err(ApiError::bad_request("Search query cannot be empty."));
    }

    let term = escape_like(&query);
    let condition = Condition::any()
        .add(
            Expr::expr(Func::lower(Expr::col(product::Column::Name)))
                .like(LikeExpr::new(format!("{term}%")).escape(LIKE_ESCAPE)),
        )
        .add(
            Expr::expr(Func::lower(Expr::col(product::Column::Description)))
                .like(LikeExpr::new(format!("%{term}%")).escape(LIKE_ESCAPE)),
        );

    let paginator = product::Entity::find()
        .filter(condition)
        .order_by_asc(product::Column::Id)
        .paginate(&*db, SEARCH_PAGE_SIZE);

    let total_pages = paginator.num_pages().await?.max(1);
    let current_page = params
        .page
        .as_deref()
        .and_then(|page| page.trim().parse::<u64>().ok())
        .unwrap_or(1)
        .clamp(1, total_pages);

    let products = paginator.fetch_page(current_page - 1).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "products": product_responses(&*db, products).await?,
            "total_pages": total_pages,
            "current_page": current_page
        })),
    )
        .into_response())
}

async fn order_counts(db: &DatabaseConnection) -> Result<(HashMap<i32, i64>, HashMap<i32, i64>), ApiError> {
    let mut lines: HashMap<i32, i64> = HashMap::new();
    let mut quantities: HashMap<i32, i64> = HashMap::new();
    for item in order_item::Entity::find().all(db).await? {
        *lines.entry(item.product_id).or_default() += 1;
        *quantities.entry(item.product_id).or_default() += i64::from(item.quantity);
    }
    Ok((lines, quantities))
}

/// All products, most frequently ordered first.
async fn popular_products(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let (lines, _) = order_counts(&db).await?;

    let mut products = product::Entity::find()
        .order_by_asc(product::Column::Id)
        .all(&*db)
        .await?;
    products.sort_by_key(|product| std::cmp::Reverse(lines.get(&product.id).copied().unwrap_or(0)));

    Ok((StatusCode::OK, Json(product_responses(&*db, products).await?)).into_response())
}

async fn best_selling_products(Extension(db): Extension<Arc<DatabaseConnection>>) -> ApiResult {
    let (_, quantities) = order_counts(&db).await?;

    let mut ranked: Vec<(i32, i64)> = quantities.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(BEST_SELLING_LIMIT);

    let ids: Vec<i32> = ranked.iter().map(|(id, _)| *id).collect();
    let products = product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(&*db)
        .await?;
    let mut by_id: HashMap<i32, ProductResponse> = product_responses(&*db, products)
        .await?
        .into_iter()
        .map(|response| (response.id, response))
        .collect();

    let response: Vec<BestSellingResponse> = ranked
        .into_iter()
        .filter_map(|(id, total_quantity_sold)| {
            by_id.remove(&id).map(|product| BestSellingResponse {
                product,
                total_quantity_sold,
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[derive(Deserialize)]
struct GetProductsQuery {
    category_id: Option<String>,
    brand_id: Option<String>,
    device_model_id: Option<String>,
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
    page: Option<String>,
}

#[derive(Serialize)]
struct BestSellingResponse {
    #[serde(flatten)]
    product: ProductResponse,
    total_quantity_sold: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_means_no_filter() {
        assert_eq!(id_filter(Some("All")), None);
        assert_eq!(id_filter(Some("")), None);
        assert_eq!(id_filter(Some("abc")), None);
        assert_eq!(id_filter(Some(" 4 ")), Some(4));
        assert_eq!(id_filter(None), None);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        assert_eq!(escape_like("case"), "case");
    }
}
