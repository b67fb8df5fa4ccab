use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entities::{order, role_permission::Permission};
use crate::middleware::auth::Claims;
use crate::middleware::logging::ApiResult;
use crate::services::{access::Actor, pricing};

pub fn admin_sales_router() -> Router {
    Router::new().route("/sales-summary", get(sales_summary))
}

#[derive(Debug, PartialEq, Serialize)]
struct SalesSummary {
    labels: Vec<String>,
    totals: Vec<Decimal>,
    total: Decimal,
    order_count: usize,
}

/// Sums order totals per day from the first to the last day with sales,
/// filling the days in between with zero.
fn daily_totals(sales: &[(NaiveDate, Decimal)]) -> Vec<(NaiveDate, Decimal)> {
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (day, amount) in sales {
        *by_day.entry(*day).or_insert(Decimal::ZERO) += *amount;
    }

    let (Some(first), Some(last)) = (
        by_day.keys().next().copied(),
        by_day.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let mut days = Vec::new();
    let mut day = first;
    while day <= last {
        days.push((day, pricing::round_money(by_day.get(&day).copied().unwrap_or(Decimal::ZERO))));
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

fn summarize(sales: &[(NaiveDate, Decimal)]) -> SalesSummary {
    let days = daily_totals(sales);
    SalesSummary {
        labels: days.iter().map(|(day, _)| day.format("%b %d").to_string()).collect(),
        total: pricing::round_money(days.iter().map(|(_, amount)| *amount).sum()),
        totals: days.into_iter().map(|(_, amount)| amount).collect(),
        order_count: sales.len(),
    }
}

async fn sales_summary(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SalesQuery>,
) -> ApiResult {
    let actor = Actor::load(&*db, claims.user_id).await?;

    let orders = actor
        .scope(Permission::ViewSales)?
        .apply(order::Entity::find(), order::Column::ShopId)
        .order_by_asc(order::Column::OrderDate)
        .all(&*db)
        .await?;

    let sales: Vec<(NaiveDate, Decimal)> = orders
        .into_iter()
        .map(|order| (order.order_date.date_naive(), order.total_price))
        .filter(|(day, _)| query.from.map_or(true, |from| *day >= from))
        .filter(|(day, _)| query.to.map_or(true, |to| *day <= to))
        .collect();

    Ok((StatusCode::OK, Json(summarize(&sales))).into_response())
}

#[derive(Deserialize)]
struct SalesQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}
