use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::daily_sales;
use crate::errors::ApiError;
use crate::handlers::common::{map_service_error, success_response};
use crate::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Calendar day to report on; defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// How many days back to include; defaults to 7.
    pub days: Option<i64>,
}

/// Rollup for one day. A day with no sales reports a zero amount.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DailySalesResponse {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl From<daily_sales::Model> for DailySalesResponse {
    fn from(model: daily_sales::Model) -> Self {
        Self {
            date: model.date,
            amount: model.amount,
        }
    }
}

/// Sales rollup for a single day.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Daily sales total", body = DailySalesResponse)
    ),
    tag = "analytics"
)]
pub async fn daily_total(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let row = state
        .services
        .sales
        .daily_total(date)
        .await
        .map_err(map_service_error)?;

    let response = row.map(DailySalesResponse::from).unwrap_or(DailySalesResponse {
        date,
        amount: Decimal::ZERO,
    });
    Ok(success_response(response))
}

/// Sales rollups for the last N days, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/daily/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Recent daily totals", body = [DailySalesResponse])
    ),
    tag = "analytics"
)]
pub async fn recent_totals(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query.days.unwrap_or(7);
    let rows = state
        .services
        .sales
        .recent_totals(days)
        .await
        .map_err(map_service_error)?;

    let response: Vec<DailySalesResponse> =
        rows.into_iter().map(DailySalesResponse::from).collect();
    Ok(success_response(response))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/daily", get(daily_total))
        .route("/daily/recent", get(recent_totals))
}
