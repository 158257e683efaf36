use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::entities::daily_sales;
use crate::errors::ServiceError;

/// Maintains the per-day sales rollup.
///
/// `record_sale` is driven by the event loop after an order commits; it must
/// stay failure-isolated from submission, so every error here is reported to
/// the caller but never propagated back to an order.
#[derive(Clone)]
pub struct SalesService {
    db: Arc<DatabaseConnection>,
}

impl SalesService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Adds `amount` to the rollup for `day` (today when `None`), creating
    /// the row on the first sale of the day.
    ///
    /// The increment is a single atomic upsert, so concurrent confirmations
    /// cannot lose updates the way a read-then-write would.
    #[instrument(skip(self))]
    pub async fn record_sale(
        &self,
        amount: Decimal,
        day: Option<NaiveDate>,
    ) -> Result<(), ServiceError> {
        let day = day.unwrap_or_else(|| Utc::now().date_naive());
        let now = Utc::now();

        let row = daily_sales::ActiveModel {
            date: Set(day),
            amount: Set(amount),
            updated_at: Set(now),
        };

        daily_sales::Entity::insert(row)
            .on_conflict(
                OnConflict::column(daily_sales::Column::Date)
                    .value(
                        daily_sales::Column::Amount,
                        Expr::col(daily_sales::Column::Amount).add(amount),
                    )
                    .value(daily_sales::Column::UpdatedAt, Expr::value(now))
                    .to_owned(),
            )
            .exec(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to upsert daily sales for {}: {}", day, e);
                ServiceError::DatabaseError(e)
            })?;

        Ok(())
    }

    /// Rollup row for a single day, if any sale was recorded.
    #[instrument(skip(self))]
    pub async fn daily_total(
        &self,
        day: NaiveDate,
    ) -> Result<Option<daily_sales::Model>, ServiceError> {
        daily_sales::Entity::find_by_id(day)
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to fetch daily sales for {}: {}", day, e);
                ServiceError::DatabaseError(e)
            })
    }

    /// Rollup rows for the last `days` calendar days, newest first.
    #[instrument(skip(self))]
    pub async fn recent_totals(
        &self,
        days: i64,
    ) -> Result<Vec<daily_sales::Model>, ServiceError> {
        let since = Utc::now().date_naive() - Duration::days(days.max(0));

        daily_sales::Entity::find()
            .filter(daily_sales::Column::Date.gte(since))
            .order_by_desc(daily_sales::Column::Date)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to fetch recent daily sales: {}", e);
                ServiceError::DatabaseError(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn record_sale_surfaces_database_errors() {
        let service = SalesService::new(Arc::new(DatabaseConnection::Disconnected));

        let result = service.record_sale(dec!(100), None).await;

        assert!(matches!(result, Err(ServiceError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn daily_total_surfaces_database_errors() {
        let service = SalesService::new(Arc::new(DatabaseConnection::Disconnected));

        let result = service.daily_total(Utc::now().date_naive()).await;

        assert!(result.is_err());
    }
}
