use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A submitted order: a frozen cart snapshot tied to a table number.
///
/// `item_info` holds the cart lines serialized at submission time; later
/// cart mutations never touch it. Lifecycle: unpaid -> paid -> completed,
/// or deleted while still unpaid.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub table_number: String,
    #[sea_orm(column_type = "Json")]
    pub item_info: Json,
    pub payment_done: bool,
    pub order_done: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
