use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::entities::menu_item;
use crate::errors::ServiceError;

/// Read-only access to the menu. Rows are managed by back-office tooling.
#[derive(Clone)]
pub struct MenuService {
    db: Arc<DatabaseConnection>,
}

impl MenuService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Full menu, id ascending.
    #[instrument(skip(self))]
    pub async fn list_menu(&self) -> Result<Vec<menu_item::Model>, ServiceError> {
        menu_item::Entity::find()
            .order_by_asc(menu_item::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to list menu items: {}", e);
                ServiceError::DatabaseError(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<menu_item::Model, ServiceError> {
        menu_item::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to fetch menu item {}: {}", id, e);
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {} not found", id)))
    }

    /// Distinct category names, alphabetical.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<String>, ServiceError> {
        menu_item::Entity::find()
            .select_only()
            .column(menu_item::Column::Category)
            .distinct()
            .order_by_asc(menu_item::Column::Category)
            .into_tuple::<String>()
            .all(&*self.db)
            .await
            .map_err(|e| {
                error!("Failed to list menu categories: {}", e);
                ServiceError::DatabaseError(e)
            })
    }
}
