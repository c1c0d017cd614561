use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{product, wishlist_item};
use crate::errors::ServiceError;

/// Wishlist membership with the catalog row it points at. `product` is
/// `None` when the product has since been removed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub product: Option<product::Model>,
}

pub struct WishlistService {
    db: DbPool,
}

impl WishlistService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Add a product to the wishlist. Idempotent: when the membership
    /// already exists, the existing row comes back untouched and no
    /// duplicate is created.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<wishlist_item::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if let Some(existing) = wishlist_item::Entity::find()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .filter(wishlist_item::Column::ProductId.eq(product_id))
            .one(&self.db)
            .await?
        {
            debug!(item_id = %existing.id, "wishlist membership already present");
            return Ok(existing);
        }

        let model = wishlist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            product_id: Set(product_id),
            created_at: Set(chrono::Utc::now()),
        };
        let saved = model.insert(&self.db).await?;
        info!(item_id = %saved.id, "wishlist item added");
        Ok(saved)
    }

    /// Remove an item. Scoped to the owner: someone else's item is a 404.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn remove(&self, user_id: Uuid, item_id: Uuid) -> Result<(), ServiceError> {
        let found = wishlist_item::Entity::find_by_id(item_id)
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Wishlist item {} not found", item_id))
            })?;

        found.delete(&self.db).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>, ServiceError> {
        let rows = wishlist_item::Entity::find()
            .filter(wishlist_item::Column::UserId.eq(user_id))
            .order_by_desc(wishlist_item::Column::CreatedAt)
            .find_also_related(product::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| WishlistEntry {
                id: item.id,
                product_id: item.product_id,
                created_at: item.created_at,
                product,
            })
            .collect())
    }
}
