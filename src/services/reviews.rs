use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{product, review};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReviewInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i16,
    pub comment: Option<String>,
}

pub struct ReviewService {
    db: DbPool,
    event_sender: EventSender,
}

impl ReviewService {
    pub fn new(db: DbPool, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Submit a review. Every review enters the system unapproved.
    #[instrument(skip(self, input), fields(user_id = %user_id, product_id = %input.product_id))]
    pub async fn create_review(
        &self,
        user_id: Uuid,
        input: CreateReviewInput,
    ) -> Result<review::Model, ServiceError> {
        input.validate()?;

        product::Entity::find_by_id(input.product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let model = review::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(input.product_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            comment: Set(input.comment),
            is_approved: Set(false),
            created_at: Set(chrono::Utc::now()),
        };

        let saved = model.insert(&self.db).await?;
        info!(review_id = %saved.id, "review submitted");

        if let Err(e) = self.event_sender.send(Event::ReviewSubmitted(saved.id)).await {
            warn!("Failed to send review submitted event: {}", e);
        }
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn approve_review(&self, review_id: Uuid) -> Result<review::Model, ServiceError> {
        let current = review::Entity::find_by_id(review_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Review {} not found", review_id)))?;

        let mut active: review::ActiveModel = current.into();
        active.is_approved = Set(true);
        let updated = active.update(&self.db).await?;

        if let Err(e) = self.event_sender.send(Event::ReviewApproved(updated.id)).await {
            warn!("Failed to send review approved event: {}", e);
        }
        Ok(updated)
    }

    /// Rejection deletes the row; there is no rejected state.
    #[instrument(skip(self))]
    pub async fn reject_review(&self, review_id: Uuid) -> Result<(), ServiceError> {
        let result = review::Entity::delete_by_id(review_id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Review {} not found",
                review_id
            )));
        }
        info!(review_id = %review_id, "review rejected");
        Ok(())
    }

    /// Public read: approved reviews only, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<review::Model>, ServiceError> {
        Ok(review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::IsApproved.eq(true))
            .order_by_desc(review::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Admin read: every review, optionally narrowed to the moderation
    /// queue.
    #[instrument(skip(self))]
    pub async fn list_reviews(
        &self,
        page: u64,
        limit: u64,
        pending_only: bool,
    ) -> Result<(Vec<review::Model>, u64), ServiceError> {
        let mut query = review::Entity::find().order_by_desc(review::Column::CreatedAt);
        if pending_only {
            query = query.filter(review::Column::IsApproved.eq(false));
        }
        let paginator = query.paginate(&self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}
