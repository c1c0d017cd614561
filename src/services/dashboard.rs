use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::db::DbPool;
use crate::entities::{blog_post, order, product, review};
use crate::errors::ServiceError;
use crate::services::blog::PostStatus;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_orders: u64,
    pub total_products: u64,
    pub published_posts: u64,
    pub pending_reviews: u64,
}

pub struct DashboardService {
    db: DbPool,
}

impl DashboardService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Back-office overview. The four counts are independent, so they are
    /// fanned out concurrently and joined; one failure fails the whole
    /// summary.
    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary, ServiceError> {
        let orders = order::Entity::find().count(&self.db);
        let products = product::Entity::find().count(&self.db);
        let posts = blog_post::Entity::find()
            .filter(blog_post::Column::Status.eq(PostStatus::Published.to_string()))
            .count(&self.db);
        let reviews = review::Entity::find()
            .filter(review::Column::IsApproved.eq(false))
            .count(&self.db);

        let (total_orders, total_products, published_posts, pending_reviews) =
            tokio::try_join!(orders, products, posts, reviews)?;

        Ok(DashboardSummary {
            total_orders,
            total_products,
            published_posts,
            pending_reviews,
        })
    }
}
