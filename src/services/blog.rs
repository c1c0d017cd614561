use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::slug::{slugify, with_timestamp_suffix};
use crate::db::DbPool;
use crate::entities::blog_post;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Publication state of a blog post.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Scheduled,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    /// Derived from the title when absent.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    /// "draft" (default), "published" or "scheduled".
    pub status: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

pub struct BlogService {
    db: DbPool,
    event_sender: EventSender,
}

impl BlogService {
    pub fn new(db: DbPool, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(author_id = %author_id, title = %input.title))]
    pub async fn create_post(
        &self,
        author_id: Uuid,
        input: CreatePostInput,
    ) -> Result<blog_post::Model, ServiceError> {
        input.validate()?;

        let status = parse_status(input.status.as_deref())?;
        let (published_at, scheduled_for) =
            resolve_publication_fields(status, input.scheduled_for, None)?;

        let base = match &input.slug {
            Some(raw) => slugify(raw),
            None => slugify(&input.title),
        };
        let slug = self.resolve_slug(base, None).await?;

        let model = blog_post::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            slug: Set(slug),
            excerpt: Set(input.excerpt),
            content: Set(input.content),
            tags: Set(json!(input.tags)),
            meta_title: Set(input.meta_title),
            meta_description: Set(input.meta_description),
            status: Set(status.to_string()),
            published_at: Set(published_at),
            scheduled_for: Set(scheduled_for),
            author_id: Set(author_id),
            ..Default::default()
        };

        let saved = model.insert(&self.db).await?;
        info!(post_id = %saved.id, slug = %saved.slug, status = %saved.status, "blog post created");

        if saved.status == PostStatus::Published.to_string() {
            if let Err(e) = self.event_sender.send(Event::BlogPostPublished(saved.id)).await {
                warn!("Failed to send blog published event: {}", e);
            }
        }
        Ok(saved)
    }

    #[instrument(skip(self, input))]
    pub async fn update_post(
        &self,
        post_id: Uuid,
        input: UpdatePostInput,
    ) -> Result<blog_post::Model, ServiceError> {
        let current = blog_post::Entity::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Blog post {} not found", post_id)))?;

        let was_published = current.status == PostStatus::Published.to_string();
        let previous_published_at = current.published_at;

        let status = match input.status.as_deref() {
            Some(raw) => Some(parse_status(Some(raw))?),
            None => None,
        };

        // The row being edited is excluded from the collision query, so a
        // post keeping its own slug never gets suffixed.
        let new_slug = match (&input.slug, &input.title) {
            (Some(raw), _) => Some(slugify(raw)),
            (None, Some(title)) => Some(slugify(title)),
            (None, None) => None,
        };
        let resolved_slug = match new_slug {
            Some(base) => Some(self.resolve_slug(base, Some(post_id)).await?),
            None => None,
        };

        let mut active: blog_post::ActiveModel = current.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(slug) = resolved_slug {
            active.slug = Set(slug);
        }
        if let Some(excerpt) = input.excerpt {
            active.excerpt = Set(Some(excerpt));
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(json!(tags));
        }
        if let Some(meta_title) = input.meta_title {
            active.meta_title = Set(Some(meta_title));
        }
        if let Some(meta_description) = input.meta_description {
            active.meta_description = Set(Some(meta_description));
        }
        if let Some(status) = status {
            let (published_at, scheduled_for) =
                resolve_publication_fields(status, input.scheduled_for, previous_published_at)?;
            active.status = Set(status.to_string());
            active.published_at = Set(published_at);
            active.scheduled_for = Set(scheduled_for);
        }

        let updated = active.update(&self.db).await?;

        if !was_published && updated.status == PostStatus::Published.to_string() {
            if let Err(e) = self
                .event_sender
                .send(Event::BlogPostPublished(updated.id))
                .await
            {
                warn!("Failed to send blog published event: {}", e);
            }
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), ServiceError> {
        let result = blog_post::Entity::delete_by_id(post_id)
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Blog post {} not found",
                post_id
            )));
        }
        Ok(())
    }

    /// Public read: published posts only.
    #[instrument(skip(self))]
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<blog_post::Model, ServiceError> {
        blog_post::Entity::find()
            .filter(blog_post::Column::Slug.eq(slug))
            .filter(blog_post::Column::Status.eq(PostStatus::Published.to_string()))
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Blog post '{}' not found", slug)))
    }

    /// Public read: published posts, newest publication first.
    #[instrument(skip(self))]
    pub async fn list_published(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<blog_post::Model>, u64), ServiceError> {
        let paginator = blog_post::Entity::find()
            .filter(blog_post::Column::Status.eq(PostStatus::Published.to_string()))
            .order_by_desc(blog_post::Column::PublishedAt)
            .paginate(&self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Admin read: every post regardless of status.
    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<blog_post::Model>, u64), ServiceError> {
        let paginator = blog_post::Entity::find()
            .order_by_desc(blog_post::Column::CreatedAt)
            .paginate(&self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }

    /// Promote scheduled posts whose time has arrived. Invoked explicitly
    /// (there is no background worker); returns the number of posts
    /// published.
    #[instrument(skip(self))]
    pub async fn publish_due_posts(&self) -> Result<u64, ServiceError> {
        let now = Utc::now();
        let due = blog_post::Entity::find()
            .filter(blog_post::Column::Status.eq(PostStatus::Scheduled.to_string()))
            .filter(blog_post::Column::ScheduledFor.lte(now))
            .all(&self.db)
            .await?;

        let mut published = 0u64;
        for post in due {
            let post_id = post.id;
            let mut active: blog_post::ActiveModel = post.into();
            active.status = Set(PostStatus::Published.to_string());
            active.published_at = Set(Some(now));
            active.scheduled_for = Set(None);
            active.update(&self.db).await?;
            published += 1;

            if let Err(e) = self.event_sender.send(Event::BlogPostPublished(post_id)).await {
                warn!("Failed to send blog published event: {}", e);
            }
        }

        if published > 0 {
            info!(count = published, "scheduled posts published");
        }
        Ok(published)
    }

    async fn resolve_slug(
        &self,
        base: String,
        exclude_id: Option<Uuid>,
    ) -> Result<String, ServiceError> {
        let mut query =
            blog_post::Entity::find().filter(blog_post::Column::Slug.eq(base.clone()));
        if let Some(id) = exclude_id {
            query = query.filter(blog_post::Column::Id.ne(id));
        }
        let taken = query.one(&self.db).await?.is_some();
        Ok(if taken { with_timestamp_suffix(&base) } else { base })
    }
}

fn parse_status(raw: Option<&str>) -> Result<PostStatus, ServiceError> {
    match raw {
        None => Ok(PostStatus::Draft),
        Some(raw) => PostStatus::from_str(raw)
            .map_err(|_| ServiceError::InvalidStatus(format!("Unknown post status '{}'", raw))),
    }
}

/// Publication bookkeeping per status: publishing stamps `published_at`
/// (kept from an earlier publication when present), scheduling requires a
/// future `scheduled_for`, drafts carry neither.
fn resolve_publication_fields(
    status: PostStatus,
    scheduled_for: Option<DateTime<Utc>>,
    previous_published_at: Option<DateTime<Utc>>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ServiceError> {
    match status {
        PostStatus::Draft => Ok((None, None)),
        PostStatus::Published => Ok((previous_published_at.or_else(|| Some(Utc::now())), None)),
        PostStatus::Scheduled => {
            let when = scheduled_for.ok_or_else(|| {
                ServiceError::ValidationError(
                    "Scheduled posts require a scheduled_for timestamp".into(),
                )
            })?;
            if when <= Utc::now() {
                return Err(ServiceError::ValidationError(
                    "scheduled_for must be in the future".into(),
                ));
            }
            Ok((None, Some(when)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn draft_is_the_default_status() {
        assert_eq!(parse_status(None).unwrap(), PostStatus::Draft);
        assert_eq!(parse_status(Some("published")).unwrap(), PostStatus::Published);
        assert!(parse_status(Some("archived")).is_err());
    }

    #[test]
    fn publishing_stamps_published_at_once() {
        let (published_at, scheduled_for) =
            resolve_publication_fields(PostStatus::Published, None, None).unwrap();
        assert!(published_at.is_some());
        assert!(scheduled_for.is_none());

        let original = Utc::now() - Duration::days(7);
        let (kept, _) =
            resolve_publication_fields(PostStatus::Published, None, Some(original)).unwrap();
        assert_eq!(kept, Some(original));
    }

    #[test]
    fn scheduling_requires_a_future_timestamp() {
        assert!(resolve_publication_fields(PostStatus::Scheduled, None, None).is_err());

        let past = Utc::now() - Duration::hours(1);
        assert!(resolve_publication_fields(PostStatus::Scheduled, Some(past), None).is_err());

        let future = Utc::now() + Duration::hours(1);
        let (published_at, scheduled_for) =
            resolve_publication_fields(PostStatus::Scheduled, Some(future), None).unwrap();
        assert!(published_at.is_none());
        assert_eq!(scheduled_for, Some(future));
    }
}
